use serde::Deserialize;
use std::{fs, path::Path};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config at {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config JSON: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid value for {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct DetectorConfig {
    /// Normalized vertical displacement that starts a jump.
    pub jump_threshold: f32,
    pub min_jump_time_s: f64,
    /// Uncalibrated pixel to meter factor used for the height estimate.
    pub pixel_to_meters: f64,
    pub camera_index: i32,
    pub frame_width: u32,
    pub frame_height: u32,
    pub model_path: String,
    pub meta_path: String,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            jump_threshold: 0.1,
            min_jump_time_s: 0.2,
            pixel_to_meters: 0.01,
            camera_index: 0,
            frame_width: 640,
            frame_height: 480,
            model_path: "models/pose.pt".to_string(),
            meta_path: "models/meta.json".to_string(),
        }
    }
}

impl DetectorConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let data = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        let cfg: Self = serde_json::from_str(&data)?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// `JUMP_CONFIG` names an optional JSON file; `MODEL_PATH`, `META_PATH`
    /// and `CAMERA_INDEX` override individual fields.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut cfg = match std::env::var("JUMP_CONFIG") {
            Ok(path) => Self::load(path)?,
            Err(_) => Self::default(),
        };
        if let Ok(p) = std::env::var("MODEL_PATH") {
            cfg.model_path = p;
        }
        if let Ok(p) = std::env::var("META_PATH") {
            cfg.meta_path = p;
        }
        if let Ok(idx) = std::env::var("CAMERA_INDEX") {
            cfg.camera_index = idx.parse().map_err(|_| ConfigError::Invalid {
                field: "camera_index",
                reason: format!("not an integer: {idx}"),
            })?;
        }
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.jump_threshold > 0.0 && self.jump_threshold < 1.0) {
            return Err(ConfigError::Invalid {
                field: "jump_threshold",
                reason: format!("must be in (0, 1), got {}", self.jump_threshold),
            });
        }
        if self.min_jump_time_s < 0.0 {
            return Err(ConfigError::Invalid {
                field: "min_jump_time_s",
                reason: format!("must be >= 0, got {}", self.min_jump_time_s),
            });
        }
        if self.pixel_to_meters <= 0.0 {
            return Err(ConfigError::Invalid {
                field: "pixel_to_meters",
                reason: format!("must be > 0, got {}", self.pixel_to_meters),
            });
        }
        if self.frame_width == 0 || self.frame_height == 0 {
            return Err(ConfigError::Invalid {
                field: "frame_size",
                reason: format!("{}x{}", self.frame_width, self.frame_height),
            });
        }
        Ok(())
    }
}

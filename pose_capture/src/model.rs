use std::{fs, path::Path, sync::Arc};

use jump_detector::{Keypoint, Landmarks};
use opencv::{
    core::{Mat, Size},
    imgproc,
    prelude::*,
};
use serde::Deserialize;
use tch::{kind::Kind, CModule, Device, Tensor};

use crate::error::{CaptureError, CaptureResult};

/// Anything that turns a BGR frame into landmarks for one person.
pub trait PoseSource {
    fn detect(&mut self, frame: &Mat) -> CaptureResult<Option<Landmarks>>;

    /// Keypoint pairs to draw as the skeleton.
    fn connections(&self) -> &[(usize, usize)] {
        &[]
    }
}

#[derive(Deserialize, Debug, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum XyOrder {
    #[default]
    Xy,
    Yx,
}

#[derive(Deserialize, Debug)]
struct MetaJson {
    input_width: i64,
    input_height: i64,
    left_hip: usize,
    right_hip: usize,
    #[serde(default)]
    xy_order: XyOrder,
    /// Coordinates are in input pixels instead of [0, 1].
    #[serde(default)]
    pixel_coords: bool,
    #[serde(default = "default_min_confidence")]
    min_confidence: f32,
    #[serde(default)]
    connections: Vec<(usize, usize)>,
}

fn default_min_confidence() -> f32 {
    0.7
}

/// TorchScript pose model. Input `[1, 3, H, W]` RGB in [0, 1]; output
/// `[1, K, C]` (or `[1, 1, K, C]`) with `C >= 3` holding two coordinates
/// and a score per keypoint.
pub struct TorchPoseModel {
    model: CModule,
    device: Device,
    meta: MetaJson,
    pub n_keypoints: i64,
    pub n_channels: i64,
}

impl TorchPoseModel {
    pub fn new(model_path: &str, meta_path: &str) -> CaptureResult<Self> {
        let device = Device::cuda_if_available();

        let meta_txt = fs::read_to_string(Path::new(meta_path)).map_err(|source| {
            CaptureError::MetaRead {
                path: meta_path.to_string(),
                source,
            }
        })?;
        let meta: MetaJson = serde_json::from_str(&meta_txt)?;
        if meta.input_width <= 0 || meta.input_height <= 0 {
            return Err(CaptureError::MetaInvalid(format!(
                "input size {}x{}",
                meta.input_width, meta.input_height
            )));
        }

        let model = CModule::load_on_device(model_path, device)?;

        // Read the output shape off a dummy forward
        let dummy = Tensor::zeros(
            [1, 3, meta.input_height, meta.input_width],
            (Kind::Float, device),
        );
        let t = tch::no_grad(|| model.forward_ts(&[dummy]))?;
        let (n_keypoints, n_channels) = keypoint_shape(&t.size())?;

        let needed = meta.left_hip.max(meta.right_hip) as i64;
        if needed >= n_keypoints {
            return Err(CaptureError::MetaInvalid(format!(
                "hip index {} out of range for {} keypoints",
                needed, n_keypoints
            )));
        }
        if let Some(&(a, b)) = meta
            .connections
            .iter()
            .find(|(a, b)| *a as i64 >= n_keypoints || *b as i64 >= n_keypoints)
        {
            return Err(CaptureError::MetaInvalid(format!(
                "connection ({a}, {b}) out of range for {n_keypoints} keypoints"
            )));
        }

        tracing::info!(
            "loaded pose model {} on {:?}: {} keypoints x {} channels, input {}x{}",
            model_path,
            device,
            n_keypoints,
            n_channels,
            meta.input_width,
            meta.input_height
        );

        Ok(Self {
            model,
            device,
            meta,
            n_keypoints,
            n_channels,
        })
    }

    pub fn infer(&self, frame: &Mat) -> CaptureResult<Option<Landmarks>> {
        let (w, h) = (self.meta.input_width, self.meta.input_height);

        let mut rgb = Mat::default();
        imgproc::cvt_color_def(frame, &mut rgb, imgproc::COLOR_BGR2RGB)?;
        let mut resized = Mat::default();
        imgproc::resize(
            &rgb,
            &mut resized,
            Size::new(w as i32, h as i32),
            0.0,
            0.0,
            imgproc::INTER_LINEAR,
        )?;

        // HWC u8 -> NCHW float in [0, 1]
        let input = Tensor::from_slice(resized.data_bytes()?)
            .reshape([h, w, 3])
            .permute([2, 0, 1])
            .unsqueeze(0)
            .to_kind(Kind::Float)
            / 255.0;

        let out = tch::no_grad(|| self.model.forward_ts(&[input.to_device(self.device)]))?;
        let flat = out
            .to_device(Device::Cpu)
            .to_kind(Kind::Float)
            .reshape([self.n_keypoints * self.n_channels]);
        let values = Vec::<f32>::try_from(&flat)?;

        let landmarks = decode_keypoints(
            &values,
            self.n_channels as usize,
            self.meta.xy_order,
            if self.meta.pixel_coords { Some((w as f32, h as f32)) } else { None },
            self.meta.left_hip,
            self.meta.right_hip,
        );

        match landmarks.hip_score() {
            Some(score) if score >= self.meta.min_confidence => Ok(Some(landmarks)),
            _ => Ok(None),
        }
    }
}

impl PoseSource for TorchPoseModel {
    fn detect(&mut self, frame: &Mat) -> CaptureResult<Option<Landmarks>> {
        self.infer(frame)
    }

    fn connections(&self) -> &[(usize, usize)] {
        &self.meta.connections
    }
}

/// Lets several streams share one loaded model.
impl PoseSource for Arc<TorchPoseModel> {
    fn detect(&mut self, frame: &Mat) -> CaptureResult<Option<Landmarks>> {
        self.as_ref().infer(frame)
    }

    fn connections(&self) -> &[(usize, usize)] {
        &self.meta.connections
    }
}

fn keypoint_shape(sz: &[i64]) -> CaptureResult<(i64, i64)> {
    match *sz {
        [1, k, c] if k > 0 && c >= 3 => Ok((k, c)),
        [1, 1, k, c] if k > 0 && c >= 3 => Ok((k, c)),
        _ => Err(CaptureError::OutputShape(sz.to_vec())),
    }
}

/// Split a flat `[K * C]` output into keypoints. `scale` converts pixel
/// coordinates back to [0, 1].
fn decode_keypoints(
    values: &[f32],
    channels: usize,
    order: XyOrder,
    scale: Option<(f32, f32)>,
    left_hip: usize,
    right_hip: usize,
) -> Landmarks {
    let points = values
        .chunks_exact(channels)
        .map(|c| {
            let (mut x, mut y) = match order {
                XyOrder::Xy => (c[0], c[1]),
                XyOrder::Yx => (c[1], c[0]),
            };
            if let Some((sw, sh)) = scale {
                x /= sw;
                y /= sh;
            }
            Keypoint::new(x, y, c[2])
        })
        .collect();
    Landmarks::new(points, left_hip, right_hip)
}

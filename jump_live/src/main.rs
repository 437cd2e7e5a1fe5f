use std::{path::PathBuf, time::Instant};

use anyhow::{Context, Result};
use clap::Parser;
use jump_detector::{DetectorConfig, JumpTracker};
use pose_capture::{Camera, FrameOutcome, FramePipeline, PreviewWindow, TorchPoseModel};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "jump_live", about = "Count vertical jumps from a webcam in a preview window")]
struct Args {
    /// JSON detector config; defaults apply to missing fields
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
    #[arg(long)]
    camera: Option<i32>,
    /// TorchScript pose model
    #[arg(long, value_name = "PATH")]
    model: Option<String>,
    #[arg(long, value_name = "PATH")]
    meta: Option<String>,
    /// Skip drawing keypoints and skeleton
    #[arg(long)]
    no_skeleton: bool,
}

impl Args {
    fn detector_config(&self) -> Result<DetectorConfig> {
        let mut cfg = match &self.config {
            Some(path) => DetectorConfig::load(path)
                .with_context(|| format!("failed to load config {}", path.display()))?,
            None => DetectorConfig::from_env().context("failed to load config from env")?,
        };
        if let Some(idx) = self.camera {
            cfg.camera_index = idx;
        }
        if let Some(m) = &self.model {
            cfg.model_path = m.clone();
        }
        if let Some(m) = &self.meta {
            cfg.meta_path = m.clone();
        }
        Ok(cfg)
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();
    let cfg = args.detector_config()?;

    let model = TorchPoseModel::new(&cfg.model_path, &cfg.meta_path)
        .with_context(|| format!("failed to load pose model {}", cfg.model_path))?;
    let mut camera = Camera::open(cfg.camera_index, cfg.frame_width, cfg.frame_height)
        .context("failed to open webcam")?;
    let window = PreviewWindow::open("Jump Detection")?;

    let mut pipeline = FramePipeline::new(model).with_skeleton(!args.no_skeleton);
    let mut tracker = JumpTracker::from_config(&cfg);
    tracing::info!("press 'q' to quit");

    loop {
        let mut frame = match camera.read()? {
            Some(f) => f,
            None => {
                tracing::error!("failed to capture frame; exiting");
                break;
            }
        };

        match pipeline.process(&mut frame, &mut tracker, Instant::now()) {
            Ok(FrameOutcome::NoPose) => tracing::warn!("no pose landmarks detected in frame"),
            Ok(FrameOutcome::Tracked { .. }) => {}
            Err(e) => tracing::error!("error in jump detection: {}", e),
        }

        if !window.show(&frame)? {
            break;
        }
    }

    drop(window);
    drop(camera);

    match tracker.last_record() {
        Some(last) => tracing::info!(
            "Last Jump Summary --> Height: {:.2} meters, Air Time: {:.2} seconds ({} jumps)",
            last.height_m,
            last.air_time,
            tracker.records().len()
        ),
        None => tracing::info!("No jumps detected."),
    }
    tracing::info!("program terminated");
    Ok(())
}

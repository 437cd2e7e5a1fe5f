use std::sync::Arc;

use anyhow::Context;
use jump_detector::{DetectorConfig, Session};
use pose_capture::TorchPoseModel;
use tracing_subscriber::EnvFilter;

mod pages;
mod routes;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cfg = DetectorConfig::from_env().context("failed to load detector config")?;
    let port: u16 = std::env::var("PORT").ok().and_then(|s| s.parse().ok()).unwrap_or(5000);

    let model = TorchPoseModel::new(&cfg.model_path, &cfg.meta_path)
        .with_context(|| format!("failed to load pose model {}", cfg.model_path))?;
    tracing::info!(
        "threshold={} min_air_time={}s camera={}",
        cfg.jump_threshold,
        cfg.min_jump_time_s,
        cfg.camera_index
    );

    let state = routes::AppState {
        session: Arc::new(Session::new(&cfg)),
        cfg: Arc::new(cfg),
        pose: Arc::new(model),
        open_frames: routes::open_camera,
    };
    let app = routes::router(state);

    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!("listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

use std::{convert::Infallible, sync::Arc, time::Instant};

use axum::{
    body::Body,
    extract::State,
    http::{header, StatusCode},
    response::{Html, IntoResponse, Response},
    routing::get,
    Json, Router,
};
use bytes::Bytes;
use jump_detector::{mjpeg, DetectorConfig, JumpSummary, Session};
use pose_capture::{
    overlay, Camera, CaptureResult, FrameOutcome, FramePipeline, FrameSource, PoseSource,
};
use serde_json::json;
use tokio::sync::{mpsc, oneshot};

use crate::pages;

// ---------- Server state ----------

pub struct AppState<P, C = Camera> {
    pub session: Arc<Session>,
    pub cfg: Arc<DetectorConfig>,
    /// Cloned into every stream; an `Arc` around the loaded model in production.
    pub pose: P,
    /// Called on the capture thread once per `/video_feed` request.
    pub open_frames: fn(&DetectorConfig) -> CaptureResult<C>,
}

impl<P: Clone, C> Clone for AppState<P, C> {
    fn clone(&self) -> Self {
        Self {
            session: self.session.clone(),
            cfg: self.cfg.clone(),
            pose: self.pose.clone(),
            open_frames: self.open_frames,
        }
    }
}

pub fn open_camera(cfg: &DetectorConfig) -> CaptureResult<Camera> {
    Camera::open(cfg.camera_index, cfg.frame_width, cfg.frame_height)
}

type ApiError = (StatusCode, Json<serde_json::Value>);

fn internal(e: impl std::fmt::Display) -> ApiError {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({ "error": e.to_string() })),
    )
}

pub fn router<P, C>(state: AppState<P, C>) -> Router
where
    P: PoseSource + Clone + Send + Sync + 'static,
    C: FrameSource + 'static,
{
    Router::new()
        .route("/", get(index))
        .route("/video_feed", get(video_feed::<P, C>))
        .route("/stop", get(stop::<P, C>))
        .route("/stats", get(stats::<P, C>))
        .with_state(state)
}

// ---------- Handlers ----------

async fn index() -> Html<String> {
    Html(pages::render_index(None))
}

async fn stop<P, C>(State(state): State<AppState<P, C>>) -> Html<String> {
    let summary = state.session.summary();
    tracing::info!("stop requested; {} jumps recorded", summary.jump_count);
    Html(pages::render_index(Some(&summary)))
}

async fn stats<P, C>(State(state): State<AppState<P, C>>) -> Json<JumpSummary> {
    Json(state.session.summary())
}

async fn video_feed<P, C>(State(state): State<AppState<P, C>>) -> Result<Response, ApiError>
where
    P: PoseSource + Clone + Send + Sync + 'static,
    C: FrameSource + 'static,
{
    // two frames of slack; a slow viewer throttles the capture loop
    let (tx, rx) = mpsc::channel::<Bytes>(2);
    let (ready_tx, ready_rx) = oneshot::channel();

    tokio::task::spawn_blocking(move || stream_frames(state, tx, ready_tx));

    // camera-open failure surfaces as a 500 instead of an empty stream
    ready_rx.await.map_err(internal)?.map_err(internal)?;

    let body = futures::stream::unfold(rx, |mut rx| async move {
        rx.recv().await.map(|part| (Ok::<_, Infallible>(part), rx))
    });
    Ok((
        [(header::CONTENT_TYPE, mjpeg::CONTENT_TYPE)],
        Body::from_stream(body),
    )
        .into_response())
}

// ---------- Capture loop ----------

/// Blocking per-frame loop for one viewer. Ends when the frames stop
/// coming or the viewer goes away.
fn stream_frames<P: PoseSource + Clone, C: FrameSource>(
    state: AppState<P, C>,
    tx: mpsc::Sender<Bytes>,
    ready: oneshot::Sender<CaptureResult<()>>,
) {
    let mut frames_in = match (state.open_frames)(&state.cfg) {
        Ok(src) => {
            let _ = ready.send(Ok(()));
            src
        }
        Err(e) => {
            tracing::error!("{}", e);
            let _ = ready.send(Err(e));
            return;
        }
    };

    let mut pipeline = FramePipeline::new(state.pose.clone());
    let mut sink = state.session.stream();
    let mut frames: u64 = 0;
    tracing::info!("stream started on camera {}", state.cfg.camera_index);

    loop {
        let mut frame = match frames_in.read() {
            Ok(Some(f)) => f,
            Ok(None) => {
                tracing::error!("failed to capture frame; ending stream");
                break;
            }
            Err(e) => {
                tracing::error!("capture error: {}", e);
                break;
            }
        };

        match pipeline.process(&mut frame, &mut sink, Instant::now()) {
            Ok(FrameOutcome::NoPose) => {
                tracing::warn!("frame {}: no pose landmarks detected", frames)
            }
            Ok(FrameOutcome::Tracked { .. }) => {}
            Err(e) => tracing::warn!("frame {} skipped: {}", frames, e),
        }

        let jpeg = match overlay::encode_jpeg(&frame) {
            Ok(j) => j,
            Err(e) => {
                tracing::warn!("jpeg encode failed: {}", e);
                continue;
            }
        };

        if tx.blocking_send(mjpeg::multipart_part(&jpeg)).is_err() {
            tracing::info!("viewer disconnected");
            break;
        }
        frames += 1;
    }

    tracing::info!("stream stopped after {} frames", frames);
}

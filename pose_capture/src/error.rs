use thiserror::Error;

#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("failed to open camera {0}; check the camera connection")]
    CameraUnavailable(i32),
    #[error("opencv: {0}")]
    OpenCv(#[from] opencv::Error),
    #[error("torch: {0}")]
    Torch(#[from] tch::TchError),
    #[error("failed to read model meta at {path}: {source}")]
    MetaRead {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse model meta: {0}")]
    MetaParse(#[from] serde_json::Error),
    #[error("invalid model meta: {0}")]
    MetaInvalid(String),
    #[error("unexpected model output size: {0:?}")]
    OutputShape(Vec<i64>),
}

pub type CaptureResult<T> = Result<T, CaptureError>;

pub mod camera;
pub mod error;
pub mod model;
pub mod overlay;
pub mod pipeline;
pub mod preview;

pub use camera::{Camera, FrameSource};
pub use error::{CaptureError, CaptureResult};
pub use model::{PoseSource, TorchPoseModel};
pub use pipeline::{FrameOutcome, FramePipeline, JumpSink};
pub use preview::PreviewWindow;

pub use opencv::core::Mat;

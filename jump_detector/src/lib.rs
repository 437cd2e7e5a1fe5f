pub mod config;
pub mod mjpeg;
pub mod session;
pub mod tracker;
pub mod types;

pub use config::{ConfigError, DetectorConfig};
pub use session::{Session, SessionStream};
pub use tracker::{JumpLog, JumpMotion, JumpTracker, TrackerEvent};
pub use types::{JumpPhase, JumpRecord, JumpSummary, Keypoint, Landmarks};

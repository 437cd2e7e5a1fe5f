use parking_lot::Mutex;
use std::time::Instant;

use crate::config::DetectorConfig;
use crate::tracker::{JumpLog, JumpMotion, TrackerEvent};
use crate::types::{JumpPhase, JumpSummary};

/// Jump log shared by every capture stream and the handlers that read
/// results.
///
/// Each stream keeps its own motion state in a [`SessionStream`]; only
/// completed jumps meet here, so numbering stays gapless across streams.
/// Readers get a point-in-time copy that may lag a writer by a frame.
pub struct Session {
    prototype: JumpMotion,
    log: Mutex<JumpLog>,
}

impl Session {
    pub fn new(cfg: &DetectorConfig) -> Self {
        Self {
            prototype: JumpMotion::from_config(cfg),
            log: Mutex::new(JumpLog::new()),
        }
    }

    /// Start a capture stream with a fresh motion state.
    pub fn stream(&self) -> SessionStream<'_> {
        SessionStream {
            session: self,
            motion: self.prototype.clone(),
        }
    }

    pub fn summary(&self) -> JumpSummary {
        self.log.lock().summary()
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new(&DetectorConfig::default())
    }
}

/// One viewer's motion state, writing completed jumps to the shared log.
pub struct SessionStream<'a> {
    session: &'a Session,
    motion: JumpMotion,
}

impl SessionStream<'_> {
    /// The log lock is held for this single step only.
    pub fn step(&mut self, pelvis_y: f32, frame_height_px: u32, now: Instant) -> TrackerEvent {
        let mut log = self.session.log.lock();
        self.motion.step(pelvis_y, frame_height_px, now, &mut log)
    }

    pub fn phase(&self) -> JumpPhase {
        self.motion.phase()
    }

    pub fn summary(&self) -> JumpSummary {
        self.session.summary()
    }
}

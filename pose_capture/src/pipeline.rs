use std::time::Instant;

use jump_detector::{JumpSummary, JumpTracker, SessionStream, TrackerEvent};
use opencv::{core::Mat, prelude::*};

use crate::error::CaptureResult;
use crate::model::PoseSource;
use crate::overlay;

/// Where pelvis observations go. The desktop loop owns a tracker outright;
/// each web stream writes through its own [`SessionStream`].
pub trait JumpSink {
    fn observe(&mut self, pelvis_y: f32, frame_height_px: u32, now: Instant) -> TrackerEvent;
    fn summary(&self) -> JumpSummary;
}

impl JumpSink for JumpTracker {
    fn observe(&mut self, pelvis_y: f32, frame_height_px: u32, now: Instant) -> TrackerEvent {
        self.step(pelvis_y, frame_height_px, now)
    }

    fn summary(&self) -> JumpSummary {
        JumpTracker::summary(self)
    }
}

impl JumpSink for SessionStream<'_> {
    fn observe(&mut self, pelvis_y: f32, frame_height_px: u32, now: Instant) -> TrackerEvent {
        self.step(pelvis_y, frame_height_px, now)
    }

    fn summary(&self) -> JumpSummary {
        SessionStream::summary(self)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum FrameOutcome {
    NoPose,
    Tracked { pelvis_y: f32, event: TrackerEvent },
}

/// detect -> pelvis -> tracker -> overlay, once per frame.
pub struct FramePipeline<P> {
    source: P,
    draw_skeleton: bool,
}

impl<P: PoseSource> FramePipeline<P> {
    pub fn new(source: P) -> Self {
        Self {
            source,
            draw_skeleton: true,
        }
    }

    pub fn with_skeleton(mut self, on: bool) -> Self {
        self.draw_skeleton = on;
        self
    }

    /// Draws onto `frame` in place.
    pub fn process<S: JumpSink>(
        &mut self,
        frame: &mut Mat,
        sink: &mut S,
        now: Instant,
    ) -> CaptureResult<FrameOutcome> {
        let landmarks = self.source.detect(frame)?;

        let outcome = match landmarks.as_ref().and_then(|lm| lm.pelvis_y().map(|y| (lm, y))) {
            Some((lm, pelvis_y)) => {
                if self.draw_skeleton {
                    overlay::draw_landmarks(frame, lm, self.source.connections())?;
                }
                let event = sink.observe(pelvis_y, frame.rows() as u32, now);
                FrameOutcome::Tracked { pelvis_y, event }
            }
            None => {
                tracing::debug!("no pose landmarks detected in frame");
                FrameOutcome::NoPose
            }
        };

        overlay::draw_hud(frame, &sink.summary(), outcome != FrameOutcome::NoPose)?;
        Ok(outcome)
    }
}

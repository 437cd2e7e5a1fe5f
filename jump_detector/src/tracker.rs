use std::time::Instant;

use crate::config::DetectorConfig;
use crate::types::{JumpPhase, JumpRecord, JumpSummary};

/// What a single pelvis observation did to the tracker.
#[derive(Debug, Clone, PartialEq)]
pub enum TrackerEvent {
    /// First observation of the session; the grounded reference was set.
    Anchored { reference_y: f32 },
    /// No transition this frame.
    Holding,
    /// Pelvis rose past the threshold; now airborne.
    Started { pelvis_y: f32 },
    /// Landed after a long enough flight; the record was appended.
    Landed(JumpRecord),
    /// Landed, but the flight was shorter than the minimum air time.
    TooShort { air_time: f64 },
}

impl TrackerEvent {
    pub fn into_record(self) -> Option<JumpRecord> {
        match self {
            TrackerEvent::Landed(r) => Some(r),
            _ => None,
        }
    }
}

/// Completed jumps in landing order. Numbering is owned here so that
/// several motion trackers can append to one log without gaps.
#[derive(Debug, Clone, Default)]
pub struct JumpLog {
    records: Vec<JumpRecord>,
}

impl JumpLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a jump and return its record. Values are stored rounded to
    /// two decimals.
    pub fn push(&mut self, height_m: f64, air_time: f64) -> JumpRecord {
        let record = JumpRecord {
            sequence_number: self.records.len() as u32 + 1,
            height_m: round2(height_m),
            air_time: round2(air_time),
        };
        self.records.push(record.clone());
        record
    }

    pub fn records(&self) -> &[JumpRecord] {
        &self.records
    }

    pub fn last(&self) -> Option<&JumpRecord> {
        self.records.last()
    }

    pub fn summary(&self) -> JumpSummary {
        let (last_height, last_air_time) = self
            .last()
            .map(|r| (r.height_m, r.air_time))
            .unwrap_or((0.0, 0.0));
        JumpSummary {
            jump_count: self.records.len() as u32,
            last_height,
            last_air_time,
            all_jumps: self.records.clone(),
        }
    }
}

/// Two-state (grounded/airborne) motion detector driven by the pelvis height.
///
/// Coordinates are normalized image space, so a smaller `y` is higher up.
/// While grounded the reference height follows the pelvis every frame; on
/// takeoff it is pinned to the takeoff height until landing. Owns no
/// records: completed jumps go to the [`JumpLog`] passed to [`step`](Self::step).
#[derive(Debug, Clone)]
pub struct JumpMotion {
    threshold: f32,
    min_air_time_s: f64,
    pixel_to_meters: f64,
    reference_y: Option<f32>,
    /// `Some` while airborne.
    jump_started_at: Option<Instant>,
}

impl JumpMotion {
    /// # Arguments
    /// * `threshold` - Normalized rise needed to count as takeoff (landing needs half of it)
    /// * `min_air_time_s` - Flights shorter than this are discarded as noise
    /// * `pixel_to_meters` - Factor applied to the pixel displacement for the height estimate
    pub fn new(threshold: f32, min_air_time_s: f64, pixel_to_meters: f64) -> Self {
        Self {
            threshold,
            min_air_time_s,
            pixel_to_meters,
            reference_y: None,
            jump_started_at: None,
        }
    }

    pub fn from_config(cfg: &DetectorConfig) -> Self {
        Self::new(cfg.jump_threshold, cfg.min_jump_time_s, cfg.pixel_to_meters)
    }

    pub fn step(
        &mut self,
        pelvis_y: f32,
        frame_height_px: u32,
        now: Instant,
        log: &mut JumpLog,
    ) -> TrackerEvent {
        let reference = match self.reference_y {
            Some(r) => r,
            None => {
                self.reference_y = Some(pelvis_y);
                tracing::info!("initialized reference pelvis y: {:.4}", pelvis_y);
                return TrackerEvent::Anchored { reference_y: pelvis_y };
            }
        };

        let airborne_since = self.jump_started_at;
        let event = match airborne_since {
            None if pelvis_y < reference - self.threshold => {
                self.jump_started_at = Some(now);
                self.reference_y = Some(pelvis_y);
                tracing::info!("jump started at y={:.4}", pelvis_y);
                TrackerEvent::Started { pelvis_y }
            }
            Some(started) if pelvis_y > reference + self.threshold * 0.5 => {
                self.jump_started_at = None;
                let air_time = now.saturating_duration_since(started).as_secs_f64();
                if air_time >= self.min_air_time_s {
                    let displacement = (pelvis_y - reference).abs() as f64;
                    let height = displacement * frame_height_px as f64 * self.pixel_to_meters;
                    let record = log.push(height, air_time);
                    tracing::info!(
                        "jump {}: height={:.2}m air_time={:.2}s",
                        record.sequence_number,
                        height,
                        air_time
                    );
                    TrackerEvent::Landed(record)
                } else {
                    tracing::warn!("jump too short: {:.2}s", air_time);
                    TrackerEvent::TooShort { air_time }
                }
            }
            _ => TrackerEvent::Holding,
        };

        // grounded baseline follows the pelvis to absorb drift
        if self.jump_started_at.is_none() {
            self.reference_y = Some(pelvis_y);
        }
        event
    }

    /// Forget the motion state, as at the start of a capture session.
    pub fn rearm(&mut self) {
        self.reference_y = None;
        self.jump_started_at = None;
    }

    pub fn phase(&self) -> JumpPhase {
        if self.jump_started_at.is_some() {
            JumpPhase::Airborne
        } else {
            JumpPhase::Grounded
        }
    }

    pub fn reference_y(&self) -> Option<f32> {
        self.reference_y
    }
}

/// A motion detector with its own log, for a single capture loop.
pub struct JumpTracker {
    motion: JumpMotion,
    log: JumpLog,
}

impl JumpTracker {
    /// See [`JumpMotion::new`] for the arguments.
    pub fn new(threshold: f32, min_air_time_s: f64, pixel_to_meters: f64) -> Self {
        Self {
            motion: JumpMotion::new(threshold, min_air_time_s, pixel_to_meters),
            log: JumpLog::new(),
        }
    }

    pub fn from_config(cfg: &DetectorConfig) -> Self {
        Self::new(cfg.jump_threshold, cfg.min_jump_time_s, cfg.pixel_to_meters)
    }

    /// Feed one pelvis observation. Returns the record of a jump that just
    /// completed, if any.
    pub fn update(&mut self, pelvis_y: f32, frame_height_px: u32, now: Instant) -> Option<JumpRecord> {
        self.step(pelvis_y, frame_height_px, now).into_record()
    }

    /// Like [`update`](Self::update) but reports every transition.
    pub fn step(&mut self, pelvis_y: f32, frame_height_px: u32, now: Instant) -> TrackerEvent {
        self.motion.step(pelvis_y, frame_height_px, now, &mut self.log)
    }

    /// Forget the motion state for a new capture session. Records and
    /// numbering are kept.
    pub fn rearm(&mut self) {
        self.motion.rearm();
    }

    pub fn phase(&self) -> JumpPhase {
        self.motion.phase()
    }

    pub fn reference_y(&self) -> Option<f32> {
        self.motion.reference_y()
    }

    pub fn records(&self) -> &[JumpRecord] {
        self.log.records()
    }

    pub fn last_record(&self) -> Option<&JumpRecord> {
        self.log.last()
    }

    pub fn summary(&self) -> JumpSummary {
        self.log.summary()
    }
}

impl Default for JumpTracker {
    fn default() -> Self {
        Self::from_config(&DetectorConfig::default())
    }
}

fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

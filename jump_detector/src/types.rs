use serde::{Deserialize, Serialize};

/// One landmark in normalized image coordinates (0 = left/top, 1 = right/bottom).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Keypoint {
    pub x: f32,
    pub y: f32,
    pub score: f32,
}

impl Keypoint {
    pub fn new(x: f32, y: f32, score: f32) -> Self {
        Self { x, y, score }
    }
}

/// Landmarks for the single person a pose model detected in a frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Landmarks {
    pub points: Vec<Keypoint>,
    pub left_hip: usize,
    pub right_hip: usize,
}

impl Landmarks {
    pub fn new(points: Vec<Keypoint>, left_hip: usize, right_hip: usize) -> Self {
        Self {
            points,
            left_hip,
            right_hip,
        }
    }

    /// Midpoint of the two hips on the vertical axis. `None` if the layout
    /// does not contain both hips.
    pub fn pelvis_y(&self) -> Option<f32> {
        let left = self.points.get(self.left_hip)?;
        let right = self.points.get(self.right_hip)?;
        Some((left.y + right.y) / 2.0)
    }

    pub fn hip_score(&self) -> Option<f32> {
        let left = self.points.get(self.left_hip)?;
        let right = self.points.get(self.right_hip)?;
        Some((left.score + right.score) / 2.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JumpPhase {
    Grounded,
    Airborne,
}

/// A completed jump. Never mutated once appended to the log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JumpRecord {
    #[serde(rename = "count")]
    pub sequence_number: u32,
    #[serde(rename = "height")]
    pub height_m: f64,
    pub air_time: f64,
}

/// Snapshot of everything the overlay and the results page show.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct JumpSummary {
    pub jump_count: u32,
    pub last_height: f64,
    pub last_air_time: f64,
    pub all_jumps: Vec<JumpRecord>,
}

use jump_detector::{JumpSummary, Landmarks};
use opencv::{
    core::{Mat, Point, Scalar, Vector},
    imgcodecs,
    imgproc::{self, FONT_HERSHEY_SIMPLEX, LINE_8},
    prelude::*,
};

use crate::error::CaptureResult;

fn green() -> Scalar {
    Scalar::new(0.0, 255.0, 0.0, 0.0)
}

fn red() -> Scalar {
    Scalar::new(0.0, 0.0, 255.0, 0.0)
}

/// Text lines drawn over every frame.
pub fn hud_lines(summary: &JumpSummary) -> [String; 3] {
    [
        format!("Jumps: {}", summary.jump_count),
        format!("Height: {:.2}m", summary.last_height),
        format!("Air Time: {:.2}s", summary.last_air_time),
    ]
}

fn put_line(frame: &mut Mat, text: &str, y: i32, color: Scalar) -> CaptureResult<()> {
    imgproc::put_text(
        frame,
        text,
        Point::new(10, y),
        FONT_HERSHEY_SIMPLEX,
        1.0,
        color,
        2,
        LINE_8,
        false,
    )?;
    Ok(())
}

pub fn draw_hud(frame: &mut Mat, summary: &JumpSummary, pose_found: bool) -> CaptureResult<()> {
    for (i, line) in hud_lines(summary).iter().enumerate() {
        put_line(frame, line, 30 + 40 * i as i32, green())?;
    }
    if !pose_found {
        put_line(frame, "No Pose Detected", 150, red())?;
    }
    Ok(())
}

pub fn draw_landmarks(
    frame: &mut Mat,
    landmarks: &Landmarks,
    connections: &[(usize, usize)],
) -> CaptureResult<()> {
    let (w, h) = (frame.cols() as f32, frame.rows() as f32);
    let to_px = |i: usize| {
        landmarks
            .points
            .get(i)
            .map(|p| Point::new((p.x * w) as i32, (p.y * h) as i32))
    };

    for &(a, b) in connections {
        if let (Some(pa), Some(pb)) = (to_px(a), to_px(b)) {
            imgproc::line(frame, pa, pb, Scalar::new(255.0, 255.0, 255.0, 0.0), 2, LINE_8, 0)?;
        }
    }
    for i in 0..landmarks.points.len() {
        if let Some(p) = to_px(i) {
            imgproc::circle(frame, p, 3, red(), -1, LINE_8, 0)?;
        }
    }
    Ok(())
}

pub fn encode_jpeg(frame: &Mat) -> CaptureResult<Vec<u8>> {
    let mut buf = Vector::<u8>::new();
    imgcodecs::imencode_def(".jpg", frame, &mut buf)?;
    Ok(buf.to_vec())
}

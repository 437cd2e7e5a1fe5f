use opencv::{
    core::Mat,
    prelude::*,
    videoio::{self, VideoCapture, CAP_PROP_FRAME_HEIGHT, CAP_PROP_FRAME_WIDTH},
};

use crate::error::{CaptureError, CaptureResult};

/// Anything that yields BGR frames until it runs dry.
pub trait FrameSource {
    fn read(&mut self) -> CaptureResult<Option<Mat>>;
}

/// Webcam opened for the lifetime of one capture session. Released on drop.
pub struct Camera {
    cap: VideoCapture,
    index: i32,
}

impl Camera {
    pub fn open(index: i32, width: u32, height: u32) -> CaptureResult<Self> {
        tracing::info!("opening camera {}", index);
        let mut cap = VideoCapture::new(index, videoio::CAP_ANY)?;
        if !cap.is_opened()? {
            return Err(CaptureError::CameraUnavailable(index));
        }

        // lower resolution keeps inference near real time
        cap.set(CAP_PROP_FRAME_WIDTH, width as f64)?;
        cap.set(CAP_PROP_FRAME_HEIGHT, height as f64)?;

        Ok(Self { cap, index })
    }

    /// Next frame, or `None` once the device stops delivering.
    pub fn read(&mut self) -> CaptureResult<Option<Mat>> {
        let mut frame = Mat::default();
        if !self.cap.read(&mut frame)? || frame.rows() == 0 || frame.cols() == 0 {
            return Ok(None);
        }
        Ok(Some(frame))
    }

    pub fn index(&self) -> i32 {
        self.index
    }
}

impl FrameSource for Camera {
    fn read(&mut self) -> CaptureResult<Option<Mat>> {
        Camera::read(self)
    }
}

impl Drop for Camera {
    fn drop(&mut self) {
        if let Err(e) = self.cap.release() {
            tracing::warn!("failed to release camera {}: {}", self.index, e);
        } else {
            tracing::info!("released camera {}", self.index);
        }
    }
}

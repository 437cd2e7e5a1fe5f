use opencv::{core::Mat, highgui};

use crate::error::CaptureResult;

const KEY_ESC: i32 = 27;
const KEY_Q: i32 = 'q' as i32;

/// Desktop preview window. Closed on drop.
pub struct PreviewWindow {
    title: String,
}

impl PreviewWindow {
    pub fn open(title: &str) -> CaptureResult<Self> {
        highgui::named_window(title, highgui::WINDOW_AUTOSIZE)?;
        Ok(Self {
            title: title.to_string(),
        })
    }

    /// Show `frame` and poll the keyboard for 1ms. Returns `false` once the
    /// user asked to quit.
    pub fn show(&self, frame: &Mat) -> CaptureResult<bool> {
        highgui::imshow(&self.title, frame)?;
        let key = highgui::wait_key(1)?;
        Ok(!is_quit_key(key))
    }
}

impl Drop for PreviewWindow {
    fn drop(&mut self) {
        let _ = highgui::destroy_all_windows();
    }
}

fn is_quit_key(key: i32) -> bool {
    // wait_key may carry modifier bits above the low byte
    let key = key & 0xFF;
    key == KEY_Q || key == KEY_ESC
}

//! OpenCV interop

use crate::error::VisionError;
use crate::frame::Frame;
use opencv::{
    core::{Mat, CV_8U},
    imgproc,
    prelude::*,
};

/// Convert a captured BGR `Mat` into an RGB [`Frame`].
pub(crate) fn mat_to_frame(mat: &Mat) -> Result<Frame, VisionError> {
    let (cols, rows) = (mat.cols(), mat.rows());
    if cols <= 0 || rows <= 0 {
        return Err(VisionError::Processing("Invalid image dimensions".to_string()));
    }
    if mat.channels() != 3 || mat.depth() != CV_8U {
        return Err(VisionError::Processing(format!(
            "Expected 8-bit 3-channel frame, got depth {} with {} channels",
            mat.depth(),
            mat.channels()
        )));
    }

    let mut rgb = Mat::default();
    imgproc::cvt_color(mat, &mut rgb, imgproc::COLOR_BGR2RGB, 0)?;

    // data_bytes requires a continuous buffer
    let rgb = if rgb.is_continuous() { rgb } else { rgb.try_clone()? };
    let data = rgb.data_bytes()?.to_vec();

    Frame::from_raw(cols as u32, rows as u32, data)
}

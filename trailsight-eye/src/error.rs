//! Error types for trailsight-eye

use thiserror::Error;

#[derive(Error, Debug)]
pub enum VisionError {
    #[error("Camera {device} unavailable after {attempts} attempts")]
    CameraUnavailable { device: u32, attempts: u32 },

    #[error("Frame read failed {attempts} times in a row")]
    FrameReadFailure { attempts: u32 },

    #[error("Camera error: {0}")]
    Camera(String),

    #[error("Processing error: {0}")]
    Processing(String),

    #[error("OpenCV error: {0}")]
    OpenCv(String),
}

#[cfg(feature = "opencv")]
impl From<opencv::Error> for VisionError {
    fn from(err: opencv::Error) -> Self {
        VisionError::OpenCv(err.message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vision_error_display() {
        let err = VisionError::CameraUnavailable { device: 2, attempts: 5 };
        assert!(err.to_string().contains("Camera 2"));
        assert!(err.to_string().contains("5 attempts"));

        let err = VisionError::Camera("Test error".to_string());
        assert!(err.to_string().contains("Camera error"));
        assert!(err.to_string().contains("Test error"));
    }
}

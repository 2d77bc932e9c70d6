//! Error types for trailsight-cns

use thiserror::Error;
use trailsight_eye::VisionError;

#[derive(Error, Debug)]
pub enum CnsError {
    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Vision error: {0}")]
    Vision(#[from] VisionError),
}

impl From<trailsight_core::Error> for CnsError {
    fn from(err: trailsight_core::Error) -> Self {
        CnsError::Config(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vision_error_converts() {
        let err: CnsError = VisionError::CameraUnavailable { device: 0, attempts: 5 }.into();
        assert!(matches!(err, CnsError::Vision(_)));
        assert!(err.to_string().contains("Camera 0"));
    }

    #[test]
    fn test_read_failure_converts() {
        let err: CnsError = VisionError::FrameReadFailure { attempts: 5 }.into();
        assert!(matches!(
            err,
            CnsError::Vision(VisionError::FrameReadFailure { attempts: 5 })
        ));
    }

    #[test]
    fn test_core_error_is_config() {
        let err: CnsError = trailsight_core::Error::Validation("bad".to_string()).into();
        assert!(matches!(err, CnsError::Config(_)));
    }
}

//! trailsight-eye: perception for the path follower
//!
//! Acquires frames from a camera with bounded retry and turns each frame into
//! a [`PathObservation`]: the dominant path region, its oriented box, and its
//! horizontal offset from the optical center. Table markers are reported on
//! the same pass when the profile asks for them.

pub mod camera;
pub mod error;
pub mod frame;
pub mod pipeline;
pub mod processing;
#[cfg(feature = "opencv")]
mod utils;

pub use camera::{CaptureBackend, CaptureDevice, FrameSource};
#[cfg(feature = "opencv")]
pub use camera::OpenCvBackend;
pub use error::VisionError;
pub use frame::{Frame, HsvFrame, Mask};
pub use pipeline::{PathGeometry, PathObservation, PathPipeline};
pub use processing::{
    Contour, ContourSelector, MarkerDetector, MarkerSighting, OffsetEstimator,
    OrientationEstimator, PathSegmenter,
};

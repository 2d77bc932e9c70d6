//! Per-frame vision stages

pub mod contours;
pub mod marker;
pub mod offset;
pub mod orientation;
pub mod segmentation;

pub use contours::{Contour, ContourSelector};
pub use marker::{MarkerDetector, MarkerSighting};
pub use offset::OffsetEstimator;
pub use orientation::OrientationEstimator;
pub use segmentation::PathSegmenter;

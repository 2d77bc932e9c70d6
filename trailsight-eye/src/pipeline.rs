//! Per-frame perception pass

use crate::frame::{Frame, Mask};
use crate::processing::{
    Contour, ContourSelector, MarkerDetector, MarkerSighting, OffsetEstimator,
    OrientationEstimator, PathSegmenter,
};
use tracing::debug;
use trailsight_core::{BoundingBox, ColorRange, OrientedBox, PipelineProfile};

/// Geometry of the dominant path region in one frame.
#[derive(Debug, Clone)]
pub struct PathGeometry {
    pub contour: Contour,
    pub bounding_box: BoundingBox,
    pub oriented_box: OrientedBox,
    /// Signed pixel offset of the region's center from the frame center
    pub offset: f64,
}

/// Everything perception learned from one frame.
#[derive(Debug, Clone)]
pub struct PathObservation {
    pub frame_width: u32,
    pub frame_height: u32,
    /// `None` when no path is visible
    pub path: Option<PathGeometry>,
    pub marker: Option<MarkerSighting>,
}

impl PathObservation {
    pub fn path_visible(&self) -> bool {
        self.path.is_some()
    }
}

/// Segmenter, selector and estimators wired for one profile.
#[derive(Debug, Clone)]
pub struct PathPipeline {
    path_range: ColorRange,
    segmenter: PathSegmenter,
    selector: ContourSelector,
    orientation: OrientationEstimator,
    offset: OffsetEstimator,
    markers: MarkerDetector,
}

impl PathPipeline {
    pub fn new(profile: &PipelineProfile) -> Self {
        Self {
            path_range: profile.path_range,
            segmenter: PathSegmenter::from_profile(profile),
            selector: ContourSelector::new(),
            orientation: OrientationEstimator::new(),
            offset: OffsetEstimator::new(),
            markers: MarkerDetector::new(profile.markers.clone()),
        }
    }

    pub fn segmenter(&self) -> &PathSegmenter {
        &self.segmenter
    }

    /// Geometry of the dominant region in an already segmented mask.
    pub fn measure(&self, mask: &Mask) -> Option<PathGeometry> {
        let contour = self.selector.dominant(mask)?;
        let bounding_box = contour.bounding_box();
        let oriented_box = self.orientation.estimate(&contour);
        let offset = self.offset.estimate(&contour, mask.width());
        Some(PathGeometry {
            contour,
            bounding_box,
            oriented_box,
            offset,
        })
    }

    pub fn observe(&self, frame: &Frame) -> PathObservation {
        let hsv = self.segmenter.prepare(frame);
        let mask = self.segmenter.segment_hsv(&hsv, &self.path_range);
        let path = self.measure(&mask);
        let marker = if self.markers.is_empty() {
            None
        } else {
            self.markers.detect(&hsv)
        };

        match &path {
            Some(geometry) => debug!(
                "Path at offset {:.1}px, angle {}°",
                geometry.offset, geometry.oriented_box.angle
            ),
            None => debug!("No path visible"),
        }

        PathObservation {
            frame_width: frame.width(),
            frame_height: frame.height(),
            path,
            marker,
        }
    }
}

//! Table marker detection
//!
//! Markers are large patches of a known color placed at each table. They are
//! thresholded on the same blurred HSV frame as the path but without
//! morphological cleanup.

use super::contours::ContourSelector;
use crate::frame::HsvFrame;
use serde::{Deserialize, Serialize};
use tracing::debug;
use trailsight_core::{BoundingBox, MarkerConfig};

/// A marker close enough to count as reached.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarkerSighting {
    pub name: String,
    pub bounding_box: BoundingBox,
}

#[derive(Debug, Clone, Default)]
pub struct MarkerDetector {
    markers: Vec<MarkerConfig>,
    selector: ContourSelector,
}

impl MarkerDetector {
    pub fn new(markers: Vec<MarkerConfig>) -> Self {
        Self {
            markers,
            selector: ContourSelector::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.markers.is_empty()
    }

    /// First configured marker whose largest region's bounding box exceeds its area threshold.
    pub fn detect(&self, hsv: &HsvFrame) -> Option<MarkerSighting> {
        for marker in &self.markers {
            let mask = hsv.threshold(&marker.range);
            let Some(largest) = self.selector.dominant(&mask) else {
                continue;
            };
            let bounding_box = largest.bounding_box();
            debug!(
                "Marker '{}' candidate covers {} px²",
                marker.name,
                bounding_box.area()
            );
            if bounding_box.area() > marker.min_area {
                return Some(MarkerSighting {
                    name: marker.name.clone(),
                    bounding_box,
                });
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::Frame;
    use crate::processing::segmentation::PathSegmenter;
    use trailsight_core::ColorRange;

    fn marker(name: &str, range: ColorRange, min_area: i64) -> MarkerConfig {
        MarkerConfig { name: name.to_string(), range, min_area }
    }

    #[test]
    fn test_detects_large_marker() {
        let frame = Frame::from_fn(120, 80, |x, y| {
            if (20..100).contains(&x) && (10..70).contains(&y) {
                [255, 0, 0]
            } else {
                [255, 255, 255]
            }
        });
        let hsv = PathSegmenter::default().prepare(&frame);
        let detector = MarkerDetector::new(vec![
            marker("green", ColorRange::GREEN_MARKER, 1000),
            marker("red", ColorRange::RED_MARKER, 1000),
        ]);
        let sighting = detector.detect(&hsv).unwrap();
        assert_eq!(sighting.name, "red");
        assert!(sighting.bounding_box.area() > 1000);
    }

    #[test]
    fn test_small_marker_ignored() {
        let frame = Frame::from_fn(120, 80, |x, y| {
            if (50..60).contains(&x) && (30..40).contains(&y) {
                [255, 0, 0]
            } else {
                [255, 255, 255]
            }
        });
        let hsv = PathSegmenter::default().prepare(&frame);
        let detector = MarkerDetector::new(vec![marker("red", ColorRange::RED_MARKER, 1000)]);
        assert!(detector.detect(&hsv).is_none());
    }

    #[test]
    fn test_no_markers_configured() {
        let frame = Frame::filled(10, 10, [255, 0, 0]);
        let hsv = PathSegmenter::default().prepare(&frame);
        let detector = MarkerDetector::default();
        assert!(detector.is_empty());
        assert!(detector.detect(&hsv).is_none());
    }
}

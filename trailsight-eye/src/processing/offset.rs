//! Horizontal offset of the path from the optical center

use super::contours::Contour;

/// Signed pixel distance between the path's bounding-box center and the frame center.
/// Positive when the path sits right of center.
#[derive(Debug, Clone, Copy, Default)]
pub struct OffsetEstimator;

impl OffsetEstimator {
    pub fn new() -> Self {
        Self
    }

    pub fn estimate(&self, contour: &Contour, frame_width: u32) -> f64 {
        contour.bounding_box().center_x() - frame_width as f64 / 2.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_centered_contour() {
        // x = 590, w = 100 in a 1280 wide frame
        let contour = Contour::from_coords(&[(590, 100), (689, 100), (689, 500), (590, 500)]);
        assert_eq!(OffsetEstimator::new().estimate(&contour, 1280), 0.0);
    }

    #[test]
    fn test_offset_sign() {
        let right = Contour::from_coords(&[(900, 0), (999, 0), (999, 10), (900, 10)]);
        let left = Contour::from_coords(&[(100, 0), (199, 0), (199, 10), (100, 10)]);
        let estimator = OffsetEstimator::new();
        assert_eq!(estimator.estimate(&right, 1280), 310.0);
        assert_eq!(estimator.estimate(&left, 1280), -490.0);
    }

    #[test]
    fn test_half_pixel_offsets() {
        // odd width: x + w/2 keeps the half pixel
        let contour = Contour::from_coords(&[(10, 0), (14, 0), (14, 3), (10, 3)]);
        assert_eq!(OffsetEstimator::new().estimate(&contour, 20), 2.5);
        assert_eq!(OffsetEstimator::new().estimate(&contour, 25), 0.0);
    }
}

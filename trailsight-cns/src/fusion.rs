//! Orientation and offset fusion into one steering angle

use trailsight_core::PipelineProfile;

/// Angular correction (degrees) for a pixel offset seen at `focal_distance`.
///
/// Zero when the offset is zero or when `|offset| / focal_distance` leaves the
/// arcsine domain. Otherwise `sign(offset) * degrees(asin(|offset| / focal))`.
pub fn correction(offset: f64, focal_distance: f64) -> f64 {
    if offset == 0.0 {
        return 0.0;
    }
    let ratio = offset.abs() / focal_distance;
    if ratio.is_nan() || ratio > 1.0 {
        return 0.0;
    }
    offset.signum() * ratio.asin().to_degrees()
}

/// Steering angle from an orientation angle and a pixel offset.
pub fn fuse(orientation: f64, offset: f64, focal_distance: f64) -> f64 {
    orientation + correction(offset, focal_distance)
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AngleFusion {
    focal_distance: f64,
}

impl AngleFusion {
    pub fn new(focal_distance: f64) -> Self {
        Self { focal_distance }
    }

    pub fn from_profile(profile: &PipelineProfile) -> Self {
        Self::new(profile.focal_distance)
    }

    pub fn focal_distance(&self) -> f64 {
        self.focal_distance
    }

    pub fn fuse(&self, orientation: f64, offset: f64) -> f64 {
        fuse(orientation, offset, self.focal_distance)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_half_focal_offset_is_thirty_degrees() {
        assert!((correction(290.0, 580.0) - 30.0).abs() < 1e-9);
        assert!((correction(-290.0, 580.0) + 30.0).abs() < 1e-9);
        assert!((correction(400.0, 800.0) - 30.0).abs() < 1e-9);
    }

    #[test]
    fn test_zero_offset() {
        assert_eq!(correction(0.0, 580.0), 0.0);
        assert_eq!(fuse(-12.0, 0.0, 580.0), -12.0);
    }

    #[test]
    fn test_saturation() {
        assert_eq!(correction(581.0, 580.0), 0.0);
        assert_eq!(correction(-5000.0, 580.0), 0.0);
        // boundary is still inside the domain
        assert!((correction(580.0, 580.0) - 90.0).abs() < 1e-9);
    }

    #[test]
    fn test_fusion_from_profile() {
        let lane = AngleFusion::from_profile(&PipelineProfile::lane_following());
        assert_eq!(lane.focal_distance(), 580.0);
        assert!((lane.fuse(5.0, 290.0) - 35.0).abs() < 1e-9);

        let table = AngleFusion::from_profile(&PipelineProfile::table_service());
        assert_eq!(table.focal_distance(), 800.0);
    }

    proptest! {
        #[test]
        fn prop_zero_offset_has_no_correction(focal in 1.0f64..5000.0) {
            prop_assert_eq!(correction(0.0, focal), 0.0);
        }

        #[test]
        fn prop_saturated_offset_has_no_correction(focal in 1.0f64..2000.0, extra in 0.001f64..5000.0, negative: bool) {
            let magnitude = focal + extra;
            let offset = if negative { -magnitude } else { magnitude };
            prop_assert_eq!(correction(offset, focal), 0.0);
        }

        #[test]
        fn prop_correction_follows_offset_sign(focal in 1.0f64..2000.0, fraction in 0.001f64..1.0, negative: bool) {
            let magnitude = focal * fraction;
            let offset = if negative { -magnitude } else { magnitude };
            let c = correction(offset, focal);
            prop_assert!(c.abs() <= 90.0);
            prop_assert_eq!(c > 0.0, offset > 0.0);
        }
    }
}

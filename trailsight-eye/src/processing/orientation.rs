//! Oriented bounding box fitting and steering-angle normalization
//!
//! The fitter reports the rectangle the way the common min-area-rect routine
//! does: the raw angle lies in `(-90, 0]` degrees (image coordinates, y down)
//! and `width` is the side running along that direction. Which side ends up
//! labeled width therefore depends on the tilt, so the raw angle alone does not
//! tell which way the path leans. [`normalize_angle`] folds the two labelings
//! into one convention. Downstream sign conventions depend on it, so the rule
//! is reproduced step for step and must not be simplified.

use super::contours::Contour;
use imageproc::geometry::convex_hull;
use imageproc::point::Point;
use trailsight_core::OrientedBox;

const EPS: f64 = 1e-9;

/// Fold a raw `(angle, width, height)` fit into the steering convention.
///
/// 1. `angle > 45` → `angle - 90`
/// 2. `width < height` and `angle < 0` → `90 + angle`
/// 3. `width > height` and `angle > 0` → `angle - 90`
/// 4. truncate toward zero
pub fn normalize_angle(raw_angle: f64, width: f64, height: f64) -> i32 {
    let mut angle = raw_angle;
    if angle > 45.0 {
        angle -= 90.0;
    }
    if width < height && angle < 0.0 {
        angle += 90.0;
    }
    if width > height && angle > 0.0 {
        angle -= 90.0;
    }
    angle.trunc() as i32
}

/// Minimum-area enclosing rectangle of a point set (rotating calipers over the hull).
///
/// Returns `(center, (width, height), raw_angle)` in the fitter convention.
pub fn min_area_rect(points: &[Point<i32>]) -> ((f64, f64), (f64, f64), f64) {
    if points.is_empty() {
        return ((0.0, 0.0), (0.0, 0.0), 0.0);
    }
    let hull: Vec<(f64, f64)> = convex_hull(points)
        .into_iter()
        .map(|p| (p.x as f64, p.y as f64))
        .collect();

    if hull.len() == 1 {
        return (hull[0], (0.0, 0.0), 0.0);
    }

    // (area, u, v, u-extent, v-extent)
    let mut best: Option<(f64, (f64, f64), (f64, f64), (f64, f64), (f64, f64))> = None;
    let m = hull.len();
    for i in 0..m {
        let (x0, y0) = hull[i];
        let (x1, y1) = hull[(i + 1) % m];
        let (dx, dy) = (x1 - x0, y1 - y0);
        let len = (dx * dx + dy * dy).sqrt();
        if len < EPS {
            continue;
        }
        let u = (dx / len, dy / len);
        let v = (-u.1, u.0);

        let (mut min_u, mut max_u) = (f64::INFINITY, f64::NEG_INFINITY);
        let (mut min_v, mut max_v) = (f64::INFINITY, f64::NEG_INFINITY);
        for &(px, py) in &hull {
            let pu = px * u.0 + py * u.1;
            let pv = px * v.0 + py * v.1;
            min_u = min_u.min(pu);
            max_u = max_u.max(pu);
            min_v = min_v.min(pv);
            max_v = max_v.max(pv);
        }
        let area = (max_u - min_u) * (max_v - min_v);
        let improves = match &best {
            Some((best_area, ..)) => area < best_area - EPS,
            None => true,
        };
        if improves {
            best = Some((area, u, v, (min_u, max_u), (min_v, max_v)));
        }
    }

    let Some((_, u, v, (min_u, max_u), (min_v, max_v))) = best else {
        return (hull[0], (0.0, 0.0), 0.0);
    };

    let cu = (min_u + max_u) / 2.0;
    let cv = (min_v + max_v) / 2.0;
    let center = (cu * u.0 + cv * v.0, cu * u.1 + cv * v.1);

    let (width, height, raw_angle) = fitter_convention(u, max_u - min_u, max_v - min_v);
    (center, (width, height), raw_angle)
}

/// Label the sides so the width side's direction falls in `(-90, 0]`.
fn fitter_convention(u: (f64, f64), along_u: f64, along_v: f64) -> (f64, f64, f64) {
    let mut angle = u.1.atan2(u.0).to_degrees();
    // direction modulo 180 into (-90, 90]
    if angle <= -90.0 {
        angle += 180.0;
    } else if angle > 90.0 {
        angle -= 180.0;
    }

    // strip float noise so whole-degree tilts truncate to themselves
    angle = (angle * 1e6).round() / 1e6;

    let (mut width, mut height) = (along_u, along_v);
    if angle > 0.0 {
        // the perpendicular side lies at angle - 90
        angle -= 90.0;
        std::mem::swap(&mut width, &mut height);
    }
    if angle <= -90.0 {
        angle += 90.0;
        std::mem::swap(&mut width, &mut height);
    }
    // fold -0.0 into 0.0
    (width, height, angle + 0.0)
}

/// Fits a contour's oriented box and normalizes its angle for steering.
#[derive(Debug, Clone, Copy, Default)]
pub struct OrientationEstimator;

impl OrientationEstimator {
    pub fn new() -> Self {
        Self
    }

    pub fn estimate(&self, contour: &Contour) -> OrientedBox {
        let (center, size, raw_angle) = min_area_rect(contour.points());
        OrientedBox {
            center,
            size,
            raw_angle,
            angle: normalize_angle(raw_angle, size.0, size.1) as f64,
        }
    }
}

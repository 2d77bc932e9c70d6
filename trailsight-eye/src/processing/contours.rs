//! Contour extraction and dominant-region selection

use crate::frame::Mask;
use image::{GrayImage, Luma};
use imageproc::contours::{find_contours, BorderType};
use imageproc::point::Point;
use tracing::debug;
use trailsight_core::BoundingBox;

/// Closed outer boundary of a connected mask region.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Contour {
    points: Vec<Point<i32>>,
}

impl Contour {
    pub fn new(points: Vec<Point<i32>>) -> Self {
        Self { points }
    }

    pub fn from_coords(coords: &[(i32, i32)]) -> Self {
        Self::new(coords.iter().map(|&(x, y)| Point::new(x, y)).collect())
    }

    pub fn points(&self) -> &[Point<i32>] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Enclosed polygon area (shoelace), always non-negative.
    pub fn area(&self) -> f64 {
        let n = self.points.len();
        if n < 3 {
            return 0.0;
        }
        let mut twice_area: i64 = 0;
        for i in 0..n {
            let p = self.points[i];
            let q = self.points[(i + 1) % n];
            twice_area += p.x as i64 * q.y as i64 - q.x as i64 * p.y as i64;
        }
        twice_area.abs() as f64 / 2.0
    }

    /// Smallest axis-aligned box covering every point, in pixel counts.
    pub fn bounding_box(&self) -> BoundingBox {
        if self.points.is_empty() {
            return BoundingBox { x: 0, y: 0, width: 0, height: 0 };
        }
        let (mut min_x, mut min_y) = (i32::MAX, i32::MAX);
        let (mut max_x, mut max_y) = (i32::MIN, i32::MIN);
        for p in &self.points {
            min_x = min_x.min(p.x);
            min_y = min_y.min(p.y);
            max_x = max_x.max(p.x);
            max_y = max_y.max(p.y);
        }
        BoundingBox {
            x: min_x,
            y: min_y,
            width: max_x - min_x + 1,
            height: max_y - min_y + 1,
        }
    }
}

/// Drop points lying in the middle of straight runs, keeping run end points.
fn compress_runs(points: Vec<Point<i32>>) -> Vec<Point<i32>> {
    let n = points.len();
    if n < 3 {
        return points;
    }
    let mut kept = Vec::with_capacity(n);
    for i in 0..n {
        let prev = points[(i + n - 1) % n];
        let cur = points[i];
        let next = points[(i + 1) % n];
        let (ax, ay) = (cur.x - prev.x, cur.y - prev.y);
        let (bx, by) = (next.x - cur.x, next.y - cur.y);
        let collinear = ax * by - ay * bx == 0;
        let forward = ax * bx + ay * by > 0;
        if !(collinear && forward) {
            kept.push(cur);
        }
    }
    if kept.is_empty() {
        // Every point lies inside one straight run; keep them all.
        return points;
    }
    kept
}

/// Mask surrounded by a one-pixel background border, so regions touching
/// the frame edge are still traced as outer borders.
fn pad_mask(mask: &Mask) -> GrayImage {
    let source = mask.as_image();
    let (width, height) = source.dimensions();
    GrayImage::from_fn(width + 2, height + 2, |x, y| {
        if x == 0 || y == 0 || x > width || y > height {
            Luma([0u8])
        } else {
            *source.get_pixel(x - 1, y - 1)
        }
    })
}

/// Extracts outer contours and picks the dominant one.
#[derive(Debug, Clone, Copy, Default)]
pub struct ContourSelector;

impl ContourSelector {
    pub fn new() -> Self {
        Self
    }

    /// Outermost boundaries only, in raster-scan order of their first pixel.
    pub fn extract_contours(&self, mask: &Mask) -> Vec<Contour> {
        let contours: Vec<Contour> = find_contours::<i32>(&pad_mask(mask))
            .into_iter()
            .filter(|c| matches!(c.border_type, BorderType::Outer) && c.parent.is_none())
            .map(|c| {
                let points = c.points.iter().map(|p| Point::new(p.x - 1, p.y - 1)).collect();
                Contour::new(compress_runs(points))
            })
            .collect();
        debug!("Found {} outer contours", contours.len());
        contours
    }

    /// Largest enclosed area; the first one wins a tie. `None` means no path is visible.
    pub fn select_largest(&self, contours: Vec<Contour>) -> Option<Contour> {
        let mut best: Option<(f64, Contour)> = None;
        for contour in contours {
            let area = contour.area();
            match &best {
                Some((best_area, _)) if area <= *best_area => {}
                _ => best = Some((area, contour)),
            }
        }
        best.map(|(_, contour)| contour)
    }

    pub fn dominant(&self, mask: &Mask) -> Option<Contour> {
        self.select_largest(self.extract_contours(mask))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rect_mask(width: u32, height: u32, rects: &[(u32, u32, u32, u32)]) -> Mask {
        Mask::from_fn(width, height, |x, y| {
            rects
                .iter()
                .any(|&(rx, ry, rw, rh)| x >= rx && x < rx + rw && y >= ry && y < ry + rh)
        })
    }

    #[test]
    fn test_area_of_square() {
        let contour = Contour::from_coords(&[(0, 0), (10, 0), (10, 10), (0, 10)]);
        assert_eq!(contour.area(), 100.0);
        let reversed = Contour::from_coords(&[(0, 10), (10, 10), (10, 0), (0, 0)]);
        assert_eq!(reversed.area(), 100.0);
    }

    #[test]
    fn test_area_degenerate() {
        assert_eq!(Contour::from_coords(&[(1, 1)]).area(), 0.0);
        assert_eq!(Contour::from_coords(&[(1, 1), (5, 1)]).area(), 0.0);
    }

    #[test]
    fn test_bounding_box_counts_pixels() {
        let contour = Contour::from_coords(&[(2, 3), (6, 3), (6, 9), (2, 9)]);
        let bbox = contour.bounding_box();
        assert_eq!(bbox, BoundingBox { x: 2, y: 3, width: 5, height: 7 });
    }

    #[test]
    fn test_compress_runs_keeps_corners() {
        let mut points = Vec::new();
        for x in 0..4 {
            points.push(Point::new(x, 0));
        }
        for y in 1..4 {
            points.push(Point::new(3, y));
        }
        for x in (0..3).rev() {
            points.push(Point::new(x, 3));
        }
        for y in (1..3).rev() {
            points.push(Point::new(0, y));
        }
        let compressed = compress_runs(points);
        assert_eq!(
            compressed,
            vec![Point::new(0, 0), Point::new(3, 0), Point::new(3, 3), Point::new(0, 3)]
        );
    }

    #[test]
    fn test_extract_single_rectangle() {
        let mask = rect_mask(40, 30, &[(10, 5, 8, 12)]);
        let contours = ContourSelector::new().extract_contours(&mask);
        assert_eq!(contours.len(), 1);
        let bbox = contours[0].bounding_box();
        assert_eq!(bbox, BoundingBox { x: 10, y: 5, width: 8, height: 12 });
        assert_eq!(contours[0].len(), 4);
        assert_eq!(contours[0].area(), 7.0 * 11.0);
    }

    #[test]
    fn test_extract_ignores_holes() {
        let mask = Mask::from_fn(30, 30, |x, y| {
            let outer = (5..25).contains(&x) && (5..25).contains(&y);
            let hole = (10..20).contains(&x) && (10..20).contains(&y);
            outer && !hole
        });
        let contours = ContourSelector::new().extract_contours(&mask);
        assert_eq!(contours.len(), 1);
    }

    #[test]
    fn test_extract_regions_touching_each_edge() {
        let (width, height) = (40, 30);
        let cases = [
            ("left", (0, 5, 10, 12)),
            ("right", (30, 5, 10, 12)),
            ("top", (12, 0, 8, 9)),
            ("bottom", (12, 21, 8, 9)),
            ("top-left corner", (0, 0, 6, 7)),
            ("full frame", (0, 0, width, height)),
        ];
        let selector = ContourSelector::new();
        for (name, (x, y, w, h)) in cases {
            let mask = rect_mask(width, height, &[(x, y, w, h)]);
            let contours = selector.extract_contours(&mask);
            assert_eq!(contours.len(), 1, "{} region", name);
            assert_eq!(
                contours[0].bounding_box(),
                BoundingBox { x: x as i32, y: y as i32, width: w as i32, height: h as i32 },
                "{} region",
                name
            );
        }
    }

    #[test]
    fn test_left_edge_region_is_dominant() {
        let mask = rect_mask(100, 50, &[(0, 0, 30, 50), (60, 10, 10, 10)]);
        let largest = ContourSelector::new().dominant(&mask).unwrap();
        assert_eq!(largest.bounding_box(), BoundingBox { x: 0, y: 0, width: 30, height: 50 });
    }

    #[test]
    fn test_extract_empty_mask() {
        let mask = Mask::empty(20, 20);
        let selector = ContourSelector::new();
        assert!(selector.extract_contours(&mask).is_empty());
        assert!(selector.dominant(&mask).is_none());
    }

    #[test]
    fn test_select_largest() {
        let mask = rect_mask(100, 50, &[(2, 2, 5, 5), (20, 2, 30, 30), (60, 2, 10, 10)]);
        let largest = ContourSelector::new().dominant(&mask).unwrap();
        assert_eq!(largest.bounding_box().x, 20);
    }

    #[test]
    fn test_select_largest_tie_keeps_first() {
        let a = Contour::from_coords(&[(0, 0), (4, 0), (4, 4), (0, 4)]);
        let b = Contour::from_coords(&[(10, 0), (14, 0), (14, 4), (10, 4)]);
        let chosen = ContourSelector::new().select_largest(vec![a.clone(), b]).unwrap();
        assert_eq!(chosen, a);
    }

    #[test]
    fn test_select_largest_empty() {
        assert!(ContourSelector::new().select_largest(Vec::new()).is_none());
    }
}

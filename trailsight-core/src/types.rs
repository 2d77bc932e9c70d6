use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Inclusive HSV bounds used to threshold a frame.
///
/// Channels follow the 8-bit convention: hue in `[0, 179]`, saturation and
/// value in `[0, 255]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColorRange {
    pub lower: [u8; 3],
    pub upper: [u8; 3],
}

impl ColorRange {
    /// Blue ink guide line.
    pub const BLUE_INK: ColorRange = ColorRange::new([115, 35, 60], [133, 255, 255]);
    /// Red table marker.
    pub const RED_MARKER: ColorRange = ColorRange::new([0, 115, 145], [9, 255, 255]);
    /// Yellow table marker.
    pub const YELLOW_MARKER: ColorRange = ColorRange::new([10, 120, 150], [90, 255, 255]);
    /// Green table marker.
    pub const GREEN_MARKER: ColorRange = ColorRange::new([35, 75, 115], [55, 255, 255]);

    pub const fn new(lower: [u8; 3], upper: [u8; 3]) -> Self {
        Self { lower, upper }
    }

    /// True when every channel of `hsv` lies within the bounds.
    #[inline]
    pub fn contains(&self, hsv: [u8; 3]) -> bool {
        (0..3).all(|c| hsv[c] >= self.lower[c] && hsv[c] <= self.upper[c])
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.lower[0] > 179 || self.upper[0] > 179 {
            return Err(format!(
                "Hue bounds must be within [0, 179], got {}..{}",
                self.lower[0], self.upper[0]
            ));
        }
        for c in 0..3 {
            if self.lower[c] > self.upper[c] {
                return Err(format!(
                    "Lower bound {} exceeds upper bound {} on channel {}",
                    self.lower[c], self.upper[c], c
                ));
            }
        }
        Ok(())
    }
}

/// Axis-aligned bounding box in pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl BoundingBox {
    pub fn area(&self) -> i64 {
        self.width as i64 * self.height as i64
    }

    /// Horizontal center, `x + width / 2` with real division.
    pub fn center_x(&self) -> f64 {
        self.x as f64 + self.width as f64 / 2.0
    }
}

/// Minimum-area rectangle enclosing a contour.
///
/// `raw_angle` and `size` are reported in the fitter's convention: `raw_angle`
/// lies in `(-90, 0]` and `size.0` is the side running along that direction.
/// `angle` is the steering-normalized value (an integral number of degrees).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OrientedBox {
    pub center: (f64, f64),
    pub size: (f64, f64),
    pub raw_angle: f64,
    pub angle: f64,
}

impl OrientedBox {
    /// The four corners, in the same order the usual box-points routine emits.
    pub fn corners(&self) -> [(f64, f64); 4] {
        let theta = self.raw_angle.to_radians();
        let b = theta.cos() * 0.5;
        let a = theta.sin() * 0.5;
        let (cx, cy) = self.center;
        let (w, h) = self.size;

        let p0 = (cx - a * h - b * w, cy + b * h - a * w);
        let p1 = (cx + a * h - b * w, cy - b * h - a * w);
        let p2 = (2.0 * cx - p0.0, 2.0 * cy - p0.1);
        let p3 = (2.0 * cx - p1.0, 2.0 * cy - p1.1);
        [p0, p1, p2, p3]
    }
}

/// Single-symbol command understood by the drive controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SteeringCommand {
    Left,
    Right,
    Forward,
}

impl SteeringCommand {
    /// Wire encoding: one ASCII byte.
    pub fn as_byte(&self) -> u8 {
        match self {
            SteeringCommand::Left => b'l',
            SteeringCommand::Right => b'r',
            SteeringCommand::Forward => b'f',
        }
    }
}

impl fmt::Display for SteeringCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_byte() as char)
    }
}

/// Outcome of one frame's steering decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SteeringDecision {
    Left,
    Right,
    Forward,
    /// No path visible in the frame.
    Searching,
}

impl SteeringDecision {
    /// Minimum hold time when no override is configured.
    pub fn default_dwell(&self) -> Duration {
        match self {
            SteeringDecision::Left | SteeringDecision::Right | SteeringDecision::Searching => {
                Duration::from_millis(50)
            }
            SteeringDecision::Forward => Duration::from_millis(175),
        }
    }

    /// Command sent to the actuator. While searching the device keeps turning right.
    pub fn command(&self) -> SteeringCommand {
        match self {
            SteeringDecision::Left => SteeringCommand::Left,
            SteeringDecision::Right | SteeringDecision::Searching => SteeringCommand::Right,
            SteeringDecision::Forward => SteeringCommand::Forward,
        }
    }

    /// Human-readable status for overlays and logs.
    pub fn status(&self) -> &'static str {
        match self {
            SteeringDecision::Left => "Go left",
            SteeringDecision::Right => "Go right",
            SteeringDecision::Forward => "Go straight",
            SteeringDecision::Searching => "looking for path",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            SteeringDecision::Left => "left",
            SteeringDecision::Right => "right",
            SteeringDecision::Forward => "forward",
            SteeringDecision::Searching => "searching",
        }
    }
}

impl fmt::Display for SteeringDecision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_color_range_contains_inclusive() {
        let range = ColorRange::BLUE_INK;
        assert!(range.contains([115, 35, 60]));
        assert!(range.contains([133, 255, 255]));
        assert!(!range.contains([114, 200, 200]));
        assert!(!range.contains([120, 34, 200]));
    }

    #[test]
    fn test_color_range_validate() {
        assert!(ColorRange::BLUE_INK.validate().is_ok());
        assert!(ColorRange::new([0, 0, 0], [180, 255, 255]).validate().is_err());
        assert!(ColorRange::new([10, 50, 0], [20, 40, 255]).validate().is_err());
    }

    #[test]
    fn test_bounding_box_center() {
        let bbox = BoundingBox { x: 10, y: 0, width: 5, height: 3 };
        assert_eq!(bbox.center_x(), 12.5);
        assert_eq!(bbox.area(), 15);
    }

    #[test]
    fn test_oriented_box_corners_axis_aligned() {
        let rect = OrientedBox {
            center: (10.0, 20.0),
            size: (4.0, 2.0),
            raw_angle: 0.0,
            angle: 0.0,
        };
        let corners = rect.corners();
        assert_eq!(corners[0], (8.0, 21.0));
        assert_eq!(corners[1], (8.0, 19.0));
        assert_eq!(corners[2], (12.0, 19.0));
        assert_eq!(corners[3], (12.0, 21.0));
    }

    #[test]
    fn test_command_bytes() {
        assert_eq!(SteeringCommand::Left.as_byte(), b'l');
        assert_eq!(SteeringCommand::Right.as_byte(), b'r');
        assert_eq!(SteeringCommand::Forward.as_byte(), b'f');
    }

    #[test]
    fn test_searching_turns_right() {
        assert_eq!(SteeringDecision::Searching.command(), SteeringCommand::Right);
        assert_eq!(SteeringDecision::Searching.status(), "looking for path");
        assert_eq!(SteeringDecision::Searching.default_dwell(), Duration::from_millis(50));
        assert_eq!(SteeringDecision::Forward.default_dwell(), Duration::from_millis(175));
    }
}

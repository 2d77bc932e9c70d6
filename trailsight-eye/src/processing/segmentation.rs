//! Color segmentation of the guide path

use crate::frame::{Frame, HsvFrame, Mask};
use image::{Rgb, RgbImage};
use imageproc::distance_transform::Norm;
use imageproc::filter;
use imageproc::morphology;
use tracing::debug;
use trailsight_core::{ColorRange, PipelineProfile};

/// Radius of the 5x5 square structuring element under the L-infinity norm.
const KERNEL_RADIUS: u32 = 2;

/// Turns a frame into a cleaned binary mask of path-colored pixels.
///
/// Stages: 5x5 Gaussian blur, RGB to HSV, inclusive range threshold, 5x5
/// opening, `erosion_iterations` erosions, `dilation_iterations` dilations.
#[derive(Debug, Clone, PartialEq)]
pub struct PathSegmenter {
    blur_sigma: f64,
    erosion_iterations: u32,
    dilation_iterations: u32,
}

impl PathSegmenter {
    pub fn new(erosion_iterations: u32) -> Self {
        Self {
            blur_sigma: 4.0,
            erosion_iterations,
            dilation_iterations: 5,
        }
    }

    pub fn from_profile(profile: &PipelineProfile) -> Self {
        Self {
            blur_sigma: profile.blur_sigma,
            erosion_iterations: profile.erosion_iterations,
            dilation_iterations: profile.dilation_iterations,
        }
    }

    pub fn with_blur_sigma(mut self, sigma: f64) -> Self {
        self.blur_sigma = sigma;
        self
    }

    pub fn erosion_iterations(&self) -> u32 {
        self.erosion_iterations
    }

    /// Blur and convert to HSV. Shared by path and marker thresholding.
    pub fn prepare(&self, frame: &Frame) -> HsvFrame {
        let blurred = gaussian_blur_5x5(frame.image(), self.blur_sigma);
        to_hsv(&blurred)
    }

    /// Morphological cleanup of a raw threshold mask.
    pub fn clean(&self, mask: Mask) -> Mask {
        let image = mask.into_image();
        let opened = morphology::open(&image, Norm::LInf, KERNEL_RADIUS as u8);
        let eroded = morphology::erode(&opened, Norm::LInf, structuring_radius(self.erosion_iterations));
        let dilated = morphology::dilate(&eroded, Norm::LInf, structuring_radius(self.dilation_iterations));
        Mask::from_image(dilated)
    }

    /// Threshold an already prepared frame and clean the result.
    pub fn segment_hsv(&self, hsv: &HsvFrame, range: &ColorRange) -> Mask {
        let raw = hsv.threshold(range);
        let cleaned = self.clean(raw);
        debug!(
            "Segmented {}x{} frame: {} path pixels",
            cleaned.width(),
            cleaned.height(),
            cleaned.count()
        );
        cleaned
    }

    pub fn segment(&self, frame: &Frame, range: &ColorRange) -> Mask {
        let hsv = self.prepare(frame);
        self.segment_hsv(&hsv, range)
    }
}

impl Default for PathSegmenter {
    fn default() -> Self {
        Self::new(1)
    }
}

/// `n` passes of a 5x5 square equal one pass of a `(4n + 1)` square.
fn structuring_radius(iterations: u32) -> u8 {
    (KERNEL_RADIUS * iterations).min(u8::MAX as u32) as u8
}

fn gaussian_kernel_5(sigma: f64) -> [f32; 5] {
    let mut kernel = [0f64; 5];
    let denom = 2.0 * sigma * sigma;
    for (i, k) in kernel.iter_mut().enumerate() {
        let d = i as f64 - 2.0;
        *k = (-(d * d) / denom).exp();
    }
    let sum: f64 = kernel.iter().sum();
    kernel.map(|k| (k / sum) as f32)
}

/// 5x5 Gaussian blur; borders are padded by continuity.
pub fn gaussian_blur_5x5(image: &RgbImage, sigma: f64) -> RgbImage {
    if image.width() == 0 || image.height() == 0 {
        return image.clone();
    }
    filter::separable_filter_equal(image, &gaussian_kernel_5(sigma))
}

/// 8-bit RGB to HSV: hue halved into `[0, 180)`, saturation and value scaled to `[0, 255]`.
pub fn rgb_to_hsv(rgb: [u8; 3]) -> [u8; 3] {
    let [r, g, b] = rgb.map(|c| c as f32);
    let v = r.max(g).max(b);
    let min = r.min(g).min(b);
    let diff = v - min;

    let s = if v == 0.0 { 0.0 } else { 255.0 * diff / v };

    let mut h = if diff == 0.0 {
        0.0
    } else if v == r {
        60.0 * (g - b) / diff
    } else if v == g {
        120.0 + 60.0 * (b - r) / diff
    } else {
        240.0 + 60.0 * (r - g) / diff
    };
    if h < 0.0 {
        h += 360.0;
    }

    let mut hue = (h / 2.0).round() as u32;
    if hue >= 180 {
        hue -= 180;
    }
    [hue as u8, s.round() as u8, v as u8]
}

pub fn to_hsv(image: &RgbImage) -> HsvFrame {
    let mut out = RgbImage::new(image.width(), image.height());
    for (src, dst) in image.pixels().zip(out.pixels_mut()) {
        *dst = Rgb(rgb_to_hsv(src.0));
    }
    HsvFrame::from_channels(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    const WHITE: [u8; 3] = [255, 255, 255];
    const BLUE: [u8; 3] = [0, 0, 255];

    #[test]
    fn test_rgb_to_hsv_primaries() {
        assert_eq!(rgb_to_hsv([255, 0, 0]), [0, 255, 255]);
        assert_eq!(rgb_to_hsv([0, 255, 0]), [60, 255, 255]);
        assert_eq!(rgb_to_hsv([0, 0, 255]), [120, 255, 255]);
        assert_eq!(rgb_to_hsv([255, 0, 255]), [150, 255, 255]);
    }

    #[test]
    fn test_rgb_to_hsv_achromatic() {
        assert_eq!(rgb_to_hsv([0, 0, 0]), [0, 0, 0]);
        assert_eq!(rgb_to_hsv([255, 255, 255]), [0, 0, 255]);
        assert_eq!(rgb_to_hsv([128, 128, 128]), [0, 0, 128]);
    }

    #[test]
    fn test_rgb_to_hsv_hue_wraps() {
        // 359.8 degrees rounds onto the wrap point
        assert_eq!(rgb_to_hsv([255, 0, 1])[0], 0);
    }

    #[test]
    fn test_kernel_normalized_and_symmetric() {
        let kernel = gaussian_kernel_5(4.0);
        let sum: f32 = kernel.iter().sum();
        assert!((sum - 1.0).abs() < 1e-6);
        assert_eq!(kernel[0], kernel[4]);
        assert_eq!(kernel[1], kernel[3]);
        assert!(kernel[2] > kernel[1] && kernel[1] > kernel[0]);
    }

    #[test]
    fn test_blur_uniform_image_unchanged() {
        let image = RgbImage::from_pixel(7, 4, Rgb([10, 200, 90]));
        let blurred = gaussian_blur_5x5(&image, 4.0);
        for (out, src) in blurred.pixels().zip(image.pixels()) {
            for c in 0..3 {
                assert!(src[c].abs_diff(out[c]) <= 1, "{:?} vs {:?}", out, src);
            }
        }
    }

    #[test]
    fn test_blur_softens_edge() {
        let image = RgbImage::from_fn(10, 1, |x, _| if x < 5 { Rgb([0, 0, 0]) } else { Rgb([200, 200, 200]) });
        let blurred = gaussian_blur_5x5(&image, 4.0);
        let left = blurred.get_pixel(4, 0)[0];
        let right = blurred.get_pixel(5, 0)[0];
        assert!(left > 0 && left < 100);
        assert!(right > 100 && right < 200);
        assert_eq!(blurred.get_pixel(0, 0)[0], 0);
        assert!(blurred.get_pixel(9, 0)[0] >= 199);
    }

    #[test]
    fn test_segment_vertical_band() {
        let frame = Frame::from_fn(200, 100, |x, _| if (80..120).contains(&x) { BLUE } else { WHITE });
        let mask = PathSegmenter::new(1).segment(&frame, &ColorRange::BLUE_INK);

        assert_eq!(mask.width(), 200);
        assert_eq!(mask.height(), 100);
        for x in 80..120 {
            assert!(mask.get(x, 50), "column {} should be path", x);
        }
        assert!(!mask.get(60, 50));
        assert!(!mask.get(140, 50));
        // Band reaches the top and bottom rows
        assert!(mask.get(100, 0));
        assert!(mask.get(100, 99));
    }

    #[test]
    fn test_segment_removes_speckle() {
        let frame = Frame::from_fn(60, 60, |x, y| if x == 30 && y == 30 { BLUE } else { WHITE });
        let mask = PathSegmenter::new(1).segment(&frame, &ColorRange::BLUE_INK);
        assert_eq!(mask.count(), 0);
    }

    #[test]
    fn test_more_erosion_shrinks_region() {
        let frame = Frame::from_fn(200, 60, |x, _| if (80..120).contains(&x) { BLUE } else { WHITE });
        let lane = PathSegmenter::new(1).segment(&frame, &ColorRange::BLUE_INK);
        let table = PathSegmenter::new(3).segment(&frame, &ColorRange::BLUE_INK);
        assert!(table.count() < lane.count());
        assert!(table.get(100, 30));
    }

    #[test]
    fn test_segment_nothing_matches() {
        let frame = Frame::filled(40, 30, WHITE);
        let mask = PathSegmenter::default().segment(&frame, &ColorRange::BLUE_INK);
        assert_eq!(mask.count(), 0);
    }
}

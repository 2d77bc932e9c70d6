//! Pixel buffers passed between pipeline stages

use crate::error::VisionError;
use image::{GrayImage, Luma, Rgb, RgbImage};
use trailsight_core::ColorRange;

/// A captured RGB frame. Immutable once built.
#[derive(Debug, Clone)]
pub struct Frame {
    image: RgbImage,
}

impl Frame {
    pub fn new(image: RgbImage) -> Self {
        Self { image }
    }

    /// Build a frame from packed RGB bytes.
    pub fn from_raw(width: u32, height: u32, data: Vec<u8>) -> Result<Self, VisionError> {
        let expected = (width as usize)
            .checked_mul(height as usize)
            .and_then(|p| p.checked_mul(3))
            .ok_or_else(|| VisionError::Processing("Frame dimensions overflow".to_string()))?;
        if data.len() != expected {
            return Err(VisionError::Processing(format!(
                "Frame buffer has {} bytes, expected {} for {}x{}",
                data.len(),
                expected,
                width,
                height
            )));
        }
        RgbImage::from_raw(width, height, data)
            .map(Self::new)
            .ok_or_else(|| VisionError::Processing("Invalid frame buffer".to_string()))
    }

    /// A frame of a single color.
    pub fn filled(width: u32, height: u32, rgb: [u8; 3]) -> Self {
        Self::new(RgbImage::from_pixel(width, height, Rgb(rgb)))
    }

    /// A frame painted per pixel.
    pub fn from_fn<F>(width: u32, height: u32, mut paint: F) -> Self
    where
        F: FnMut(u32, u32) -> [u8; 3],
    {
        Self::new(RgbImage::from_fn(width, height, |x, y| Rgb(paint(x, y))))
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn image(&self) -> &RgbImage {
        &self.image
    }
}

/// A frame converted to 8-bit HSV (hue in `[0, 180)`).
#[derive(Debug, Clone)]
pub struct HsvFrame {
    data: RgbImage,
}

impl HsvFrame {
    pub(crate) fn from_channels(data: RgbImage) -> Self {
        Self { data }
    }

    pub fn width(&self) -> u32 {
        self.data.width()
    }

    pub fn height(&self) -> u32 {
        self.data.height()
    }

    /// Binary mask of pixels whose every channel lies within `range`.
    pub fn threshold(&self, range: &ColorRange) -> Mask {
        let image = GrayImage::from_fn(self.width(), self.height(), |x, y| {
            if range.contains(self.data.get_pixel(x, y).0) {
                Luma([255u8])
            } else {
                Luma([0u8])
            }
        });
        Mask::from_image(image)
    }
}

/// Single-channel binary image; foreground pixels are 255.
#[derive(Debug, Clone, PartialEq)]
pub struct Mask {
    image: GrayImage,
}

impl Mask {
    /// Wrap a grayscale image, binarizing any nonzero value to 255.
    pub fn from_image(mut image: GrayImage) -> Self {
        for pixel in image.pixels_mut() {
            if pixel[0] != 0 {
                pixel[0] = 255;
            }
        }
        Self { image }
    }

    pub fn empty(width: u32, height: u32) -> Self {
        Self { image: GrayImage::new(width, height) }
    }

    pub fn from_fn<F>(width: u32, height: u32, mut inside: F) -> Self
    where
        F: FnMut(u32, u32) -> bool,
    {
        let image = GrayImage::from_fn(width, height, |x, y| {
            if inside(x, y) {
                Luma([255u8])
            } else {
                Luma([0u8])
            }
        });
        Self { image }
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn get(&self, x: u32, y: u32) -> bool {
        self.image.get_pixel(x, y)[0] != 0
    }

    /// Number of foreground pixels.
    pub fn count(&self) -> usize {
        self.image.pixels().filter(|p| p[0] != 0).count()
    }

    pub fn as_image(&self) -> &GrayImage {
        &self.image
    }

    pub fn into_image(self) -> GrayImage {
        self.image
    }
}

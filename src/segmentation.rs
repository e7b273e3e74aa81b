use image::{DynamicImage, ImageBuffer, Luma, RgbaImage};
use imageproc::map::map_colors;

use crate::errors::{CleanError, Result};

/// Minimum foreground probability for a pixel to count as subject.
pub const FOREGROUND_THRESHOLD: f32 = 0.5;

/// Tight pixel extent of the foreground region.
///
/// `right` and `bottom` are exclusive, so a non-degenerate box always has
/// `right > left` and `bottom > top`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoundingBox {
    pub left: u32,
    pub top: u32,
    pub right: u32,
    pub bottom: u32,
}

impl BoundingBox {
    pub const fn width(&self) -> u32 {
        self.right - self.left
    }

    pub const fn height(&self) -> u32 {
        self.bottom - self.top
    }
}

/// Per-pixel foreground probability map for a single image.
///
/// Probabilities are in `[0, 1]` and the buffer has the source image's
/// dimensions. A map is owned by the pipeline for the duration of one file
/// and never persisted or shared across files.
pub struct SegmentationMap {
    mask: ImageBuffer<Luma<f32>, Vec<f32>>,
}

impl SegmentationMap {
    pub const fn new(mask: ImageBuffer<Luma<f32>, Vec<f32>>) -> Self {
        Self { mask }
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.mask.dimensions()
    }

    /// Tight bounding box of pixels above [`FOREGROUND_THRESHOLD`], or `None`
    /// when the map contains no detectable foreground.
    pub fn bounding_box(&self) -> Option<BoundingBox> {
        let mut bounds: Option<[u32; 4]> = None;

        for (x, y, Luma([p])) in self.mask.enumerate_pixels() {
            if *p <= FOREGROUND_THRESHOLD {
                continue;
            }
            bounds = Some(match bounds {
                None => [x, y, x, y],
                Some([x1, y1, x2, y2]) => [x1.min(x), y1.min(y), x2.max(x), y2.max(y)],
            });
        }

        bounds.map(|[x1, y1, x2, y2]| BoundingBox {
            left: x1,
            top: y1,
            right: x2 + 1,
            bottom: y2 + 1,
        })
    }

    /// Produce a background-removed copy of `img`: colour channels from the
    /// source, alpha from the map.
    pub fn remove_background(&self, img: &DynamicImage) -> Result<RgbaImage> {
        let mut rgba = img.to_rgba8();
        if rgba.dimensions() != self.mask.dimensions() {
            return Err(CleanError::ImageProcessing {
                path: "unknown".to_string(),
                operation: "apply segmentation mask".to_string(),
                source: format!(
                    "image and mask dimensions do not match: image {}x{}, mask {}x{}",
                    rgba.width(),
                    rgba.height(),
                    self.mask.width(),
                    self.mask.height()
                )
                .into(),
            });
        }

        let alpha = map_colors(&self.mask, |Luma([p])| {
            Luma([(p.clamp(0.0, 1.0) * 255.0).round() as u8])
        });
        for (pixel, Luma([a])) in rgba.pixels_mut().zip(alpha.pixels()) {
            pixel[3] = *a;
        }
        Ok(rgba)
    }
}

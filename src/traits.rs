use crate::errors::Result;
use crate::segmentation::SegmentationMap;
use image::DynamicImage;

/// A detected face region within an image.
///
/// The pipeline only consults the number of detected regions; the geometry is
/// carried for diagnostics and alternative backends.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FaceRegion {
    /// X coordinate of the top-left corner (pixels).
    pub x: i32,
    /// Y coordinate of the top-left corner (pixels).
    pub y: i32,
    /// Width of the region (pixels).
    pub width: u32,
    /// Height of the region (pixels).
    pub height: u32,
    /// Detection confidence score.
    pub confidence: f64,
}

/// Pluggable face detection backend.
///
/// Implement this trait to provide a custom detector and pass it to
/// [`crate::pipeline::ImageCleaner`].
pub trait FaceDetector: Send + Sync {
    /// Detect faces in the given image.
    fn detect_faces(&self, img: &DynamicImage) -> Result<Vec<FaceRegion>>;
}

/// Foreground/background segmentation backend.
///
/// Depend on this abstraction rather than a concrete model so the pipeline
/// can be exercised with deterministic test doubles.
pub trait SegmentationModel: Send + Sync {
    /// Compute a per-pixel foreground map for the given image, at the image's
    /// own dimensions.
    fn segment(&self, img: &DynamicImage) -> Result<SegmentationMap>;
}

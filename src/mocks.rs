use std::collections::HashMap;

use image::{DynamicImage, GenericImageView, ImageBuffer, Luma};

use crate::destination::Confirm;
use crate::errors::Result;
use crate::segmentation::SegmentationMap;
use crate::traits::{FaceDetector, FaceRegion, SegmentationModel};

/// Test face detector returning a fixed number of synthetic regions.
///
/// Pipelines hand the detector decoded images, not paths, so per-file counts
/// are keyed by image width.
#[derive(Debug, Clone, Default)]
pub struct MockFaceDetector {
    default_count: usize,
    count_by_width: HashMap<u32, usize>,
}

impl MockFaceDetector {
    pub fn new(default_count: usize) -> Self {
        Self {
            default_count,
            count_by_width: HashMap::new(),
        }
    }

    /// Report `count` faces for images of the given width.
    pub fn with_count_for_width(mut self, width: u32, count: usize) -> Self {
        self.count_by_width.insert(width, count);
        self
    }
}

impl FaceDetector for MockFaceDetector {
    fn detect_faces(&self, img: &DynamicImage) -> Result<Vec<FaceRegion>> {
        let count = self
            .count_by_width
            .get(&img.width())
            .copied()
            .unwrap_or(self.default_count);
        Ok((0..count)
            .map(|i| FaceRegion {
                x: 10 * i as i32,
                y: 10,
                width: 32,
                height: 32,
                confidence: 10.0,
            })
            .collect())
    }
}

/// Test segmentation model marking everything foreground except a uniform
/// border of `margin` pixels.
#[derive(Debug, Clone)]
pub struct MockSegmentationModel {
    pub margin: u32,
}

impl MockSegmentationModel {
    pub const fn new(margin: u32) -> Self {
        Self { margin }
    }
}

impl SegmentationModel for MockSegmentationModel {
    fn segment(&self, img: &DynamicImage) -> Result<SegmentationMap> {
        let (width, height) = (img.width(), img.height());
        let margin = self.margin;
        let mask = ImageBuffer::from_fn(width, height, |x, y| {
            let foreground = x >= margin
                && y >= margin
                && x + margin < width
                && y + margin < height;
            Luma([if foreground { 1.0 } else { 0.0 }])
        });
        Ok(SegmentationMap::new(mask))
    }
}

/// Confirmation double replaying a fixed list of replies.
#[derive(Debug, Clone)]
pub struct ScriptedConfirm {
    replies: Vec<bool>,
    prompts_seen: usize,
}

impl ScriptedConfirm {
    pub fn new(replies: impl IntoIterator<Item = bool>) -> Self {
        Self {
            replies: replies.into_iter().collect(),
            prompts_seen: 0,
        }
    }

    pub const fn prompts_seen(&self) -> usize {
        self.prompts_seen
    }
}

impl Confirm for ScriptedConfirm {
    fn confirm(&mut self, _prompt: &str) -> Result<bool> {
        let reply = self
            .replies
            .get(self.prompts_seen)
            .copied()
            .expect("unexpected confirmation prompt");
        self.prompts_seen += 1;
        Ok(reply)
    }
}

/// Confirmation double for paths that must never prompt.
#[derive(Debug, Clone, Copy)]
pub struct UnreachableConfirm;

impl Confirm for UnreachableConfirm {
    fn confirm(&mut self, prompt: &str) -> Result<bool> {
        panic!("unexpected confirmation prompt: {prompt}");
    }
}

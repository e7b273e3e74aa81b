use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use image::DynamicImage;
use rustface::ImageData;

use crate::errors::{CleanError, Result};
use crate::traits::{FaceDetector, FaceRegion};

/// File name of the SeetaFace frontal detection model inside the model
/// directory.
pub const SEETAFACE_MODEL_FILE: &str = "seeta_fd_frontal_v1.0.bin";

/// Face detector backed by the `rustface` crate (SeetaFace engine).
pub struct SeetaFaceDetector {
    model: rustface::Model,
}

impl SeetaFaceDetector {
    /// Load the SeetaFace model from disk.
    pub fn load(model_path: &Path) -> Result<Self> {
        let file = File::open(model_path).map_err(|e| CleanError::FileSystem {
            path: model_path.to_path_buf(),
            operation: "open face detection model".to_string(),
            source: e,
        })?;
        let model = rustface::read_model(BufReader::new(file)).map_err(|e| CleanError::Model {
            operation: format!("load face detection model: {}", model_path.display()),
            source: e.to_string().into(),
        })?;
        Ok(Self { model })
    }
}

impl FaceDetector for SeetaFaceDetector {
    fn detect_faces(&self, img: &DynamicImage) -> Result<Vec<FaceRegion>> {
        let gray = img.to_luma8();

        // rustface detectors are stateful and not Sync; build one per call
        // from the shared model.
        let mut detector = rustface::create_detector_with_model(self.model.clone());
        detector.set_min_face_size(20);
        detector.set_score_thresh(2.0);
        detector.set_pyramid_scale_factor(0.8);
        detector.set_slide_window_step(4, 4);

        let faces = detector.detect(&ImageData::new(gray.as_raw(), gray.width(), gray.height()));

        Ok(faces
            .iter()
            .map(|face| {
                let bbox = face.bbox();
                FaceRegion {
                    x: bbox.x(),
                    y: bbox.y(),
                    width: bbox.width(),
                    height: bbox.height(),
                    confidence: face.score(),
                }
            })
            .collect())
    }
}

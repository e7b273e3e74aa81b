pub mod compose;
pub mod config;
pub mod destination;
pub mod enumerate;
pub mod errors;
pub mod face;
pub mod model;
pub mod pipeline;
pub mod segmentation;
pub mod traits;

pub mod mocks;

pub use config::Config;
pub use destination::{Confirm, PrepareAction, StdinConfirm};
pub use errors::{CleanError, Result};
pub use face::SeetaFaceDetector;
pub use model::{U2Net, U2NetSize};
pub use pipeline::{CleanSummary, ImageCleaner};
pub use segmentation::{BoundingBox, SegmentationMap};
pub use traits::*;

#[cfg(test)]
pub use mocks::*;

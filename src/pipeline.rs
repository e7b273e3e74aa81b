use std::path::{Path, PathBuf};

use image::{imageops, ImageFormat};
use indicatif::{ProgressBar, ProgressStyle};

use crate::compose::flatten_onto;
use crate::config::Config;
use crate::destination::{prepare_destination, Confirm};
use crate::enumerate::collect_files;
use crate::errors::{CleanError, Result};
use crate::traits::{FaceDetector, SegmentationModel};

/// Counts for one completed batch run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CleanSummary {
    pub total: usize,
    pub written: usize,
    pub skipped: usize,
}

enum FileOutcome {
    Written,
    Skipped,
}

/// Sequential cleaning pipeline over one source directory.
///
/// Per file: face filter, background removal, crop to the subject, optional
/// flattening, write. Generic over the collaborator models so runs can be
/// driven by test doubles.
pub struct ImageCleaner<D: FaceDetector, M: SegmentationModel> {
    detector: D,
    model: M,
    config: Config,
}

impl<D: FaceDetector, M: SegmentationModel> ImageCleaner<D, M> {
    pub const fn new(detector: D, model: M, config: Config) -> Self {
        Self {
            detector,
            model,
            config,
        }
    }

    /// Run the whole batch: prepare the destination, enumerate the source
    /// once, then process files one at a time.
    ///
    /// A face count other than one skips the file; any other per-file failure
    /// aborts the batch, leaving already-written artifacts in place.
    pub fn run(&self, confirm: &mut dyn Confirm) -> Result<CleanSummary> {
        let destination = self.config.destination_dir();
        prepare_destination(
            &destination,
            self.config.yes,
            confirm,
            self.config.clear_timeout(),
        )?;

        let files = collect_files(&self.config.dataset_source, &self.config.file_glob_patterns)?;
        if files.is_empty() {
            println!("No files matched the given patterns");
            return Ok(CleanSummary {
                total: 0,
                written: 0,
                skipped: 0,
            });
        }

        let pb = ProgressBar::new(files.len() as u64);
        pb.set_style(
            ProgressStyle::with_template(
                "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg} ({eta})",
            )
            .map_err(|e| CleanError::Configuration {
                message: format!("invalid progress template: {e}"),
            })?
            .progress_chars("#>-"),
        );

        let mut written = 0;
        let mut skipped = 0;
        for file in &files {
            let name = file
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            pb.set_message(format!("Processing {name}"));

            match self.process_file(file, &destination)? {
                FileOutcome::Written => written += 1,
                FileOutcome::Skipped => skipped += 1,
            }
            pb.inc(1);
        }
        pb.finish_with_message("done");

        Ok(CleanSummary {
            total: files.len(),
            written,
            skipped,
        })
    }

    fn process_file(&self, file: &Path, destination: &Path) -> Result<FileOutcome> {
        let img = image::open(file).map_err(|e| CleanError::ImageProcessing {
            path: file.display().to_string(),
            operation: "open image".to_string(),
            source: Box::new(e),
        })?;

        // Skip images that don't have a single face in them.
        let faces = self.detector.detect_faces(&img)?;
        if faces.len() != 1 {
            return Ok(FileOutcome::Skipped);
        }

        let map = self.model.segment(&img)?;
        let cutout = map.remove_background(&img)?;
        let bbox = map
            .bounding_box()
            .ok_or_else(|| CleanError::ImageProcessing {
                path: file.display().to_string(),
                operation: "crop to subject".to_string(),
                source: "segmentation map contains no foreground".to_string().into(),
            })?;
        let cropped =
            imageops::crop_imm(&cutout, bbox.left, bbox.top, bbox.width(), bbox.height())
                .to_image();

        let output_file = self.output_path(file, destination)?;
        let save_result = if self.config.remove_transparency {
            flatten_onto(&cropped, self.config.bg_colour).save_with_format(&output_file, ImageFormat::Png)
        } else {
            cropped.save_with_format(&output_file, ImageFormat::Png)
        };
        save_result.map_err(|e| CleanError::ImageProcessing {
            path: output_file.display().to_string(),
            operation: "save image".to_string(),
            source: Box::new(e),
        })?;

        Ok(FileOutcome::Written)
    }

    /// Destination filename: the source stem with a `.png` extension, in the
    /// destination root. The source tree structure is flattened; files with
    /// identical stems overwrite one another.
    fn output_path(&self, file: &Path, destination: &Path) -> Result<PathBuf> {
        let stem = file
            .file_stem()
            .and_then(|stem| stem.to_str())
            .ok_or_else(|| CleanError::Validation {
                field: "dataset_source".to_string(),
                reason: format!("'{}' has no usable file stem", file.display()),
            })?;
        Ok(destination.join(format!("{stem}.png")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mocks::{MockFaceDetector, MockSegmentationModel, UnreachableConfirm};
    use clap::Parser;
    use std::fs;
    use tempfile::TempDir;

    fn config_for(source: &Path) -> Config {
        let mut config = Config::try_parse_from(["costume-clean-rs", "dataset", "--yes"]).unwrap();
        config.dataset_source = source.to_path_buf();
        config
    }

    #[test]
    fn output_paths_are_flattened_to_the_stem() -> Result<()> {
        let temp_dir = TempDir::new().unwrap();
        let config = config_for(temp_dir.path());
        let cleaner = ImageCleaner::new(
            MockFaceDetector::new(1),
            MockSegmentationModel::new(0),
            config,
        );

        let out = cleaner.output_path(
            Path::new("source/nested/witch_costume.jpeg"),
            Path::new("dest"),
        )?;
        assert_eq!(out, Path::new("dest").join("witch_costume.png"));
        Ok(())
    }

    #[test]
    fn empty_source_completes_with_an_empty_summary() -> Result<()> {
        let temp_dir = TempDir::new().unwrap();
        let source = temp_dir.path().join("dataset");
        fs::create_dir_all(&source).unwrap();
        let config = config_for(&source);

        let cleaner = ImageCleaner::new(
            MockFaceDetector::new(1),
            MockSegmentationModel::new(0),
            config,
        );
        let summary = cleaner.run(&mut UnreachableConfirm)?;
        assert_eq!(
            summary,
            CleanSummary {
                total: 0,
                written: 0,
                skipped: 0
            }
        );
        Ok(())
    }
}

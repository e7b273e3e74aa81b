use anyhow::{ensure, Context, Result};
use clap::Parser;

use costume_clean_rs::face::SEETAFACE_MODEL_FILE;
use costume_clean_rs::{
    CleanError, Config, ImageCleaner, SeetaFaceDetector, StdinConfirm, U2Net,
};

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = Config::parse();
    config.validate()?;

    let u2net_path = config.model_dir.join(config.u2net_size.weights_file());
    ensure!(
        u2net_path.exists(),
        "Segmentation weights not found: {}",
        u2net_path.display()
    );
    let face_model_path = config.model_dir.join(SEETAFACE_MODEL_FILE);
    ensure!(
        face_model_path.exists(),
        "Face detection model not found: {}",
        face_model_path.display()
    );

    let detector = SeetaFaceDetector::load(&face_model_path)?;
    let model = U2Net::from_file(&u2net_path, config.device_id)
        .with_context(|| format!("Failed to load segmentation model: {}", u2net_path.display()))?;

    let cleaner = ImageCleaner::new(detector, model, config);
    match cleaner.run(&mut StdinConfirm) {
        Ok(summary) => {
            println!(
                "Cleaned {} of {} files ({} skipped)",
                summary.written, summary.total, summary.skipped
            );
            Ok(())
        }
        Err(CleanError::Aborted) => {
            eprintln!("Aborted.");
            std::process::exit(1);
        }
        Err(err) => Err(err.into()),
    }
}

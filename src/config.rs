use std::ffi::OsString;
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use clap::{ArgAction, Parser};
use image::Rgb;

use crate::enumerate::compile_patterns;
use crate::errors::{CleanError, Result};
use crate::model::U2NetSize;

#[derive(Parser, Clone, Debug)]
#[command(version, about = "Process and clean a raw dataset of costume photos", long_about = None)]
pub struct Config {
    /// Directory containing the source dataset.
    pub dataset_source: PathBuf,

    /// Directory the cleaned dataset is written to. Defaults to a
    /// '<source>_cleaned' sibling of the source directory.
    #[arg(short = 'd', long)]
    pub destination: Option<PathBuf>,

    /// Glob patterns used to find files in the source directory.
    #[arg(long, num_args = 1.., default_values_t = [
        String::from("*.png"),
        String::from("*.jpeg"),
        String::from("*.jpg"),
    ])]
    pub file_glob_patterns: Vec<String>,

    /// Keep transparency instead of flattening it onto a colour.
    #[arg(long = "no-remove-transparency", action = ArgAction::SetFalse)]
    pub remove_transparency: bool,

    /// The colour to replace transparency with.
    #[arg(long, default_value = "white", value_parser = parse_colour)]
    pub bg_colour: Rgb<u8>,

    /// The size of the pretrained U-2-net model.
    #[arg(long, value_enum, default_value_t = U2NetSize::Large)]
    pub u2net_size: U2NetSize,

    /// Directory holding the pretrained model files.
    #[arg(long, default_value = "models")]
    pub model_dir: PathBuf,

    /// GPU device to run inference on.
    #[arg(long, default_value_t = 0)]
    pub device_id: i32,

    /// Upper bound, in seconds, on the wait for destination deletion to
    /// become visible.
    #[arg(long, default_value_t = 10)]
    pub clear_timeout_secs: u64,

    /// Yes to all.
    #[arg(short = 'y', long)]
    pub yes: bool,
}

impl Config {
    /// Validate everything that can be checked before any processing starts.
    pub fn validate(&self) -> Result<()> {
        if !self.dataset_source.is_dir() {
            return Err(CleanError::Validation {
                field: "dataset_source".to_string(),
                reason: format!("'{}' is not a valid directory", self.dataset_source.display()),
            });
        }
        fs::read_dir(&self.dataset_source).map_err(|e| CleanError::Validation {
            field: "dataset_source".to_string(),
            reason: format!(
                "'{}' is not a readable directory: {e}",
                self.dataset_source.display()
            ),
        })?;
        compile_patterns(&self.file_glob_patterns)?;
        Ok(())
    }

    /// The resolved destination directory.
    pub fn destination_dir(&self) -> PathBuf {
        self.destination.clone().unwrap_or_else(|| {
            let name = self.dataset_source.file_name().map_or_else(
                || OsString::from("cleaned"),
                |stem| {
                    let mut name = stem.to_os_string();
                    name.push("_cleaned");
                    name
                },
            );
            self.dataset_source.with_file_name(name)
        })
    }

    pub const fn clear_timeout(&self) -> Duration {
        Duration::from_secs(self.clear_timeout_secs)
    }
}

/// Parse a background colour: a named colour or `#RGB`/`#RRGGBB` hex.
fn parse_colour(s: &str) -> std::result::Result<Rgb<u8>, String> {
    let lower = s.trim().to_ascii_lowercase();
    if let Some(named) = named_colour(&lower) {
        return Ok(named);
    }
    parse_hex_colour(&lower)
        .ok_or_else(|| format!("'{s}' is not a recognized colour name or hex value"))
}

fn named_colour(name: &str) -> Option<Rgb<u8>> {
    let rgb = match name {
        "white" => [255, 255, 255],
        "black" => [0, 0, 0],
        "red" => [255, 0, 0],
        "lime" => [0, 255, 0],
        "blue" => [0, 0, 255],
        "yellow" => [255, 255, 0],
        "cyan" | "aqua" => [0, 255, 255],
        "magenta" | "fuchsia" => [255, 0, 255],
        "silver" => [192, 192, 192],
        "gray" | "grey" => [128, 128, 128],
        "maroon" => [128, 0, 0],
        "olive" => [128, 128, 0],
        "green" => [0, 128, 0],
        "purple" => [128, 0, 128],
        "teal" => [0, 128, 128],
        "navy" => [0, 0, 128],
        _ => return None,
    };
    Some(Rgb(rgb))
}

fn parse_hex_colour(input: &str) -> Option<Rgb<u8>> {
    let hex = input.strip_prefix('#').unwrap_or(input);
    match hex.len() {
        3 => {
            let r = nibble(&hex[0..1])?;
            let g = nibble(&hex[1..2])?;
            let b = nibble(&hex[2..3])?;
            Some(Rgb([r, g, b]))
        }
        6 => {
            let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
            let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
            let b = u8::from_str_radix(&hex[4..6], 16).ok()?;
            Some(Rgb([r, g, b]))
        }
        _ => None,
    }
}

fn nibble(slice: &str) -> Option<u8> {
    let value = u8::from_str_radix(slice, 16).ok()?;
    Some(value << 4 | value)
}

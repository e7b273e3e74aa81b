use std::path::Path;

use clap::ValueEnum;
use image::{
    imageops, imageops::FilterType, DynamicImage, GenericImageView, ImageBuffer, Luma, Rgb,
    RgbImage,
};
use ndarray::prelude::*;
use nshare::AsNdarray3;
use ort::value::TensorRef;
use ort::{
    execution_providers::{CUDAExecutionProvider, TensorRTExecutionProvider},
    session::{builder::SessionBuilder, Session},
};
use parking_lot::Mutex;

use crate::errors::{CleanError, Result};
use crate::segmentation::SegmentationMap;
use crate::traits::SegmentationModel;

/// Pretrained U²-Net variant.
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum U2NetSize {
    Large,
    Small,
}

impl U2NetSize {
    /// ONNX weights file for this variant inside the model directory.
    pub const fn weights_file(self) -> &'static str {
        match self {
            Self::Large => "u2net.onnx",
            Self::Small => "u2netp.onnx",
        }
    }
}

/// U²-Net salient-object segmentation model running on ONNX Runtime.
pub struct U2Net {
    image_size: u32,
    input_name: String,
    output_name: String,
    session: Mutex<Session>,
}

impl U2Net {
    /// Fallback input size when the model declares dynamic spatial dimensions.
    const DEFAULT_INPUT_SIZE: u32 = 320;

    /// Load the selected pretrained variant from `model_dir`.
    pub fn load(model_dir: &Path, size: U2NetSize, device_id: i32) -> Result<Self> {
        Self::from_file(&model_dir.join(size.weights_file()), device_id)
    }

    pub fn from_file(model_path: &Path, device_id: i32) -> Result<Self> {
        let mut session = SessionBuilder::new()
            .map_err(|e| CleanError::Model {
                operation: "initialize session builder".to_string(),
                source: Box::new(e),
            })?
            .with_execution_providers([
                TensorRTExecutionProvider::default()
                    .with_device_id(device_id)
                    .build(),
                CUDAExecutionProvider::default()
                    .with_device_id(device_id)
                    .build(),
            ])
            .map_err(|e| CleanError::Model {
                operation: "configure execution providers".to_string(),
                source: Box::new(e),
            })?
            .with_memory_pattern(true)
            .map_err(|e| CleanError::Model {
                operation: "configure memory pattern".to_string(),
                source: Box::new(e),
            })?
            .commit_from_file(model_path)
            .map_err(|e| CleanError::Model {
                operation: format!("load model file: {}", model_path.display()),
                source: Box::new(e),
            })?;

        let image_size = match session.inputs[0].input_type.tensor_shape() {
            Some(shape) if shape.len() >= 3 && shape[2] > 0 => shape[2] as u32,
            _ => Self::DEFAULT_INPUT_SIZE,
        };
        let input_name = session.inputs[0].name.clone();
        let output_name = session.outputs[0].name.clone();

        // warm-up inference
        let data = Array4::<f32>::zeros((1, 3, image_size as usize, image_size as usize));
        session
            .run(ort::inputs![input_name.as_str() => TensorRef::from_array_view(&data)
                .map_err(|e| CleanError::Model {
                    operation: "create warm-up tensor".to_string(),
                    source: Box::new(e),
                })?])
            .map_err(|e| CleanError::Model {
                operation: "run warm-up inference".to_string(),
                source: Box::new(e),
            })?;

        Ok(Self {
            image_size,
            input_name,
            output_name,
            session: Mutex::new(session),
        })
    }

    pub const fn image_size(&self) -> u32 {
        self.image_size
    }

    pub fn predict(&self, tensor: ArrayView4<f32>) -> Result<Array4<f32>> {
        let mut session = self.session.lock();
        let outputs = session.run(
            ort::inputs![self.input_name.as_str() => TensorRef::from_array_view(&tensor.as_standard_layout())?],
        )?;
        Ok(outputs[self.output_name.as_str()]
            .try_extract_array::<f32>()?
            .into_dimensionality::<Ix4>()?
            .to_owned())
    }
}

impl SegmentationModel for U2Net {
    fn segment(&self, img: &DynamicImage) -> Result<SegmentationMap> {
        let rgb = img.to_rgb8();
        let (width, height) = rgb.dimensions();

        let (tensor, content) = preprocess(&rgb, self.image_size);
        let mask = self.predict(tensor.view())?;
        postprocess_mask(mask, self.image_size, content, width, height)
    }
}

/// Resize to fit the model's square input, pad the remainder with black and
/// normalize to a `1x3xSxS` float tensor.
///
/// Returns the tensor and the content rectangle `[x, y, w, h]` occupied by
/// the image inside the padded square.
fn preprocess(image: &RgbImage, image_size: u32) -> (Array4<f32>, [u32; 4]) {
    let (width, height) = image.dimensions();
    let scale = f64::from(image_size) / f64::from(width.max(height).max(1));
    let scaled_w = ((f64::from(width) * scale).round() as u32).clamp(1, image_size);
    let scaled_h = ((f64::from(height) * scale).round() as u32).clamp(1, image_size);

    let resized = imageops::resize(image, scaled_w, scaled_h, FilterType::Lanczos3);
    let mut canvas: RgbImage = ImageBuffer::from_pixel(image_size, image_size, Rgb([0, 0, 0]));
    imageops::overlay(&mut canvas, &resized, 0, 0);

    let tensor = canvas
        .as_ndarray3()
        .slice_move(s![NewAxis, .., .., ..])
        .map(|v| f32::from(*v) / 255.0);

    (tensor, [0, 0, scaled_w, scaled_h])
}

/// Crop the padding back out of the raw mask and resize it to the source
/// image's dimensions.
fn postprocess_mask(
    mask: Array4<f32>,
    image_size: u32,
    content: [u32; 4],
    width: u32,
    height: u32,
) -> Result<SegmentationMap> {
    let [x, y, w, h] = content;
    let (raw, _) = mask.into_raw_vec_and_offset();
    let mask: ImageBuffer<Luma<f32>, Vec<f32>> =
        ImageBuffer::from_raw(image_size, image_size, raw).ok_or_else(|| CleanError::Model {
            operation: "reshape mask tensor".to_string(),
            source: "mask tensor does not match the model's spatial dimensions"
                .to_string()
                .into(),
        })?;
    let mask = mask.view(x, y, w, h).to_image();
    let mask = imageops::resize(&mask, width, height, FilterType::Lanczos3);
    Ok(SegmentationMap::new(mask))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn weights_files_per_variant() {
        assert_eq!(U2NetSize::Large.weights_file(), "u2net.onnx");
        assert_eq!(U2NetSize::Small.weights_file(), "u2netp.onnx");
    }

    #[test]
    fn preprocess_produces_a_normalized_square_tensor() {
        let image = RgbImage::from_pixel(64, 32, Rgb([255, 0, 0]));
        let (tensor, [x, y, w, h]) = preprocess(&image, 320);

        assert_eq!(tensor.shape(), &[1, 3, 320, 320]);
        assert_eq!((x, y), (0, 0));
        assert_eq!((w, h), (320, 160));
        // red channel of a content pixel is full scale, padding stays zero
        assert!(tensor[[0, 0, 0, 0]] > 0.99);
        assert!(tensor[[0, 0, 319, 319]].abs() < f32::EPSILON);
    }

    #[test]
    fn postprocess_restores_source_dimensions() -> Result<()> {
        let mask = Array4::<f32>::ones((1, 1, 320, 320));
        let map = postprocess_mask(mask, 320, [0, 0, 320, 160], 64, 32)?;
        assert_eq!(map.dimensions(), (64, 32));
        Ok(())
    }

    #[test]
    fn preprocess_keeps_aspect_ratio_for_tall_images() {
        let image = RgbImage::new(10, 40);
        let (_, [_, _, w, h]) = preprocess(&image, 320);
        assert_eq!((w, h), (80, 320));
    }
}

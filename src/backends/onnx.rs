//! ONNX Runtime segmentation backend
//!
//! Runs an ISNet/U2Net-style salient object model: the image is letterboxed
//! into the model's square input, inference yields a single-channel mask, and
//! the mask is mapped back to original coordinates and applied as alpha.

use crate::error::{RemovalError, Result};
use crate::segmentation::SegmentationModel;
use image::{DynamicImage, ImageBuffer, RgbaImage};
use ndarray::Array4;
use ort::session::{builder::GraphOptimizationLevel, Session};
use ort::value::Value;
use parking_lot::Mutex;
use std::path::Path;

/// Square input edge used when the model does not declare a static shape
const DEFAULT_TARGET_SIZE: u32 = 1024;

/// ImageNet normalization constants used by the supported model family
const NORM_MEAN: [f32; 3] = [0.485, 0.456, 0.406];
const NORM_STD: [f32; 3] = [0.229, 0.224, 0.225];

/// Letterbox parameters needed to map mask coordinates back to the original
#[derive(Debug, Clone, Copy)]
struct Letterbox {
    scale: f32,
    offset_x: u32,
    offset_y: u32,
    target_size: u32,
}

/// Segmentation model backed by an ONNX Runtime session
pub struct OnnxSegmenter {
    // ort sessions take &mut self to run; the pool may call concurrently
    session: Mutex<Session>,
    target_size: u32,
    name: String,
}

impl OnnxSegmenter {
    /// Load a model from an ONNX file on disk
    ///
    /// # Errors
    ///
    /// Returns `RemovalError::Processing` when the session cannot be built or
    /// the model file cannot be read.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let load_start = std::time::Instant::now();

        let session = Session::builder()
            .map_err(|e| RemovalError::processing(format!("failed to create session builder: {e}")))?
            .with_optimization_level(GraphOptimizationLevel::Level3)
            .map_err(|e| RemovalError::processing(format!("failed to set optimization level: {e}")))?
            .commit_from_file(path)
            .map_err(|e| {
                RemovalError::processing(format!(
                    "failed to load model '{}': {e}",
                    path.display()
                ))
            })?;

        let name = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("onnx")
            .to_string();

        tracing::info!(
            model = %name,
            elapsed_ms = load_start.elapsed().as_millis() as u64,
            "ONNX model loaded"
        );

        Ok(Self {
            session: Mutex::new(session),
            target_size: DEFAULT_TARGET_SIZE,
            name,
        })
    }

    /// Override the square input edge the image is letterboxed into
    #[must_use]
    pub fn with_target_size(mut self, target_size: u32) -> Self {
        self.target_size = target_size;
        self
    }

    /// Letterbox the image into a normalized NCHW tensor
    fn preprocess(&self, image: &DynamicImage) -> (Array4<f32>, Letterbox) {
        let rgb = image.to_rgb8();
        let (orig_width, orig_height) = rgb.dimensions();
        let target = self.target_size;
        let target_f32 = target as f32;

        let scale = (target_f32 / orig_width as f32).min(target_f32 / orig_height as f32);
        let new_width = ((orig_width as f32) * scale).round() as u32;
        let new_height = ((orig_height as f32) * scale).round() as u32;

        let resized = image::imageops::resize(
            &rgb,
            new_width.max(1),
            new_height.max(1),
            image::imageops::FilterType::Triangle,
        );

        let offset_x = (target - new_width.min(target)) / 2;
        let offset_y = (target - new_height.min(target)) / 2;

        let mut tensor = Array4::<f32>::zeros((1, 3, target as usize, target as usize));
        for (x, y, pixel) in resized.enumerate_pixels() {
            let tx = (x + offset_x).min(target - 1) as usize;
            let ty = (y + offset_y).min(target - 1) as usize;
            for c in 0..3 {
                let value = f32::from(pixel[c]) / 255.0;
                tensor[[0, c, ty, tx]] = (value - NORM_MEAN[c]) / NORM_STD[c];
            }
        }

        (
            tensor,
            Letterbox {
                scale,
                offset_x,
                offset_y,
                target_size: target,
            },
        )
    }

    /// Run the session over a preprocessed tensor
    fn infer(&self, input: Array4<f32>) -> Result<Array4<f32>> {
        let input_value = Value::from_array(input)
            .map_err(|e| RemovalError::processing(format!("failed to convert input tensor: {e}")))?;

        let mut session = self.session.lock();
        let outputs = session
            .run(ort::inputs![input_value])
            .map_err(|e| RemovalError::processing(format!("ONNX inference failed: {e}")))?;

        // Positional access: the supported model family has a single mask output
        let keys: Vec<_> = outputs.keys().collect();
        let first_key = keys
            .first()
            .ok_or_else(|| RemovalError::processing("model produced no output tensors"))?;
        let output = outputs
            .get(first_key)
            .ok_or_else(|| RemovalError::processing("first output tensor not found"))?
            .try_extract_array::<f32>()
            .map_err(|e| RemovalError::processing(format!("failed to extract output tensor: {e}")))?;

        let shape = output.shape();
        if shape.len() != 4 {
            return Err(RemovalError::processing(format!(
                "expected 4D output tensor, got {}D",
                shape.len()
            )));
        }
        let dims = (shape[0], shape[1], shape[2], shape[3]);
        let data = output.view().to_owned().into_raw_vec_and_offset().0;
        Array4::from_shape_vec(dims, data)
            .map_err(|e| RemovalError::processing(format!("failed to reshape output tensor: {e}")))
    }

    /// Map the mask tensor back to original coordinates and apply it as alpha
    fn apply_mask(
        image: &DynamicImage,
        mask: &Array4<f32>,
        letterbox: Letterbox,
    ) -> RgbaImage {
        let rgba = image.to_rgba8();
        let (width, height) = rgba.dimensions();
        let mask_height = mask.shape()[2] as u32;
        let mask_width = mask.shape()[3] as u32;
        // Tensor coordinates are relative to the letterboxed canvas; rescale
        // when the mask resolution differs from the input resolution.
        let mask_scale = mask_width as f32 / letterbox.target_size as f32;

        let mut result = ImageBuffer::new(width, height);
        for (x, y, pixel) in rgba.enumerate_pixels() {
            let tx = (((x as f32 * letterbox.scale).round() as u32 + letterbox.offset_x) as f32
                * mask_scale)
                .round() as u32;
            let ty = (((y as f32 * letterbox.scale).round() as u32 + letterbox.offset_y) as f32
                * mask_scale)
                .round() as u32;

            let value = if tx < mask_width && ty < mask_height {
                mask.get([0, 0, ty as usize, tx as usize])
                    .copied()
                    .unwrap_or(0.0)
            } else {
                0.0
            };
            let alpha = (value.clamp(0.0, 1.0) * 255.0) as u8;
            result.put_pixel(x, y, image::Rgba([pixel[0], pixel[1], pixel[2], alpha]));
        }
        result
    }
}

impl SegmentationModel for OnnxSegmenter {
    fn segment(&self, image: &DynamicImage) -> Result<RgbaImage> {
        let inference_start = std::time::Instant::now();
        let (tensor, letterbox) = self.preprocess(image);
        let mask = self.infer(tensor)?;
        let result = Self::apply_mask(image, &mask, letterbox);
        tracing::debug!(
            model = %self.name,
            elapsed_ms = inference_start.elapsed().as_millis() as u64,
            "segmentation complete"
        );
        Ok(result)
    }

    fn name(&self) -> &str {
        &self.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_apply_mask_full_foreground() {
        let image = DynamicImage::ImageRgba8(RgbaImage::from_pixel(
            4,
            4,
            image::Rgba([50, 60, 70, 255]),
        ));
        let mask = Array4::from_elem((1, 1, 8, 8), 1.0f32);
        let letterbox = Letterbox {
            scale: 2.0,
            offset_x: 0,
            offset_y: 0,
            target_size: 8,
        };
        let out = OnnxSegmenter::apply_mask(&image, &mask, letterbox);
        assert!(out.pixels().all(|p| p[3] == 255));
    }

    #[test]
    fn test_apply_mask_background_is_transparent() {
        let image = DynamicImage::ImageRgba8(RgbaImage::from_pixel(
            4,
            4,
            image::Rgba([50, 60, 70, 255]),
        ));
        let mask = Array4::from_elem((1, 1, 8, 8), 0.0f32);
        let letterbox = Letterbox {
            scale: 2.0,
            offset_x: 0,
            offset_y: 0,
            target_size: 8,
        };
        let out = OnnxSegmenter::apply_mask(&image, &mask, letterbox);
        assert!(out.pixels().all(|p| p[3] == 0));
    }
}

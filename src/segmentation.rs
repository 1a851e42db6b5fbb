//! Segmentation adapter: decode bytes, run the model, return the foreground

use crate::error::{RemovalError, Result};
use image::{DynamicImage, RgbaImage};

/// Capability interface for the foreground-extraction model
///
/// Implementations take a decoded image and return it with an alpha channel
/// isolating the foreground. Calls are synchronous and CPU-bound; they must
/// only run on the worker pool, never on the request-accepting task.
pub trait SegmentationModel: Send + Sync {
    /// Produce the foreground of `image` with background pixels transparent
    ///
    /// # Errors
    ///
    /// Returns `RemovalError::Processing` on inference failure. Failures are
    /// never retried here; transient and permanent model failures are not
    /// distinguished by this layer.
    fn segment(&self, image: &DynamicImage) -> Result<RgbaImage>;

    /// Identifier used in logs
    fn name(&self) -> &str;
}

/// Decode raw image bytes and run the model over them
///
/// # Errors
///
/// Corrupt or undecodable input surfaces as `RemovalError::Processing` with
/// the underlying cause attached.
pub fn remove_background(model: &dyn SegmentationModel, bytes: &[u8]) -> Result<RgbaImage> {
    let image = image::load_from_memory(bytes)
        .map_err(|e| RemovalError::processing(format!("failed to decode image: {e}")))?;
    tracing::debug!(
        model = model.name(),
        width = image.width(),
        height = image.height(),
        "running segmentation"
    );
    model.segment(&image)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::MockSegmenter;

    #[test]
    fn test_remove_background_decodes_and_segments() {
        let model = MockSegmenter::new();
        let image = image::RgbaImage::from_pixel(4, 4, image::Rgba([10, 20, 30, 255]));
        let mut png = Vec::new();
        image::DynamicImage::ImageRgba8(image)
            .write_to(&mut std::io::Cursor::new(&mut png), image::ImageFormat::Png)
            .unwrap();

        let out = remove_background(&model, &png).unwrap();
        assert_eq!(out.dimensions(), (4, 4));
        assert_eq!(model.call_count(), 1);
    }

    #[test]
    fn test_corrupt_bytes_surface_as_processing_error() {
        let model = MockSegmenter::new();
        let err = remove_background(&model, b"not an image").unwrap_err();
        assert!(matches!(err, RemovalError::Processing(_)));
        // The model is never reached when decoding fails
        assert_eq!(model.call_count(), 0);
    }
}

//! Stub segmentation model for tests and model-less deployments

use crate::error::{RemovalError, Result};
use crate::segmentation::SegmentationModel;
use image::{DynamicImage, RgbaImage};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

/// Deterministic stand-in for a real segmentation model
///
/// Returns the input converted to RGBA with full opacity, so output pixel
/// data is stable across runs. Tracks how often it was invoked, which lets
/// tests assert that rejected uploads never reach the model.
#[derive(Debug, Default)]
pub struct MockSegmenter {
    calls: AtomicUsize,
    fail: AtomicBool,
}

impl MockSegmenter {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent `segment` call fail, to exercise error paths
    pub fn fail_next_calls(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    /// How many times `segment` has been invoked
    #[must_use]
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl SegmentationModel for MockSegmenter {
    fn segment(&self, image: &DynamicImage) -> Result<RgbaImage> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail.load(Ordering::SeqCst) {
            return Err(RemovalError::processing("mock model failure"));
        }
        Ok(image.to_rgba8())
    }

    fn name(&self) -> &str {
        "mock"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mock_counts_calls() {
        let model = MockSegmenter::new();
        let image = DynamicImage::ImageRgba8(RgbaImage::new(2, 2));
        assert_eq!(model.call_count(), 0);
        model.segment(&image).unwrap();
        model.segment(&image).unwrap();
        assert_eq!(model.call_count(), 2);
    }

    #[test]
    fn test_mock_failure_mode() {
        let model = MockSegmenter::new();
        model.fail_next_calls(true);
        let image = DynamicImage::ImageRgba8(RgbaImage::new(2, 2));
        assert!(model.segment(&image).is_err());
        assert_eq!(model.call_count(), 1);
    }

    #[test]
    fn test_mock_output_is_opaque_rgba() {
        let model = MockSegmenter::new();
        let image = DynamicImage::ImageRgba8(RgbaImage::from_pixel(
            3,
            3,
            image::Rgba([1, 2, 3, 255]),
        ));
        let out = model.segment(&image).unwrap();
        assert!(out.pixels().all(|p| p[3] == 255));
    }
}

//! Segmentation model implementations

mod mock;
#[cfg(feature = "onnx")]
mod onnx;

pub use mock::MockSegmenter;
#[cfg(feature = "onnx")]
pub use onnx::OnnxSegmenter;

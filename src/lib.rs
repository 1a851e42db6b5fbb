#![allow(clippy::missing_errors_doc)]
#![allow(clippy::uninlined_format_args)]

//! # Background Removal Service
//!
//! An HTTP service that removes the background from uploaded images using a
//! pretrained segmentation model and returns the result either as a raw
//! binary stream or as a JSON document carrying a Base64 payload plus
//! processing metrics.
//!
//! The core is the request-processing pipeline: upload validation, off-load
//! of the CPU-bound segmentation and encoding work onto a fixed worker pool,
//! output codec selection (lossless PNG or quality-configurable WebP), and
//! result metrics (timing, sizes, compression ratio).
//!
//! ## Endpoints
//!
//! - `GET /health` — liveness descriptor with the build version
//! - `POST /remove-background` — multipart upload, binary image response
//! - `POST /remove-background-base64` — same inputs, structured JSON response
//!
//! ## Library usage
//!
//! The pipeline works without the HTTP layer:
//!
//! ```rust,no_run
//! use bgremove_service::{remove_background_from_bytes, MockSegmenter, OutputFormat};
//! use std::sync::Arc;
//!
//! # async fn example(upload: Vec<u8>) -> anyhow::Result<()> {
//! let model = Arc::new(MockSegmenter::new());
//! let result = remove_background_from_bytes(model, &upload, OutputFormat::Png, 95).await?;
//! std::fs::write("output.png", &result.bytes)?;
//! # Ok(())
//! # }
//! ```
//!
//! The segmentation model is a capability (`SegmentationModel`), so the ONNX
//! backend can be swapped for a stub in tests without touching the pipeline.

pub mod backends;
pub mod config;
pub mod encode;
pub mod error;
pub mod pipeline;
pub mod segmentation;
pub mod server;
pub mod types;
pub mod validation;
pub mod workers;

#[cfg(feature = "onnx")]
pub use backends::OnnxSegmenter;
pub use backends::MockSegmenter;
pub use config::{OutputFormat, ServiceConfig, ServiceConfigBuilder, MAX_UPLOAD_BYTES};
pub use encode::{DEFAULT_QUALITY, QUALITY_MAX, QUALITY_MIN};
pub use error::{RemovalError, Result};
pub use pipeline::RemovalPipeline;
pub use segmentation::SegmentationModel;
pub use server::{router, serve, AppState};
pub use types::{
    HealthStatus, ProcessingRequest, ProcessingResult, RemovalResponse, UploadedAsset,
};
pub use workers::WorkerPool;

use bytes::Bytes;
use std::sync::Arc;

/// Remove the background from raw image bytes
///
/// One-shot convenience over [`RemovalPipeline`]: spins up a single-use
/// worker pool, runs the bytes through the full pipeline, and returns the
/// encoded result with its metrics. Servers should build a long-lived
/// [`RemovalPipeline`] instead.
///
/// # Errors
///
/// Propagates validation, segmentation, and encoding failures.
pub async fn remove_background_from_bytes(
    model: Arc<dyn SegmentationModel>,
    image_bytes: &[u8],
    format: OutputFormat,
    quality: u8,
) -> Result<ProcessingResult> {
    let pool = Arc::new(WorkerPool::new(1));
    let pipeline = RemovalPipeline::new(model, Arc::clone(&pool), MAX_UPLOAD_BYTES);
    // No declared filename here; sniff the content type for the validator.
    let content_type = image::guess_format(image_bytes)
        .ok()
        .map(|f| f.to_mime_type().to_string());
    let request = ProcessingRequest {
        asset: UploadedAsset::new(Bytes::copy_from_slice(image_bytes), content_type, None),
        format,
        quality,
    };
    let result = pipeline.process(request).await;
    pool.shutdown();
    result
}

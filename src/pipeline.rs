//! The composed request-processing pipeline
//!
//! Validator → worker-pool offload (segmentation adapter + codec) → metrics.
//! The pipeline is composed once and shared; the two response shapes attach
//! at the handler boundary instead of branching in here.

use crate::config::OutputFormat;
use crate::encode;
use crate::error::Result;
use crate::segmentation::{self, SegmentationModel};
use crate::types::{compression_ratio, ProcessingRequest, ProcessingResult};
use crate::validation::validate_upload;
use crate::workers::WorkerPool;
use std::sync::Arc;
use std::time::Instant;
use tracing::instrument;

/// Shared pipeline handle: one model, one pool, one upload ceiling
pub struct RemovalPipeline {
    model: Arc<dyn SegmentationModel>,
    pool: Arc<WorkerPool>,
    max_upload_bytes: usize,
}

impl RemovalPipeline {
    /// Compose the pipeline over an explicit model and worker pool
    #[must_use]
    pub fn new(
        model: Arc<dyn SegmentationModel>,
        pool: Arc<WorkerPool>,
        max_upload_bytes: usize,
    ) -> Self {
        Self {
            model,
            pool,
            max_upload_bytes,
        }
    }

    /// The worker pool backing this pipeline
    #[must_use]
    pub fn pool(&self) -> &Arc<WorkerPool> {
        &self.pool
    }

    /// Run one request end to end and compute its metrics
    ///
    /// Validation and the quality range check run on the calling task;
    /// everything CPU-bound happens inside a single worker-pool submission,
    /// which is also the request's only suspension point.
    ///
    /// # Errors
    ///
    /// Propagates the validator, adapter, and codec taxonomy unchanged; no
    /// failure is retried.
    #[instrument(
        skip(self, request),
        fields(
            filename = request.asset.filename.as_deref().unwrap_or("image"),
            format = %request.format,
            size = request.asset.len()
        )
    )]
    pub async fn process(&self, request: ProcessingRequest) -> Result<ProcessingResult> {
        validate_upload(&request.asset, self.max_upload_bytes)?;
        encode::validate_quality(request.format, request.quality)?;

        let model = Arc::clone(&self.model);
        let bytes = request.asset.bytes.clone();
        let format = request.format;
        let quality = request.quality;
        let original_size = bytes.len();

        let start = Instant::now();
        let output = self
            .pool
            .submit(move || -> Result<Vec<u8>> {
                let foreground = segmentation::remove_background(model.as_ref(), &bytes)?;
                encode::encode_image(&foreground, format, quality)
            })
            .await??;
        let elapsed = start.elapsed();

        let output_size = output.len();
        let ratio = compression_ratio(original_size, output_size);
        tracing::info!(
            elapsed_ms = elapsed.as_millis() as u64,
            original_size,
            output_size,
            compression_ratio = ratio,
            "background removal complete"
        );

        Ok(ProcessingResult {
            bytes: output,
            format,
            original_size,
            output_size,
            elapsed,
            compression_ratio: ratio,
        })
    }
}

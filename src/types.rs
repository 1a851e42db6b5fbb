//! Request and result types for the processing pipeline

use crate::config::OutputFormat;
use bytes::Bytes;
use serde::Serialize;
use std::time::Duration;

/// An uploaded image as received from the client
///
/// Owned exclusively by the request's processing lifetime and discarded once
/// the response is produced.
#[derive(Debug, Clone)]
pub struct UploadedAsset {
    /// Raw byte payload
    pub bytes: Bytes,
    /// Declared content type, if the client sent one
    pub content_type: Option<String>,
    /// Declared filename, if the client sent one
    pub filename: Option<String>,
}

impl UploadedAsset {
    /// Create an asset from its raw parts
    #[must_use]
    pub fn new(bytes: Bytes, content_type: Option<String>, filename: Option<String>) -> Self {
        Self {
            bytes,
            content_type,
            filename,
        }
    }

    /// Byte length of the payload
    #[must_use]
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Lowercased filename extension, when a filename with one was declared
    #[must_use]
    pub fn extension(&self) -> Option<String> {
        let filename = self.filename.as_deref()?;
        let (_, ext) = filename.rsplit_once('.')?;
        if ext.is_empty() {
            return None;
        }
        Some(ext.to_ascii_lowercase())
    }
}

/// A validated unit of work for the pipeline
#[derive(Debug, Clone)]
pub struct ProcessingRequest {
    /// The uploaded image
    pub asset: UploadedAsset,
    /// Requested output format
    pub format: OutputFormat,
    /// Requested quality (1-100), meaningful only for lossy formats
    pub quality: u8,
}

/// The outcome of one pipeline run
///
/// Created once by the codec stage and consumed exactly once by a response
/// composer.
#[derive(Debug)]
pub struct ProcessingResult {
    /// Encoded output payload
    pub bytes: Vec<u8>,
    /// Format the payload was encoded in
    pub format: OutputFormat,
    /// Exact byte length of the uploaded asset
    pub original_size: usize,
    /// Byte length of the output payload
    pub output_size: usize,
    /// Wall-clock span covering segmentation and encoding
    pub elapsed: Duration,
    /// Percentage size reduction from input to output, two decimal places
    pub compression_ratio: f64,
}

/// Percentage reduction from `original_size` to `output_size`
///
/// Negative when the output is larger than the input; the value is reported
/// as computed, never clamped.
#[must_use]
pub fn compression_ratio(original_size: usize, output_size: usize) -> f64 {
    let ratio = (1.0 - output_size as f64 / original_size as f64) * 100.0;
    (ratio * 100.0).round() / 100.0
}

/// Payload for `GET /health`
///
/// Constructed fresh per query; carries no internal state.
#[derive(Debug, Clone, Serialize)]
pub struct HealthStatus {
    pub status: String,
    pub message: String,
    pub version: String,
}

impl HealthStatus {
    /// Current liveness descriptor for this build
    #[must_use]
    pub fn current() -> Self {
        Self {
            status: "healthy".to_string(),
            message: "ready to process images".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

/// Structured JSON success body for the Base64 endpoint
#[derive(Debug, Clone, Serialize)]
pub struct RemovalResponse {
    pub success: bool,
    pub message: String,
    pub base64_image: String,
    pub processing_time: f64,
    pub output_format: String,
    pub original_size: usize,
    pub output_size: usize,
    pub compression_ratio: f64,
}

/// Structured JSON error body, shared by both endpoints
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub message: String,
}

impl ErrorResponse {
    #[must_use]
    pub fn new<S: Into<String>>(message: S) -> Self {
        Self {
            success: false,
            message: message.into(),
        }
    }
}

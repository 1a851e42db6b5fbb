//! Configuration types for the background removal service

use crate::error::{RemovalError, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Maximum accepted upload size in bytes (20 MB)
pub const MAX_UPLOAD_BYTES: usize = 20 * 1024 * 1024;

/// Number of worker threads in the reference deployment
pub const DEFAULT_WORKER_THREADS: usize = 4;

/// Output image format options
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OutputFormat {
    /// PNG with alpha channel transparency (lossless, quality has no effect)
    Png,
    /// WebP with alpha channel transparency (lossy, quality 1-100)
    WebP,
}

impl OutputFormat {
    /// Parse a requested output format, case-insensitively
    ///
    /// # Errors
    ///
    /// Returns `RemovalError::InvalidParameter` for anything other than
    /// `PNG` or `WEBP`.
    pub fn parse(value: &str) -> Result<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "png" => Ok(Self::Png),
            "webp" => Ok(Self::WebP),
            other => Err(RemovalError::invalid_parameter(format!(
                "output_format must be PNG or WEBP, got {other:?}"
            ))),
        }
    }

    /// MIME type for HTTP responses carrying this format
    #[must_use]
    pub fn media_type(self) -> &'static str {
        match self {
            Self::Png => "image/png",
            Self::WebP => "image/webp",
        }
    }

    /// File extension (without the dot)
    #[must_use]
    pub fn extension(self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::WebP => "webp",
        }
    }

    /// Whether the encoder honors a quality parameter
    #[must_use]
    pub fn is_lossy(self) -> bool {
        matches!(self, Self::WebP)
    }
}

impl Default for OutputFormat {
    fn default() -> Self {
        Self::Png
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.extension())
    }
}

/// Service configuration assembled at startup
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// Address to bind the HTTP listener to
    pub host: String,
    /// Port to bind the HTTP listener to
    pub port: u16,
    /// Fixed size of the CPU worker pool
    pub worker_threads: usize,
    /// Upload size ceiling enforced by the validator
    pub max_upload_bytes: usize,
    /// Path to an ONNX segmentation model; `None` runs the stub model
    pub model_path: Option<PathBuf>,
}

impl ServiceConfig {
    /// Create a new service configuration builder
    #[must_use]
    pub fn builder() -> ServiceConfigBuilder {
        ServiceConfigBuilder::new()
    }
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
            worker_threads: DEFAULT_WORKER_THREADS,
            max_upload_bytes: MAX_UPLOAD_BYTES,
            model_path: None,
        }
    }
}

/// Builder for `ServiceConfig`
pub struct ServiceConfigBuilder {
    config: ServiceConfig,
}

impl ServiceConfigBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self {
            config: ServiceConfig::default(),
        }
    }

    #[must_use]
    pub fn host<S: Into<String>>(mut self, host: S) -> Self {
        self.config.host = host.into();
        self
    }

    #[must_use]
    pub fn port(mut self, port: u16) -> Self {
        self.config.port = port;
        self
    }

    #[must_use]
    pub fn worker_threads(mut self, threads: usize) -> Self {
        self.config.worker_threads = threads;
        self
    }

    #[must_use]
    pub fn max_upload_bytes(mut self, bytes: usize) -> Self {
        self.config.max_upload_bytes = bytes;
        self
    }

    #[must_use]
    pub fn model_path(mut self, path: Option<PathBuf>) -> Self {
        self.config.model_path = path;
        self
    }

    /// Build the service configuration
    ///
    /// # Errors
    ///
    /// Returns `RemovalError::InvalidParameter` for a zero-sized worker pool
    /// or a zero upload ceiling.
    pub fn build(self) -> Result<ServiceConfig> {
        if self.config.worker_threads == 0 {
            return Err(RemovalError::invalid_parameter(
                "worker pool must have at least one thread",
            ));
        }
        if self.config.max_upload_bytes == 0 {
            return Err(RemovalError::invalid_parameter(
                "upload size ceiling must be non-zero",
            ));
        }
        Ok(self.config)
    }
}

impl Default for ServiceConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

//! Error types for background removal operations

use thiserror::Error;

/// Result type alias for background removal operations
pub type Result<T> = std::result::Result<T, RemovalError>;

/// Error taxonomy for the request-processing pipeline
#[derive(Error, Debug)]
pub enum RemovalError {
    /// Input/output errors (socket failures, interrupted reads, etc.)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Image decode or pixel manipulation errors from the image crate
    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    /// Uploaded asset's extension or content type is outside the accepted set
    #[error("Unsupported media type: {0}")]
    UnsupportedMediaType(String),

    /// Uploaded asset exceeds the configured size ceiling
    #[error("Payload too large: {size} bytes exceeds the {limit} byte limit")]
    PayloadTooLarge { size: usize, limit: usize },

    /// Malformed or out-of-range request parameter
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// Decode or model failure during segmentation
    #[error("Processing error: {0}")]
    Processing(String),

    /// Codec failure while producing the output payload
    #[error("Encoding error: {0}")]
    Encoding(String),
}

impl RemovalError {
    /// Create a new unsupported media type error
    pub fn unsupported_media_type<S: Into<String>>(media_type: S) -> Self {
        Self::UnsupportedMediaType(media_type.into())
    }

    /// Create a new invalid parameter error
    pub fn invalid_parameter<S: Into<String>>(msg: S) -> Self {
        Self::InvalidParameter(msg.into())
    }

    /// Create a new processing error
    pub fn processing<S: Into<String>>(msg: S) -> Self {
        Self::Processing(msg.into())
    }

    /// Create a new encoding error
    pub fn encoding<S: Into<String>>(msg: S) -> Self {
        Self::Encoding(msg.into())
    }

    /// Whether the failure was caused by the caller's input rather than the service
    #[must_use]
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::UnsupportedMediaType(_)
                | Self::PayloadTooLarge { .. }
                | Self::InvalidParameter(_)
        )
    }
}

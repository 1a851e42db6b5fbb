//! Output codec selection and parameterization

use crate::config::OutputFormat;
use crate::error::{RemovalError, Result};
use image::codecs::png::PngEncoder;
use image::{ExtendedColorType, ImageEncoder, RgbaImage};

/// Smallest accepted quality value for lossy output
pub const QUALITY_MIN: u8 = 1;
/// Largest accepted quality value for lossy output
pub const QUALITY_MAX: u8 = 100;
/// Quality used when the caller does not request one
pub const DEFAULT_QUALITY: u8 = 95;

/// Largest width or height libwebp can encode (14 bits per dimension)
const WEBP_MAX_DIMENSION: u32 = 16_383;

/// Check the requested quality against the codec's accepted range
///
/// Lossless formats ignore quality entirely. For lossy formats an
/// out-of-range value is the caller's error and is rejected before any
/// encoding work rather than silently clamped.
///
/// # Errors
///
/// Returns `RemovalError::InvalidParameter` for lossy formats with quality
/// outside 1-100.
pub fn validate_quality(format: OutputFormat, quality: u8) -> Result<()> {
    if format.is_lossy() && !(QUALITY_MIN..=QUALITY_MAX).contains(&quality) {
        return Err(RemovalError::invalid_parameter(format!(
            "quality must be {QUALITY_MIN}-{QUALITY_MAX}, got {quality}"
        )));
    }
    Ok(())
}

/// Encode the segmented foreground into the requested output format
///
/// PNG output is a lossless re-encode; WebP output is lossy and honors the
/// quality parameter. Quality must already have passed `validate_quality`.
///
/// # Errors
///
/// Returns `RemovalError::Encoding` when the codec rejects the image.
pub fn encode_image(image: &RgbaImage, format: OutputFormat, quality: u8) -> Result<Vec<u8>> {
    let (width, height) = image.dimensions();
    match format {
        OutputFormat::Png => {
            let mut buffer = Vec::new();
            PngEncoder::new(&mut buffer)
                .write_image(image.as_raw(), width, height, ExtendedColorType::Rgba8)
                .map_err(|e| RemovalError::encoding(format!("PNG encode failed: {e}")))?;
            Ok(buffer)
        },
        OutputFormat::WebP => {
            // libwebp has no error channel here and silently fails past its
            // per-dimension cap, so reject oversized images up front.
            if width > WEBP_MAX_DIMENSION || height > WEBP_MAX_DIMENSION {
                return Err(RemovalError::encoding(format!(
                    "image {width}x{height} exceeds the WebP limit of \
                     {WEBP_MAX_DIMENSION}x{WEBP_MAX_DIMENSION}"
                )));
            }
            let encoder = webp::Encoder::from_rgba(image.as_raw(), width, height);
            let encoded = encoder.encode(f32::from(quality));
            Ok(encoded.to_vec())
        },
    }
}

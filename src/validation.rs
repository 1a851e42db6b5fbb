//! Upload validation, run before any expensive work

use crate::error::{RemovalError, Result};
use crate::types::UploadedAsset;

/// Filename extensions accepted for upload
pub const SUPPORTED_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "webp"];

/// Content types accepted for upload
pub const SUPPORTED_CONTENT_TYPES: &[&str] = &["image/png", "image/jpeg", "image/webp"];

/// Validate an uploaded asset's declared type and byte size
///
/// Runs before the asset is admitted to the worker pool, so rejected uploads
/// never cost a segmentation run. The asset is left unchanged on success.
///
/// # Errors
///
/// - `RemovalError::InvalidParameter` for a zero-byte upload
/// - `RemovalError::UnsupportedMediaType` when neither the filename extension
///   nor the content type is in the accepted set
/// - `RemovalError::PayloadTooLarge` when the payload exceeds `max_bytes`
pub fn validate_upload(asset: &UploadedAsset, max_bytes: usize) -> Result<()> {
    match asset.extension() {
        Some(ext) => {
            if !SUPPORTED_EXTENSIONS.contains(&ext.as_str()) {
                return Err(RemovalError::unsupported_media_type(format!(".{ext}")));
            }
        },
        None => {
            // No usable filename; fall back to the declared content type
            let content_type = asset
                .content_type
                .as_deref()
                .ok_or_else(|| RemovalError::unsupported_media_type("unknown"))?;
            if !SUPPORTED_CONTENT_TYPES.contains(&content_type) {
                return Err(RemovalError::unsupported_media_type(content_type));
            }
        },
    }

    if let Some(content_type) = asset.content_type.as_deref() {
        if !content_type.starts_with("image/") {
            return Err(RemovalError::unsupported_media_type(content_type));
        }
    }

    if asset.is_empty() {
        return Err(RemovalError::invalid_parameter("uploaded file is empty"));
    }

    if asset.len() > max_bytes {
        return Err(RemovalError::PayloadTooLarge {
            size: asset.len(),
            limit: max_bytes,
        });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;

    fn make_asset(filename: Option<&str>, content_type: Option<&str>, len: usize) -> UploadedAsset {
        UploadedAsset::new(
            Bytes::from(vec![0u8; len]),
            content_type.map(str::to_string),
            filename.map(str::to_string),
        )
    }

    #[test]
    fn test_accepts_supported_extensions() {
        for name in ["a.png", "a.jpg", "a.jpeg", "a.webp", "a.PNG", "a.JPEG"] {
            let asset = make_asset(Some(name), Some("image/png"), 16);
            assert!(validate_upload(&asset, 1024).is_ok(), "rejected {name}");
        }
    }

    #[test]
    fn test_rejects_unsupported_extension() {
        let asset = make_asset(Some("scan.bmp"), Some("image/bmp"), 16);
        let err = validate_upload(&asset, 1024).unwrap_err();
        match err {
            RemovalError::UnsupportedMediaType(t) => assert_eq!(t, ".bmp"),
            other => panic!("expected UnsupportedMediaType, got {other:?}"),
        }
    }

    #[test]
    fn test_falls_back_to_content_type_without_filename() {
        let asset = make_asset(None, Some("image/webp"), 16);
        assert!(validate_upload(&asset, 1024).is_ok());

        let asset = make_asset(None, Some("application/pdf"), 16);
        assert!(matches!(
            validate_upload(&asset, 1024),
            Err(RemovalError::UnsupportedMediaType(_))
        ));

        let asset = make_asset(None, None, 16);
        assert!(matches!(
            validate_upload(&asset, 1024),
            Err(RemovalError::UnsupportedMediaType(_))
        ));
    }

    #[test]
    fn test_rejects_non_image_content_type() {
        let asset = make_asset(Some("a.png"), Some("text/html"), 16);
        assert!(matches!(
            validate_upload(&asset, 1024),
            Err(RemovalError::UnsupportedMediaType(_))
        ));
    }

    #[test]
    fn test_rejects_empty_upload_as_invalid_parameter() {
        let asset = make_asset(Some("a.png"), Some("image/png"), 0);
        assert!(matches!(
            validate_upload(&asset, 1024),
            Err(RemovalError::InvalidParameter(_))
        ));
    }

    #[test]
    fn test_rejects_oversize_upload() {
        let asset = make_asset(Some("a.png"), Some("image/png"), 1025);
        match validate_upload(&asset, 1024).unwrap_err() {
            RemovalError::PayloadTooLarge { size, limit } => {
                assert_eq!(size, 1025);
                assert_eq!(limit, 1024);
            },
            other => panic!("expected PayloadTooLarge, got {other:?}"),
        }
    }

    #[test]
    fn test_exact_ceiling_is_accepted() {
        let asset = make_asset(Some("a.png"), Some("image/png"), 1024);
        assert!(validate_upload(&asset, 1024).is_ok());
    }
}

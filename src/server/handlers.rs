//! Endpoint handlers and multipart form parsing

use super::{ApiError, AppState};
use crate::config::OutputFormat;
use crate::encode::DEFAULT_QUALITY;
use crate::error::{RemovalError, Result};
use crate::types::{HealthStatus, ProcessingRequest, RemovalResponse, UploadedAsset};
use axum::body::Body;
use axum::extract::{Multipart, State};
use axum::http::{header, StatusCode};
use axum::response::Response;
use axum::Json;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};

/// Liveness probe: always 200 while the process is up
pub async fn health() -> Json<HealthStatus> {
    Json(HealthStatus::current())
}

/// Collect the multipart form into a `ProcessingRequest`
///
/// Fields may arrive in any order, so everything is gathered before the
/// request is assembled. `output_format` defaults to PNG and `quality` to 95.
async fn parse_request(mut multipart: Multipart) -> Result<ProcessingRequest> {
    let mut file_bytes = None;
    let mut filename = None;
    let mut content_type = None;
    let mut format_field = None;
    let mut quality_field = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| RemovalError::invalid_parameter(format!("malformed multipart body: {e}")))?
    {
        match field.name() {
            Some("file") => {
                filename = field.file_name().map(str::to_string);
                content_type = field.content_type().map(str::to_string);
                file_bytes = Some(field.bytes().await.map_err(|e| {
                    RemovalError::invalid_parameter(format!("failed to read file field: {e}"))
                })?);
            },
            Some("output_format") => {
                format_field = Some(field.text().await.map_err(|e| {
                    RemovalError::invalid_parameter(format!("failed to read output_format: {e}"))
                })?);
            },
            Some("quality") => {
                quality_field = Some(field.text().await.map_err(|e| {
                    RemovalError::invalid_parameter(format!("failed to read quality: {e}"))
                })?);
            },
            _ => {},
        }
    }

    let bytes = file_bytes
        .ok_or_else(|| RemovalError::invalid_parameter("missing required field 'file'"))?;

    let format = match format_field {
        Some(value) => OutputFormat::parse(&value)?,
        None => OutputFormat::default(),
    };

    let quality = match quality_field {
        None => DEFAULT_QUALITY,
        Some(value) => {
            let parsed: i64 = value.trim().parse().map_err(|_| {
                RemovalError::invalid_parameter(format!(
                    "quality must be an integer, got {value:?}"
                ))
            })?;
            match u8::try_from(parsed) {
                Ok(quality) => quality,
                // Far outside any codec range; the lossless path ignores
                // quality entirely, the lossy path reports it.
                Err(_) if !format.is_lossy() => DEFAULT_QUALITY,
                Err(_) => {
                    return Err(RemovalError::invalid_parameter(format!(
                        "quality must be 1-100, got {parsed}"
                    )))
                },
            }
        },
    };

    Ok(ProcessingRequest {
        asset: UploadedAsset::new(bytes, content_type, filename),
        format,
        quality,
    })
}

/// Output filename for the stream variant's Content-Disposition header
fn output_filename(original: &str, format: OutputFormat) -> String {
    let stem = original
        .rsplit_once('.')
        .map_or(original, |(stem, _)| stem);
    format!("no_bg_{stem}.{}", format.extension())
}

/// `POST /remove-background`: binary stream variant
pub async fn remove_background(
    State(state): State<AppState>,
    multipart: Multipart,
) -> std::result::Result<Response, ApiError> {
    let request = parse_request(multipart).await?;
    let filename = request
        .asset
        .filename
        .clone()
        .unwrap_or_else(|| "image".to_string());

    let result = state.pipeline.process(request).await?;

    let response = Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, result.format.media_type())
        .header(
            header::CONTENT_DISPOSITION,
            format!(
                "attachment; filename={}",
                output_filename(&filename, result.format)
            ),
        )
        .header("X-Processing-Time", format!("{:.2}s", result.elapsed.as_secs_f64()))
        .header("X-Original-Size", result.original_size.to_string())
        .header("X-Output-Size", result.output_size.to_string())
        .header(
            "X-Output-Format",
            result.format.extension().to_ascii_uppercase(),
        )
        .header(header::CACHE_CONTROL, "no-cache, no-store, must-revalidate")
        .body(Body::from(result.bytes))
        .map_err(|e| RemovalError::encoding(format!("failed to build response: {e}")))?;
    Ok(response)
}

/// `POST /remove-background-base64`: structured JSON variant
pub async fn remove_background_base64(
    State(state): State<AppState>,
    multipart: Multipart,
) -> std::result::Result<Json<RemovalResponse>, ApiError> {
    let request = parse_request(multipart).await?;
    let filename = request
        .asset
        .filename
        .clone()
        .unwrap_or_else(|| "image".to_string());

    let result = state.pipeline.process(request).await?;

    Ok(Json(RemovalResponse {
        success: true,
        message: format!("Background removed successfully from {filename}"),
        base64_image: BASE64.encode(&result.bytes),
        processing_time: result.elapsed.as_secs_f64(),
        output_format: result.format.extension().to_string(),
        original_size: result.original_size,
        output_size: result.output_size,
        compression_ratio: result.compression_ratio,
    }))
}

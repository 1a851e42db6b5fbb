//! HTTP surface: router, shared state, and error mapping

mod handlers;

use crate::config::ServiceConfig;
use crate::error::RemovalError;
use crate::pipeline::RemovalPipeline;
use crate::types::ErrorResponse;
use axum::extract::DefaultBodyLimit;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Shared application state handed to every handler
#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<RemovalPipeline>,
    pub max_upload_bytes: usize,
}

/// Pipeline failure carried across the handler boundary
///
/// Maps the error taxonomy onto HTTP statuses and a stable
/// `{success: false, message}` JSON body, on both endpoints. Internal causes
/// are logged, not leaked.
pub struct ApiError(pub RemovalError);

impl From<RemovalError> for ApiError {
    fn from(error: RemovalError) -> Self {
        Self(error)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let error = self.0;
        let status = match &error {
            RemovalError::UnsupportedMediaType(_) => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            RemovalError::PayloadTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            RemovalError::InvalidParameter(_) => StatusCode::BAD_REQUEST,
            RemovalError::Io(_)
            | RemovalError::Image(_)
            | RemovalError::Processing(_)
            | RemovalError::Encoding(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let message = if error.is_client_error() {
            tracing::warn!(error = %error, "request rejected");
            error.to_string()
        } else {
            tracing::error!(error = %error, "request processing failed");
            "background removal failed".to_string()
        };

        (status, Json(ErrorResponse::new(message))).into_response()
    }
}

/// Build the service router over the given state
///
/// The body limit sits above the validator's ceiling so the validator owns
/// the 413 semantics for everything in its range.
#[must_use]
pub fn router(state: AppState) -> Router {
    let body_limit = state.max_upload_bytes.saturating_mul(2);
    Router::new()
        .route("/health", get(handlers::health))
        .route("/remove-background", post(handlers::remove_background))
        .route(
            "/remove-background-base64",
            post(handlers::remove_background_base64),
        )
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Bind the listener and serve until ctrl-c
///
/// # Errors
///
/// Returns an error when the listener cannot bind or the server fails.
pub async fn serve(config: &ServiceConfig, state: AppState) -> anyhow::Result<()> {
    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(addr = %addr, "listening");

    axum::serve(listener, router(state))
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("shutdown signal received");
        })
        .await?;
    Ok(())
}

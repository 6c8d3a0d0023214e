use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use manip_core::CodecError;
use manip_worker::DispatchError;
use serde_json::json;

/// Application-level error type for HTTP handlers.
///
/// Wraps [`DispatchError`] and [`CodecError`] and adds HTTP-specific
/// variants. Implements [`IntoResponse`] to produce consistent JSON error
/// responses.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// Outcome of a dispatched job other than success.
    #[error(transparent)]
    Dispatch(#[from] DispatchError),

    /// The uploaded body could not be decoded, or a result could not be encoded.
    #[error(transparent)]
    Codec(#[from] CodecError),

    /// A bad request with a human-readable message.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// An internal error with a human-readable message.
    #[error("Internal error: {0}")]
    InternalError(String),
}

/// Convenience type alias for handler return values.
pub type AppResult<T> = Result<T, AppError>;

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            // --- Dispatch outcomes ---
            AppError::Dispatch(err) => match err {
                DispatchError::Operation(op) => {
                    (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", op.to_string())
                }
                DispatchError::Timeout => {
                    (StatusCode::GATEWAY_TIMEOUT, "TIMEOUT", err.to_string())
                }
                DispatchError::QueueClosed => (
                    StatusCode::SERVICE_UNAVAILABLE,
                    "UNAVAILABLE",
                    "Server is shutting down".to_string(),
                ),
                DispatchError::Abandoned { .. } | DispatchError::Encode(_) => internal(err),
            },

            // --- Codec errors ---
            AppError::Codec(err @ CodecError::Decode(_)) => {
                (StatusCode::BAD_REQUEST, "INVALID_IMAGE", err.to_string())
            }
            AppError::Codec(err) => internal(err),

            // --- HTTP-specific errors ---
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg.clone()),
            AppError::InternalError(msg) => internal(msg),
        };

        let body = json!({
            "error": message,
            "code": code,
        });

        (status, axum::Json(body)).into_response()
    }
}

/// Log `err` and return a sanitized 500.
fn internal(err: &dyn std::fmt::Display) -> (StatusCode, &'static str, String) {
    tracing::error!(error = %err, "Internal error");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        "INTERNAL_ERROR",
        "An internal error occurred".to_string(),
    )
}

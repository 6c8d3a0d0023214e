//! Tests for `AppError` → HTTP response mapping.
//!
//! These call `IntoResponse` directly on `AppError` values; no server or
//! worker pool is involved.

use axum::http::StatusCode;
use axum::response::IntoResponse;
use http_body_util::BodyExt;
use manip_api::error::AppError;
use manip_core::{codec, OperationError};
use manip_worker::DispatchError;

/// Helper: convert an `AppError` into its status code and parsed JSON body.
async fn error_to_response(err: AppError) -> (StatusCode, serde_json::Value) {
    let response = err.into_response();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    (status, json)
}

// ---------------------------------------------------------------------------
// Test: operation errors map to 400 VALIDATION_ERROR with the message intact
// ---------------------------------------------------------------------------

#[tokio::test]
async fn operation_error_returns_400_with_message() {
    let err = AppError::from(DispatchError::Operation(OperationError::InvalidParameter(
        "expected quality to be greater than 0.0, got 0.00".into(),
    )));

    let (status, json) = error_to_response(err).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["code"], "VALIDATION_ERROR");
    assert_eq!(json["error"], "expected quality to be greater than 0.0, got 0.00");
}

// ---------------------------------------------------------------------------
// Test: timeout maps to 504
// ---------------------------------------------------------------------------

#[tokio::test]
async fn timeout_returns_504() {
    let (status, json) = error_to_response(DispatchError::Timeout.into()).await;

    assert_eq!(status, StatusCode::GATEWAY_TIMEOUT);
    assert_eq!(json["code"], "TIMEOUT");
    assert_eq!(json["error"], "job cancelled due to timeout");
}

// ---------------------------------------------------------------------------
// Test: closed queue maps to 503
// ---------------------------------------------------------------------------

#[tokio::test]
async fn queue_closed_returns_503() {
    let (status, json) = error_to_response(DispatchError::QueueClosed.into()).await;

    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(json["code"], "UNAVAILABLE");
}

// ---------------------------------------------------------------------------
// Test: abandoned jobs map to 500 and sanitize the message
// ---------------------------------------------------------------------------

#[tokio::test]
async fn abandoned_job_returns_500_and_sanitizes_message() {
    let (status, json) =
        error_to_response(DispatchError::Abandoned { job_id: 9 }.into()).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(json["code"], "INTERNAL_ERROR");
    assert_eq!(json["error"], "An internal error occurred");
}

// ---------------------------------------------------------------------------
// Test: decode failures map to 400 INVALID_IMAGE
// ---------------------------------------------------------------------------

#[tokio::test]
async fn decode_error_returns_400_invalid_image() {
    let decode = codec::decode_image(b"nope").unwrap_err();

    let (status, json) = error_to_response(decode.into()).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["code"], "INVALID_IMAGE");
}

// ---------------------------------------------------------------------------
// Test: AppError::BadRequest maps to 400 BAD_REQUEST
// ---------------------------------------------------------------------------

#[tokio::test]
async fn bad_request_error_returns_400() {
    let (status, json) = error_to_response(AppError::BadRequest("gif files are not supported".into())).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["code"], "BAD_REQUEST");
    assert_eq!(json["error"], "gif files are not supported");
}

// ---------------------------------------------------------------------------
// Test: AppError::InternalError maps to 500 and sanitizes the message
// ---------------------------------------------------------------------------

#[tokio::test]
async fn internal_error_returns_500_and_sanitizes_message() {
    let err = AppError::InternalError("decode task failed: cancelled".into());

    let (status, json) = error_to_response(err).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(json["code"], "INTERNAL_ERROR");
    assert_eq!(json["error"], "An internal error occurred");
}

//! Extractors for image routes.
//!
//! [`ImageBody`] verifies the upload's content type and decodes it;
//! [`ImageQuery`] parses the operation parameters. Both reject with
//! [`AppError`] so failures render as JSON.

use axum::body::Bytes;
use axum::extract::{FromRequest, FromRequestParts, Query, Request};
use axum::http::header::CONTENT_TYPE;
use axum::http::request::Parts;
use manip_core::{codec, DynamicImage};
use serde::de::DeserializeOwned;

use crate::error::AppError;

/// A decoded `image/png` or `image/jpeg` request body.
///
/// Any other content type is rejected with 400 before the body is read.
/// The body size is bounded by the router's `DefaultBodyLimit`.
pub struct ImageBody(pub DynamicImage);

impl<S> FromRequest<S> for ImageBody
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let content_type = req
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string();

        if !codec::is_supported_content_type(&content_type) {
            tracing::warn!(content_type = %content_type, "Unsupported upload content type");
            return Err(AppError::BadRequest(unsupported_message(&content_type)));
        }

        let bytes = Bytes::from_request(req, state)
            .await
            .map_err(|rejection| AppError::BadRequest(rejection.body_text()))?;
        if bytes.is_empty() {
            return Err(AppError::BadRequest("request body is empty".into()));
        }

        let image = tokio::task::spawn_blocking(move || codec::decode_image(&bytes))
            .await
            .map_err(|e| AppError::InternalError(format!("decode task failed: {e}")))??;
        Ok(ImageBody(image))
    }
}

/// `"{subtype} files are not supported"`, where the subtype is whatever
/// follows the last `/` of the media type.
fn unsupported_message(content_type: &str) -> String {
    let essence = content_type.split(';').next().unwrap_or_default().trim();
    if essence.is_empty() {
        return "missing Content-Type header".to_string();
    }
    let subtype = essence.rsplit('/').next().unwrap_or(essence);
    format!("{subtype} files are not supported")
}

/// Query-string parameters deserialized into `T`.
///
/// Same as axum's `Query` but rejects with a JSON [`AppError::BadRequest`].
pub struct ImageQuery<T>(pub T);

impl<T, S> FromRequestParts<S> for ImageQuery<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Query(params) = Query::<T>::from_request_parts(parts, state)
            .await
            .map_err(|rejection| AppError::BadRequest(rejection.body_text()))?;
        Ok(ImageQuery(params))
    }
}

//! Handlers for the image operation routes.
//!
//! Each handler hands the decoded upload and its parsed parameters to the
//! dispatcher and returns the PNG it produces. Parameter range checks happen
//! inside the operation, not here.

use axum::extract::State;
use axum::http::header::CONTENT_TYPE;
use axum::response::{IntoResponse, Response};
use manip_core::codec::PNG_CONTENT_TYPE;
use manip_core::MorphologyKind;
use serde::Deserialize;

use crate::error::{AppError, AppResult};
use crate::middleware::image::{ImageBody, ImageQuery};
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Query types
// ---------------------------------------------------------------------------

/// Query for `POST /saturate`.
#[derive(Debug, Deserialize)]
pub struct SaturateParams {
    pub saturation: f32,
}

/// Query for `POST /edgeDetection`.
#[derive(Debug, Deserialize)]
pub struct EdgeDetectionParams {
    pub lower: f32,
    pub higher: f32,
}

/// Query for `POST /morphology`. `type` is `dilate` or `erode`, any case.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MorphologyParams {
    #[serde(rename = "type")]
    pub kind: String,
    pub kernel_size: i32,
    pub iterations: i32,
}

/// Query for `POST /reduction`.
#[derive(Debug, Deserialize)]
pub struct ReductionParams {
    pub quality: f32,
}

/// Query for `POST /text`. A missing `text` is left for the operation to reject.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextParams {
    #[serde(default)]
    pub text: String,
    pub font_scale: f64,
    pub x_perc: f64,
    pub y_perc: f64,
}

/// Query for `POST /randomFilter`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RandomFilterParams {
    pub min_val: i32,
    pub max_val: i32,
    pub kernel_size: i32,
    #[serde(default)]
    pub normalize: bool,
}

/// Query for `POST /shuffle`.
#[derive(Debug, Deserialize)]
pub struct ShuffleParams {
    pub partitions: i32,
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// POST /invert
pub async fn invert(
    State(state): State<AppState>,
    ImageBody(image): ImageBody,
) -> AppResult<Response> {
    let png = state.dispatcher.enqueue_invert(image).await?;
    Ok(png_response(png))
}

/// POST /saturate?saturation=
pub async fn saturate(
    State(state): State<AppState>,
    ImageQuery(params): ImageQuery<SaturateParams>,
    ImageBody(image): ImageBody,
) -> AppResult<Response> {
    let png = state
        .dispatcher
        .enqueue_saturate(image, params.saturation)
        .await?;
    Ok(png_response(png))
}

/// POST /edgeDetection?lower=&higher=
pub async fn edge_detection(
    State(state): State<AppState>,
    ImageQuery(params): ImageQuery<EdgeDetectionParams>,
    ImageBody(image): ImageBody,
) -> AppResult<Response> {
    let png = state
        .dispatcher
        .enqueue_edge_detection(image, params.lower, params.higher)
        .await?;
    Ok(png_response(png))
}

/// POST /morphology?type=&kernelSize=&iterations=
pub async fn morphology(
    State(state): State<AppState>,
    ImageQuery(params): ImageQuery<MorphologyParams>,
    ImageBody(image): ImageBody,
) -> AppResult<Response> {
    let kind: MorphologyKind = params
        .kind
        .parse()
        .map_err(|e: manip_core::OperationError| AppError::BadRequest(e.to_string()))?;
    let png = state
        .dispatcher
        .enqueue_morphology(image, params.kernel_size, params.iterations, kind)
        .await?;
    Ok(png_response(png))
}

/// POST /reduction?quality=
pub async fn reduction(
    State(state): State<AppState>,
    ImageQuery(params): ImageQuery<ReductionParams>,
    ImageBody(image): ImageBody,
) -> AppResult<Response> {
    let png = state
        .dispatcher
        .enqueue_reduce(image, params.quality)
        .await?;
    Ok(png_response(png))
}

/// POST /text?text=&fontScale=&xPerc=&yPerc=
pub async fn add_text(
    State(state): State<AppState>,
    ImageQuery(params): ImageQuery<TextParams>,
    ImageBody(image): ImageBody,
) -> AppResult<Response> {
    let png = state
        .dispatcher
        .enqueue_add_text(image, params.text, params.font_scale, params.x_perc, params.y_perc)
        .await?;
    Ok(png_response(png))
}

/// POST /randomFilter?minVal=&maxVal=&kernelSize=&normalize=
pub async fn random_filter(
    State(state): State<AppState>,
    ImageQuery(params): ImageQuery<RandomFilterParams>,
    ImageBody(image): ImageBody,
) -> AppResult<Response> {
    let png = state
        .dispatcher
        .enqueue_random_filter(
            image,
            params.kernel_size,
            params.min_val,
            params.max_val,
            params.normalize,
        )
        .await?;
    Ok(png_response(png))
}

/// POST /shuffle?partitions=
pub async fn shuffle(
    State(state): State<AppState>,
    ImageQuery(params): ImageQuery<ShuffleParams>,
    ImageBody(image): ImageBody,
) -> AppResult<Response> {
    let png = state
        .dispatcher
        .enqueue_shuffle(image, params.partitions)
        .await?;
    Ok(png_response(png))
}

fn png_response(png: Vec<u8>) -> Response {
    ([(CONTENT_TYPE, PNG_CONTENT_TYPE)], png).into_response()
}

use axum::routing::post;
use axum::Router;

use crate::handlers::images;
use crate::state::AppState;

/// Image operation routes, mounted at the root.
///
/// ```text
/// POST /invert                                      invert colours
/// POST /saturate        ?saturation                 scale saturation
/// POST /edgeDetection   ?lower&higher               edge map
/// POST /morphology      ?type&kernelSize&iterations dilate / erode
/// POST /reduction       ?quality                    pixelate
/// POST /text            ?text&fontScale&xPerc&yPerc draw text
/// POST /randomFilter    ?minVal&maxVal&kernelSize&normalize
/// POST /shuffle         ?partitions                 shuffle tiles
/// ```
///
/// Each takes a PNG or JPEG body and returns a PNG.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/invert", post(images::invert))
        .route("/saturate", post(images::saturate))
        .route("/edgeDetection", post(images::edge_detection))
        .route("/morphology", post(images::morphology))
        .route("/reduction", post(images::reduction))
        .route("/text", post(images::add_text))
        .route("/randomFilter", post(images::random_filter))
        .route("/shuffle", post(images::shuffle))
}

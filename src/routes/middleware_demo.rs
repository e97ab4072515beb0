//! Routes behind the rate limiter, the `/api` path rewrite and the
//! response marker.
//!
//! The rewrite has to run before routing, so the layers wrap the router as
//! a service instead of being added with `Router::layer`.

use std::sync::Arc;

use axum::{middleware, response::Json, routing::get, Router};
use serde_json::{json, Value};
use tower::ServiceBuilder;

use crate::middleware::rate_limit::{rate_limit_middleware, FixedWindowLimiter};
use crate::middleware::rewrite::{mark_response, rewrite_api_path};

/// Response marker outermost, so rejections are marked too; then the
/// limiter, then the rewrite.
pub fn service(limiter: Arc<FixedWindowLimiter>) -> Router {
    let routes = Router::new()
        .route("/info", get(info))
        .route("/apiv2/info", get(info_v2));

    let layered = ServiceBuilder::new()
        .layer(middleware::from_fn(mark_response))
        .layer(middleware::from_fn_with_state(limiter, rate_limit_middleware))
        .layer(middleware::from_fn(rewrite_api_path))
        .service(routes);

    Router::new().fallback_service(layered)
}

#[utoipa::path(
    get,
    path = "/middleware/info",
    tag = "middleware",
    responses(
        (status = 200, description = "Greeting"),
        (status = 429, description = "Rate limit exceeded")
    )
)]
pub async fn info() -> Json<Value> {
    Json(json!({ "message": "Hello, World!" }))
}

#[utoipa::path(
    get,
    path = "/middleware/apiv2/info",
    tag = "middleware",
    responses(
        (status = 200, description = "Greeting of the second version"),
        (status = 429, description = "Rate limit exceeded")
    )
)]
pub async fn info_v2() -> Json<Value> {
    Json(json!({ "message": "Hello, World from V2" }))
}

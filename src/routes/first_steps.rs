use axum::{response::Json, routing::get, Router};
use serde_json::{json, Value};

use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/", get(root))
}

/// Hello world
#[utoipa::path(
    get,
    path = "/",
    tag = "first-steps",
    responses((status = 200, description = "Greeting"))
)]
pub async fn root() -> Json<Value> {
    Json(json!({ "message": "Hello World" }))
}

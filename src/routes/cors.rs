use axum::{response::Json, routing::get, Router};
use serde_json::{json, Value};

use crate::AppState;

/// Served under the global CORS policy.
pub fn router() -> Router<AppState> {
    Router::new().route("/", get(main))
}

pub async fn main() -> Json<Value> {
    Json(json!({ "message": "Hello World" }))
}

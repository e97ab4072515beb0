use axum::{response::Json, routing::get, Router};
use serde_json::{json, Value};

use crate::extract::HeaderParams;
use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/items/", get(read_items))
        .route("/items/tokens/", get(read_tokens))
}

pub async fn read_items(headers: HeaderParams) -> Json<Value> {
    Json(json!({ "User-Agent": headers.get("user_agent") }))
}

/// Every value of a repeated `X-Token` header, or `null`.
pub async fn read_tokens(headers: HeaderParams) -> Json<Value> {
    let tokens = headers.get_all("x_token");
    let tokens = (!tokens.is_empty()).then_some(tokens);
    Json(json!({ "X-Token values": tokens }))
}

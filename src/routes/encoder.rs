//! Storing models in their JSON-compatible form.

use axum::{
    extract::State,
    response::Json,
    routing::put,
    Router,
};
use serde_json::Value;
use tracing::info;

use crate::error::{ApiError, ApiResult};
use crate::extract::{JsonBody, PathParam};
use crate::models::EncodableItem;
use crate::response::encode;
use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/items/:id", put(update_item).get(read_item))
}

#[utoipa::path(
    put,
    path = "/encoder/items/{id}",
    tag = "encoder",
    params(("id" = String, Path,)),
    request_body = EncodableItem,
    responses((status = 200, description = "Stored; the body is null"))
)]
pub async fn update_item(
    State(state): State<AppState>,
    PathParam(id): PathParam<String>,
    JsonBody(item): JsonBody<EncodableItem>,
) -> ApiResult<Json<Value>> {
    let json_compatible_item_data = encode(&item)?;
    info!(id = %id, "Storing encoded item");
    state
        .stores
        .encoded_items
        .put(id, json_compatible_item_data)
        .await;
    Ok(Json(Value::Null))
}

pub async fn read_item(
    State(state): State<AppState>,
    PathParam(id): PathParam<String>,
) -> ApiResult<Json<Value>> {
    state
        .stores
        .encoded_items
        .get(&id)
        .await
        .map(Json)
        .ok_or_else(|| ApiError::not_found("Item not found"))
}

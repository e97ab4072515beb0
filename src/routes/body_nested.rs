//! Nested models: sets, sub-models, lists of models and maps with typed
//! keys.

use std::collections::BTreeMap;

use axum::{response::Json, routing::{post, put}, Router};
use serde_json::{json, Value};

use crate::error::{ApiResult, Loc};
use crate::extract::{JsonBody, JsonPayload, PathParam, RawJson};
use crate::models::{Image, NestedItem, Offer};
use crate::validation::{both, int_keyed_weights, path_i64};
use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/items/:item_id", put(update_item))
        .route("/offers/", post(create_offer))
        .route("/images/multiple/", post(create_multiple_images))
        .route("/index-weights/", post(create_index_weights))
}

#[utoipa::path(
    put,
    path = "/body-nested/items/{item_id}",
    tag = "body-nested",
    params(("item_id" = i64, Path,)),
    request_body = NestedItem,
    responses(
        (status = 200, description = "Id and item, tags deduplicated"),
        (status = 422, description = "Invalid item or image URL")
    )
)]
pub async fn update_item(
    PathParam(item_id): PathParam<String>,
    payload: JsonPayload,
) -> ApiResult<Json<Value>> {
    let (item_id, item) = both(
        path_i64("item_id", &item_id),
        payload.required::<NestedItem>(),
    )?;
    Ok(Json(json!({ "item_id": item_id, "item": item })))
}

#[utoipa::path(
    post,
    path = "/body-nested/offers/",
    tag = "body-nested",
    request_body = Offer,
    responses((status = 200, description = "The offer", body = Offer))
)]
pub async fn create_offer(JsonBody(offer): JsonBody<Offer>) -> Json<Offer> {
    Json(offer)
}

pub async fn create_multiple_images(JsonBody(images): JsonBody<Vec<Image>>) -> Json<Vec<Image>> {
    Json(images)
}

pub async fn create_index_weights(RawJson(body): RawJson) -> ApiResult<Json<BTreeMap<i64, f64>>> {
    Ok(Json(int_keyed_weights(&body, &Loc::body())?))
}

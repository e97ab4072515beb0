//! JSON request bodies, alone and with path and query parameters.

use axum::{response::Json, routing::{post, put}, Router};
use serde_json::{json, Value};
use tracing::info;

use crate::error::ApiResult;
use crate::extract::{JsonBody, JsonPayload, PathParam, QueryParams};
use crate::models::Item;
use crate::response::{encode, merge};
use crate::validation::{all3, coerce_str, path_i64};
use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/items/", post(create_item))
        .route("/items/:item_id", put(update_item))
}

/// Create an item
///
/// Echoes the item, adding `price_with_tax` when a tax is given.
#[utoipa::path(
    post,
    path = "/body/items/",
    tag = "body",
    request_body = Item,
    responses(
        (status = 200, description = "The created item"),
        (status = 422, description = "Invalid item")
    )
)]
pub async fn create_item(JsonBody(item): JsonBody<Item>) -> ApiResult<Json<Value>> {
    info!(name = %item.name, "Creating item");

    let mut item_dict = encode(&item)?;
    if let Some(price_with_tax) = item.price_with_tax() {
        item_dict["price_with_tax"] = price_with_tax.into();
    }
    Ok(Json(item_dict))
}

pub async fn update_item(
    PathParam(item_id): PathParam<String>,
    QueryParams(query): QueryParams,
    payload: JsonPayload,
) -> ApiResult<Json<Value>> {
    let (item_id, q, item) = all3(
        path_i64("item_id", &item_id),
        query.optional("q", coerce_str),
        payload.required::<Item>(),
    )?;

    let mut result = merge(json!({ "item_id": item_id }), encode(&item)?);
    if let Some(q) = q {
        result["q"] = q.into();
    }
    Ok(Json(result))
}

//! Several body parameters: optional bodies, multiple models, singular
//! values in the body, and a single embedded model.

use axum::{response::Json, routing::put, Router};
use serde_json::{json, Value};

use crate::error::{ApiResult, Loc, ValidationErrors};
use crate::extract::{JsonPayload, PathParam, QueryParams};
use crate::models::{EmbeddedItem, Item, ItemUserImportance};
use crate::validation::{all3, both, check_ge, check_le, coerce_str, constrain, path_i64};
use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/items/:item_id", put(update_item))
        .route("/items/:item_id/full", put(update_item_full))
        .route("/items/:item_id/embed", put(update_item_embedded))
}

fn bounded_item_id(raw: &str) -> Result<i64, ValidationErrors> {
    let item_id = path_i64("item_id", raw)?;
    constrain(item_id, &Loc::root("path").key("item_id"), |v| {
        check_ge(*v as f64, 0.0)?;
        check_le(*v as f64, 1000.0)
    })
}

pub async fn update_item(
    PathParam(item_id): PathParam<String>,
    QueryParams(query): QueryParams,
    payload: JsonPayload,
) -> ApiResult<Json<Value>> {
    let (item_id, q, item) = all3(
        bounded_item_id(&item_id),
        query.optional("q", coerce_str),
        payload.optional::<Item>(),
    )?;

    let mut results = json!({ "item_id": item_id });
    if let Some(q) = q {
        results["q"] = q.into();
    }
    if let Some(item) = item {
        results["item"] = crate::response::encode(&item)?;
    }
    Ok(Json(results))
}

#[utoipa::path(
    put,
    path = "/body-multiple/items/{item_id}/full",
    tag = "body-multiple",
    params(("item_id" = i64, Path,)),
    request_body = ItemUserImportance,
    responses((status = 200, description = "Id, item, user and importance"))
)]
pub async fn update_item_full(
    PathParam(item_id): PathParam<String>,
    payload: JsonPayload,
) -> ApiResult<Json<Value>> {
    let (item_id, body) = both(
        path_i64("item_id", &item_id),
        payload.required::<ItemUserImportance>(),
    )?;
    Ok(Json(json!({
        "item_id": item_id,
        "item": body.item,
        "user": body.user,
        "importance": body.importance,
    })))
}

pub async fn update_item_embedded(
    PathParam(item_id): PathParam<String>,
    payload: JsonPayload,
) -> ApiResult<Json<Value>> {
    let (item_id, EmbeddedItem { item }) = both(
        path_i64("item_id", &item_id),
        payload.required::<EmbeddedItem>(),
    )?;
    Ok(Json(json!({ "item_id": item_id, "item": item })))
}

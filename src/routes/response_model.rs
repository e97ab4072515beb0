//! Response filtering: declared output models, redirects, unset-field
//! exclusion and explicit include/exclude sets.

use axum::{
    extract::State,
    response::{IntoResponse, Json, Redirect, Response},
    routing::{get, post},
    Router,
};
use serde_json::{json, Value};

use crate::error::{ApiError, ApiResult};
use crate::extract::{JsonBody, PathParam, QueryParams};
use crate::models::{CatalogItem, UserIn, UserOut};
use crate::response::{encode, exclude, exclude_unset, include_only};
use crate::store::ItemStore;
use crate::validation::{coerce_bool, Schema};
use crate::AppState;

pub const PORTAL_URL: &str = "https://www.youtube.com/watch?v=dQw4w9WgXcQ";

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/items/", post(create_item).get(read_items))
        .route("/user/", post(create_user))
        .route("/portal", get(get_portal))
        .route("/teleport", get(get_teleport))
        .route("/items/:item_id", get(read_item))
        .route("/items/:item_id/name", get(read_item_name))
        .route("/items/:item_id/public", get(read_item_public))
}

/// Records exactly as they were stored, unset fields omitted.
pub fn seed_items() -> ItemStore<Value> {
    ItemStore::seeded([
        ("foo", json!({ "name": "Foo", "price": 50.2 })),
        (
            "bar",
            json!({ "name": "Bar", "description": "The bartenders", "price": 62, "tax": 20.2 }),
        ),
        (
            "baz",
            json!({ "name": "Baz", "description": null, "price": 50.2, "tax": 10.5, "tags": [] }),
        ),
    ])
}

pub async fn create_item(JsonBody(item): JsonBody<CatalogItem>) -> Json<CatalogItem> {
    Json(item)
}

pub async fn read_items() -> Json<Vec<CatalogItem>> {
    Json(vec![
        CatalogItem::new("Portugal Gun", 42.0),
        CatalogItem::new("Plumbus", 32.0),
    ])
}

/// Returns the base user; the password never leaves the handler.
pub async fn create_user(JsonBody(user): JsonBody<UserIn>) -> Json<UserOut> {
    Json(UserOut::from(user))
}

pub async fn get_portal(QueryParams(query): QueryParams) -> ApiResult<Response> {
    if query.or_default("teleport", false, coerce_bool)? {
        return Ok(Redirect::temporary(PORTAL_URL).into_response());
    }
    Ok(Json(json!({ "message": "Here's your interdimensional portal." })).into_response())
}

pub async fn get_teleport() -> Redirect {
    Redirect::temporary(PORTAL_URL)
}

/// The stored record and its model encoding with defaults filled in.
async fn load(state: &AppState, item_id: &str) -> ApiResult<(Value, Value)> {
    let stored = state
        .stores
        .response_items
        .get(item_id)
        .await
        .ok_or_else(|| ApiError::not_found("Item not found"))?;
    let encoded = encode(&CatalogItem::from_json(&stored)?)?;
    Ok((stored, encoded))
}

#[utoipa::path(
    get,
    path = "/response-model/items/{item_id}",
    tag = "response-model",
    params(("item_id" = String, Path,)),
    responses(
        (status = 200, description = "Only the fields that were set"),
        (status = 404, description = "Item not found")
    )
)]
pub async fn read_item(
    State(state): State<AppState>,
    PathParam(item_id): PathParam<String>,
) -> ApiResult<Json<Value>> {
    let (stored, encoded) = load(&state, &item_id).await?;
    Ok(Json(exclude_unset(encoded, &stored)))
}

pub async fn read_item_name(
    State(state): State<AppState>,
    PathParam(item_id): PathParam<String>,
) -> ApiResult<Json<Value>> {
    let (_, encoded) = load(&state, &item_id).await?;
    Ok(Json(include_only(encoded, &["name", "description"])))
}

pub async fn read_item_public(
    State(state): State<AppState>,
    PathParam(item_id): PathParam<String>,
) -> ApiResult<Json<Value>> {
    let (_, encoded) = load(&state, &item_id).await?;
    Ok(Json(exclude(encoded, &["tax"])))
}

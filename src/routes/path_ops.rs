//! Operation metadata: status codes, summaries, tags and deprecation.

use axum::{http::StatusCode, response::Json, routing::{get, post}, Router};
use serde_json::{json, Value};

use crate::extract::JsonBody;
use crate::models::TaggedItem;
use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/items/", post(create_item))
        .route("/elements/", get(read_elements))
        .route("/users/", get(read_users))
}

/// Create an item
///
/// Create an item with all the information:
///
/// - **name**: each item must have a name
/// - **description**: a long description
/// - **price**: required
/// - **tax**: if the item doesn't have tax, you can omit this
/// - **tags**: a set of unique tag strings for this item
#[utoipa::path(
    post,
    path = "/path-ops/items/",
    tag = "items",
    request_body = TaggedItem,
    responses(
        (status = 201, description = "The created item", body = TaggedItem),
        (status = 422, description = "Invalid item")
    )
)]
pub async fn create_item(JsonBody(item): JsonBody<TaggedItem>) -> (StatusCode, Json<TaggedItem>) {
    (StatusCode::CREATED, Json(item))
}

#[utoipa::path(
    get,
    path = "/path-ops/elements/",
    tag = "items",
    responses((status = 200, description = "Elements"))
)]
pub async fn read_elements() -> Json<Value> {
    Json(json!([{ "item_id": "Foo" }]))
}

#[utoipa::path(
    get,
    path = "/path-ops/users/",
    tag = "users",
    responses((status = 200, description = "Users"))
)]
pub async fn read_users() -> Json<Value> {
    Json(json!([{ "username": "johndoe" }]))
}

//! Error handling: explicit HTTP errors, extra error headers, a custom
//! error type, a plain-text override and validation errors that echo the
//! received body.

use axum::{
    extract::State,
    http::{HeaderName, HeaderValue, StatusCode},
    middleware,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use serde::Serialize;
use serde_json::{json, Value};

use crate::error::{ApiError, ApiResult, Loc, UnicornError, ValidationErrors};
use crate::extract::{PathParam, RawJson};
use crate::middleware::plain_text::plain_text_errors;
use crate::store::ItemStore;
use crate::validation::{path_i64, Fields, Schema};
use crate::AppState;

pub fn router() -> Router<AppState> {
    let plain = Router::new()
        .route("/items/:item_id", get(read_plain_item))
        .layer(middleware::from_fn(plain_text_errors));

    Router::new()
        .route("/items/:item_id", get(read_item))
        .route("/items-header/:item_id", get(read_item_header))
        .route("/unicorns/:name", get(read_unicorn))
        .route("/echo/items/", post(create_echo_item))
        .nest("/plain", plain)
}

pub fn seed_items() -> ItemStore<String> {
    ItemStore::seeded([("foo", "The Foo Wrestlers".to_string())])
}

#[utoipa::path(
    get,
    path = "/errors/items/{item_id}",
    tag = "errors",
    params(("item_id" = String, Path,)),
    responses(
        (status = 200, description = "The item"),
        (status = 404, description = "Item not found")
    )
)]
pub async fn read_item(
    State(state): State<AppState>,
    PathParam(item_id): PathParam<String>,
) -> ApiResult<Json<Value>> {
    let item = state
        .stores
        .error_items
        .get(&item_id)
        .await
        .ok_or_else(|| ApiError::not_found("Item not found"))?;
    Ok(Json(json!({ "item": item })))
}

pub async fn read_item_header(
    State(state): State<AppState>,
    PathParam(item_id): PathParam<String>,
) -> ApiResult<Json<Value>> {
    let item = state.stores.error_items.get(&item_id).await.ok_or_else(|| {
        ApiError::not_found("Item not found").with_header(
            HeaderName::from_static("x-error"),
            HeaderValue::from_static("There goes my error"),
        )
    })?;
    Ok(Json(json!({ "item": item })))
}

pub async fn read_unicorn(PathParam(name): PathParam<String>) -> Result<Json<Value>, UnicornError> {
    if name == "yolo" {
        return Err(UnicornError { name });
    }
    Ok(Json(json!({ "unicorn_name": name })))
}

/// Integer item id; 3 is refused. Errors are rendered as plain text.
pub async fn read_plain_item(PathParam(item_id): PathParam<String>) -> ApiResult<Json<Value>> {
    let item_id = path_i64("item_id", &item_id)?;
    if item_id == 3 {
        return Err(ApiError::http(StatusCode::IM_A_TEAPOT, "Nope! I don't like 3."));
    }
    Ok(Json(json!({ "item_id": item_id })))
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EchoItem {
    pub title: String,
    pub size: i64,
}

impl Schema for EchoItem {
    fn from_json_at(value: &Value, loc: &Loc) -> Result<Self, ValidationErrors> {
        let mut f = Fields::new(value, loc);
        let title = f.required_str("title");
        let size = f.required_i64("size");
        f.finish(|| Some(EchoItem { title: title?, size: size? }))
    }
}

/// On invalid data the response carries the received body next to the
/// errors.
pub async fn create_echo_item(RawJson(body): RawJson) -> Response {
    match EchoItem::from_json(&body) {
        Ok(item) => Json(item).into_response(),
        Err(errors) => ApiError::InvalidBody { errors, body }.into_response(),
    }
}

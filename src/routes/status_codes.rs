use axum::{http::StatusCode, response::Json, routing::post, Router};
use serde_json::{json, Value};

use crate::error::ApiResult;
use crate::extract::QueryParams;
use crate::validation::coerce_str;
use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/item/", post(create_item))
        .route("/items/", post(create_item))
}

#[utoipa::path(
    post,
    path = "/status-codes/items/",
    tag = "status-codes",
    params(("name" = String, Query,)),
    responses(
        (status = 201, description = "Created"),
        (status = 422, description = "Missing name")
    )
)]
pub async fn create_item(QueryParams(query): QueryParams) -> ApiResult<(StatusCode, Json<Value>)> {
    let name = query.required("name", coerce_str)?;
    Ok((StatusCode::CREATED, Json(json!({ "name": name }))))
}

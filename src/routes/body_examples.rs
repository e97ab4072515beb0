//! A body whose OpenAPI document carries several worked examples.

use axum::{response::Json, routing::put, Router};
use serde_json::{json, Value};

use crate::error::ApiResult;
use crate::extract::{JsonPayload, PathParam};
use crate::models::Item;
use crate::validation::{both, path_i64};
use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/items/:item_id", put(update_item))
}

#[utoipa::path(
    put,
    path = "/body-examples/items/{item_id}",
    tag = "body-examples",
    params(("item_id" = i64, Path,)),
    request_body(
        content = Item,
        description = "An item to store",
        examples(
            ("normal" = (
                summary = "A normal example",
                description = "A **normal** item works correctly.",
                value = json!({
                    "name": "Foo",
                    "description": "A very nice Item",
                    "price": 35.4,
                    "tax": 3.2
                })
            )),
            ("converted" = (
                summary = "An example with converted data",
                description = "The price string is converted to an actual number.",
                value = json!({ "name": "Bar", "price": "35.4" })
            )),
            ("invalid" = (
                summary = "Invalid data is rejected with an error",
                value = json!({ "name": "Baz", "price": "thirty five point four" })
            ))
        )
    ),
    responses(
        (status = 200, description = "Id and item"),
        (status = 422, description = "Invalid item")
    )
)]
pub async fn update_item(
    PathParam(item_id): PathParam<String>,
    payload: JsonPayload,
) -> ApiResult<Json<Value>> {
    let (item_id, item) = both(path_i64("item_id", &item_id), payload.required::<Item>())?;
    Ok(Json(json!({ "item_id": item_id, "item": item })))
}

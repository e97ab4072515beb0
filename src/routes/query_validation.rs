//! String constraints on query parameters and list-valued queries.

use axum::{response::Json, routing::get, Router};
use serde_json::{json, Value};

use crate::error::ApiResult;
use crate::extract::QueryParams;
use crate::validation::{
    check_anchored_literal, check_max_length, check_min_length, coerce_str, constrain,
};
use crate::AppState;

pub const QUERY_PATTERN: &str = "^fixedquery$";

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/items/", get(read_items))
        .route("/items/multi", get(read_multi))
}

/// Read items filtered by a fixed query string
///
/// Kept only for older clients.
#[utoipa::path(
    get,
    path = "/query-validation/items/",
    tag = "query-validation",
    params(
        ("item-query" = Option<String>, Query,
            description = "Query string for the items to search in the database that have a good match. 3 to 50 characters matching ^fixedquery$")
    ),
    responses(
        (status = 200, description = "Items and the echoed query"),
        (status = 422, description = "Query too short, too long or not matching")
    )
)]
pub async fn read_items(QueryParams(query): QueryParams) -> ApiResult<Json<Value>> {
    let mut results = json!({ "items": [{ "item_id": "Foo" }, { "item_id": "Bar" }] });

    if let Some(q) = query.optional("item-query", coerce_str)? {
        let q = constrain(q, &query.loc("item-query"), |q| {
            check_min_length(q, 3)?;
            check_max_length(q, 50)?;
            check_anchored_literal(q, QUERY_PATTERN)
        })?;
        results["q"] = q.into();
    }
    Ok(Json(results))
}

/// Every `q` given, or the defaults when none is.
pub async fn read_multi(QueryParams(query): QueryParams) -> Json<Value> {
    let mut q = query.get_all("q");
    if q.is_empty() {
        q = vec!["foo".to_string(), "bar".to_string()];
    }
    Json(json!({ "q": q }))
}

//! Query parameters with defaults, optional and boolean values, and
//! required query parameters.

use axum::{response::Json, routing::get, Router};
use serde_json::{json, Map, Value};

use crate::error::{ApiResult, ValidationErrors};
use crate::extract::{Params, PathParam, QueryParams};
use crate::validation::{both, check_ge, coerce_bool, coerce_i64, coerce_str, constrain, path_i64};
use crate::AppState;

pub const FAKE_ITEMS_DB: [&str; 3] = ["Foo", "Bar", "Baz"];

pub const LONG_DESCRIPTION: &str = "This is an amazing item that has a long description";

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/items/", get(read_items))
        .route("/items/:item_id", get(read_item))
        .route("/users/:user_id/items/:item_id", get(read_user_item))
        .route("/needy/:item_id", get(read_needy_item))
}

/// Reads a non-negative integer query parameter with a default.
pub(crate) fn non_negative(query: &Params, name: &str, default: i64) -> Result<i64, ValidationErrors> {
    let value = query.or_default(name, default, coerce_i64)?;
    constrain(value, &query.loc(name), |v| check_ge(*v as f64, 0.0))
}

/// Slice of `items` starting at `skip`, at most `limit` long.
pub(crate) fn page<T: Clone>(items: &[T], skip: i64, limit: i64) -> Vec<T> {
    items
        .iter()
        .skip(usize::try_from(skip).unwrap_or(usize::MAX))
        .take(usize::try_from(limit).unwrap_or(0))
        .cloned()
        .collect()
}

pub async fn read_items(QueryParams(query): QueryParams) -> ApiResult<Json<Value>> {
    let (skip, limit) = both(
        non_negative(&query, "skip", 0),
        non_negative(&query, "limit", 10),
    )?;

    let items: Vec<Value> = page(&FAKE_ITEMS_DB, skip, limit)
        .into_iter()
        .map(|name| json!({ "item_name": name }))
        .collect();
    Ok(Json(Value::Array(items)))
}

/// Shared `q`/`short` handling of the item routes.
fn describe_item(mut item: Map<String, Value>, query: &Params) -> ApiResult<Json<Value>> {
    let (q, short) = both(
        query.optional("q", coerce_str),
        query.or_default("short", false, coerce_bool),
    )?;

    if let Some(q) = q {
        item.insert("q".into(), q.into());
    }
    if !short {
        item.insert("description".into(), LONG_DESCRIPTION.into());
    }
    Ok(Json(Value::Object(item)))
}

pub async fn read_item(
    PathParam(item_id): PathParam<String>,
    QueryParams(query): QueryParams,
) -> ApiResult<Json<Value>> {
    let mut item = Map::new();
    item.insert("item_id".into(), item_id.into());
    describe_item(item, &query)
}

pub async fn read_user_item(
    PathParam((user_id, item_id)): PathParam<(String, String)>,
    QueryParams(query): QueryParams,
) -> ApiResult<Json<Value>> {
    let user_id = path_i64("user_id", &user_id)?;

    let mut item = Map::new();
    item.insert("item_id".into(), item_id.into());
    item.insert("owner_id".into(), user_id.into());
    describe_item(item, &query)
}

pub async fn read_needy_item(
    PathParam(item_id): PathParam<String>,
    QueryParams(query): QueryParams,
) -> ApiResult<Json<Value>> {
    let needy = query.required("needy", coerce_str)?;
    Ok(Json(json!({ "item_id": item_id, "needy": needy })))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_bounds() {
        assert_eq!(page(&FAKE_ITEMS_DB, 0, 10), vec!["Foo", "Bar", "Baz"]);
        assert_eq!(page(&FAKE_ITEMS_DB, 1, 1), vec!["Bar"]);
        assert!(page(&FAKE_ITEMS_DB, 5, 10).is_empty());
    }

    #[test]
    fn test_negative_skip_is_rejected() {
        let query = Params::new("query", vec![("skip".into(), "-1".into())]);
        assert!(non_negative(&query, "skip", 0).is_err());
    }
}

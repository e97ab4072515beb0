//! Numeric bounds on path and query parameters.

use axum::{response::Json, routing::get, Router};
use serde_json::{Map, Value};

use crate::error::{ApiResult, Loc};
use crate::extract::{PathParam, QueryParams};
use crate::validation::{all3, check_ge, check_gt, check_le, check_lt, coerce_f64, coerce_str, constrain, path_i64};
use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/items/:item_id", get(read_item))
}

#[utoipa::path(
    get,
    path = "/path-validation/items/{item_id}",
    tag = "path-validation",
    params(
        ("item_id" = i64, Path, description = "The ID of the item to get, 1 to 1000"),
        ("item-query" = Option<String>, Query,),
        ("size" = Option<f64>, Query, description = "Strictly between 0 and 10.5")
    ),
    responses(
        (status = 200, description = "Validated parameters"),
        (status = 422, description = "Out of bounds")
    )
)]
pub async fn read_item(
    PathParam(raw_id): PathParam<String>,
    QueryParams(query): QueryParams,
) -> ApiResult<Json<Value>> {
    let id_loc = Loc::root("path").key("item_id");
    let item_id = path_i64("item_id", &raw_id).and_then(|id| {
        constrain(id, &id_loc, |v| {
            check_ge(*v as f64, 1.0).and_then(|()| check_le(*v as f64, 1000.0))
        })
    });
    let q = query.optional("item-query", coerce_str);
    let size = query.optional("size", coerce_f64).and_then(|size| match size {
        Some(s) => constrain(s, &query.loc("size"), |v| {
            check_gt(*v, 0.0).and_then(|()| check_lt(*v, 10.5))
        })
        .map(Some),
        None => Ok(None),
    });

    let (item_id, q, size) = all3(item_id, q, size)?;

    let mut results = Map::new();
    results.insert("item_id".into(), item_id.into());
    if let Some(q) = q {
        results.insert("q".into(), q.into());
    }
    if let Some(size) = size {
        results.insert("size".into(), size.into());
    }
    Ok(Json(Value::Object(results)))
}

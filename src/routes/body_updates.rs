//! Full replacement (PUT) and partial update (PATCH) of stored items.
//!
//! Records are kept in their JSON-encoded form. A PATCH applies only the
//! fields the client actually sent; everything else keeps its stored
//! value.

use axum::{
    extract::State,
    response::Json,
    routing::get,
    Router,
};
use serde_json::{json, Value};
use tracing::info;

use crate::error::{ApiError, ApiResult};
use crate::extract::{JsonBody, PathParam, RawJson};
use crate::models::UpdatableItem;
use crate::response::{encode, exclude_unset, merge};
use crate::store::ItemStore;
use crate::validation::Schema;
use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route(
        "/items/:item_id",
        get(read_item).put(replace_item).patch(update_item),
    )
}

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

fn item_not_found() -> ApiError {
    ApiError::not_found("Item not found")
}

#[utoipa::path(
    get,
    path = "/body-updates/items/{item_id}",
    tag = "body-updates",
    params(("item_id" = String, Path,)),
    responses(
        (status = 200, description = "The stored item with defaults filled in", body = UpdatableItem),
        (status = 404, description = "Item not found")
    )
)]
pub async fn read_item(
    State(state): State<AppState>,
    PathParam(item_id): PathParam<String>,
) -> ApiResult<Json<UpdatableItem>> {
    let stored = state
        .stores
        .update_items
        .get(&item_id)
        .await
        .ok_or_else(item_not_found)?;
    Ok(Json(UpdatableItem::from_json(&stored)?))
}

#[utoipa::path(
    put,
    path = "/body-updates/items/{item_id}",
    tag = "body-updates",
    params(("item_id" = String, Path,)),
    request_body = UpdatableItem,
    responses((status = 200, description = "The stored item", body = UpdatableItem))
)]
pub async fn replace_item(
    State(state): State<AppState>,
    PathParam(item_id): PathParam<String>,
    JsonBody(item): JsonBody<UpdatableItem>,
) -> ApiResult<Json<UpdatableItem>> {
    let encoded = encode(&item)?;
    state.stores.update_items.put(item_id.as_str(), encoded).await;
    info!(item_id = %item_id, "Item replaced");
    Ok(Json(item))
}

#[utoipa::path(
    patch,
    path = "/body-updates/items/{item_id}",
    tag = "body-updates",
    params(("item_id" = String, Path,)),
    request_body = UpdatableItem,
    responses(
        (status = 200, description = "The merged item", body = UpdatableItem),
        (status = 404, description = "Item not found")
    )
)]
pub async fn update_item(
    State(state): State<AppState>,
    PathParam(item_id): PathParam<String>,
    RawJson(body): RawJson,
) -> ApiResult<Json<UpdatableItem>> {
    let update = UpdatableItem::from_json(&body)?;
    let update_data = exclude_unset(encode(&update)?, &body);

    let updated = state
        .stores
        .update_items
        .update(&item_id, |stored| apply_patch(stored, update_data))
        .await
        .ok_or_else(item_not_found)??;

    info!(item_id = %item_id, "Item partially updated");
    Ok(Json(updated))
}

/// Merges `update_data` into the stored record and writes the result back.
fn apply_patch(stored: &mut Value, update_data: Value) -> ApiResult<UpdatableItem> {
    let current = encode(&UpdatableItem::from_json(stored)?)?;
    let updated = UpdatableItem::from_json(&merge(current, update_data))?;
    *stored = encode(&updated)?;
    Ok(updated)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_patch_only_touches_sent_fields() {
        let mut stored = json!({ "name": "Bar", "description": "The bartenders", "price": 62, "tax": 20.2 });
        let body = json!({ "price": 3 });
        let update = UpdatableItem::from_json(&body).unwrap();
        let update_data = exclude_unset(encode(&update).unwrap(), &body);

        let updated = apply_patch(&mut stored, update_data).unwrap();
        assert_eq!(updated.price, Some(3.0));
        assert_eq!(updated.tax, 20.2);
        assert_eq!(updated.description.as_deref(), Some("The bartenders"));
        assert_eq!(stored["price"], json!(3.0));
    }

    #[test]
    fn test_patch_keeps_stored_tax_over_default() {
        let mut stored = json!({ "name": "Bar", "price": 62, "tax": 20.2 });
        let updated = apply_patch(&mut stored, json!({ "name": "Barz" })).unwrap();
        assert_eq!(updated.name.as_deref(), Some("Barz"));
        assert_eq!(updated.tax, 20.2);
    }

    #[tokio::test]
    async fn test_seeded_store() {
        let store = seed_items();
        assert_eq!(store.len().await, 3);
        let foo = UpdatableItem::from_json(&store.get("foo").await.unwrap()).unwrap();
        assert_eq!(foo.tax, crate::models::DEFAULT_TAX);
    }
}

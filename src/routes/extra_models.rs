//! Separate input, output and storage models for users; union and map
//! responses.

use std::collections::BTreeMap;

use axum::{response::Json, routing::{get, post}, Router};
use tracing::info;

use crate::error::{ApiError, ApiResult};
use crate::extract::{JsonBody, PathParam};
use crate::models::{CarItem, PlaneItem, UserIn, UserInDB, UserOut, Vehicle};
use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/user/", post(create_user))
        .route("/items/:item_id", get(read_item))
        .route("/keyword-weights/", get(read_keyword_weights))
}

pub fn fake_password_hasher(raw_password: &str) -> String {
    format!("supersecret{raw_password}")
}

pub fn fake_save_user(user_in: UserIn) -> UserInDB {
    let user_in_db = UserInDB::from_user_in(user_in, fake_password_hasher);
    info!(username = %user_in_db.username, "User saved! ..not really");
    user_in_db
}

#[utoipa::path(
    post,
    path = "/extra-models/user/",
    tag = "extra-models",
    request_body = UserIn,
    responses(
        (status = 200, description = "The saved user, without any password", body = UserOut),
        (status = 422, description = "Invalid user")
    )
)]
pub async fn create_user(JsonBody(user_in): JsonBody<UserIn>) -> Json<UserOut> {
    Json(UserOut::from(fake_save_user(user_in)))
}

fn vehicle(item_id: &str) -> Option<Vehicle> {
    match item_id {
        "item1" => Some(Vehicle::Car(CarItem {
            description: "All my friends drive a low rider".to_string(),
            kind: "car".to_string(),
        })),
        "item2" => Some(Vehicle::Plane(PlaneItem {
            description: "Music is my aeroplane, it's my aeroplane".to_string(),
            kind: "plane".to_string(),
            size: 5,
        })),
        _ => None,
    }
}

#[utoipa::path(
    get,
    path = "/extra-models/items/{item_id}",
    tag = "extra-models",
    params(("item_id" = String, Path,)),
    responses(
        (status = 200, description = "A car or a plane", body = Vehicle),
        (status = 404, description = "Item not found")
    )
)]
pub async fn read_item(PathParam(item_id): PathParam<String>) -> ApiResult<Json<Vehicle>> {
    vehicle(&item_id)
        .map(Json)
        .ok_or_else(|| ApiError::not_found("Item not found"))
}

pub async fn read_keyword_weights() -> Json<BTreeMap<&'static str, f64>> {
    Json(BTreeMap::from([("foo", 2.3), ("bar", 3.4)]))
}

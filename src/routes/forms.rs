use axum::{response::Json, routing::post, Router};
use serde_json::{json, Value};
use tracing::info;

use crate::error::ApiResult;
use crate::extract::FormFields;
use crate::validation::{both, coerce_str};
use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/login/", post(login))
}

/// Urlencoded `username` and `password` fields; echoes the user name.
pub async fn login(FormFields(form): FormFields) -> ApiResult<Json<Value>> {
    let (username, _password) = both(
        form.required("username", coerce_str),
        form.required("password", coerce_str),
    )?;
    info!(username = %username, "Login form received");
    Ok(Json(json!({ "username": username })))
}

//! Bearer token extraction and a current-user dependency built on it.

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::request::Parts,
    response::Json,
    routing::get,
    Router,
};
use serde_json::{json, Value};
use tracing::debug;

use crate::error::ApiError;
use crate::extract::BearerToken;
use crate::models::CurrentUser;
use crate::AppState;

pub const SECURITY_SCHEME: &str = "OAuth2PasswordBearer";

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/items/", get(read_items))
        .route("/users/me", get(read_users_me))
}

pub fn fake_decode_token(token: &str) -> CurrentUser {
    CurrentUser {
        username: format!("{token}fakedecoded"),
        email: Some("john@example.com".to_string()),
        full_name: Some("John Doe".to_string()),
        disabled: None,
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let BearerToken(token) = BearerToken::from_request_parts(parts, state).await?;
        let user = fake_decode_token(&token);
        debug!(username = %user.username, "Token decoded");
        Ok(user)
    }
}

#[utoipa::path(
    get,
    path = "/security/items/",
    tag = "security",
    responses(
        (status = 200, description = "The presented token"),
        (status = 401, description = "Not authenticated")
    ),
    security(("OAuth2PasswordBearer" = []))
)]
pub async fn read_items(BearerToken(token): BearerToken) -> Json<Value> {
    Json(json!({ "token": token }))
}

#[utoipa::path(
    get,
    path = "/security/users/me",
    tag = "security",
    responses(
        (status = 200, description = "The decoded user", body = CurrentUser),
        (status = 401, description = "Not authenticated")
    ),
    security(("OAuth2PasswordBearer" = []))
)]
pub async fn read_users_me(current_user: CurrentUser) -> Json<CurrentUser> {
    Json(current_user)
}

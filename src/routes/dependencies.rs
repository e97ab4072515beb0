//! Dependencies expressed as extractors: shared query parameters,
//! sub-dependencies, header checks and a scoped session.

use axum::{
    async_trait,
    extract::{FromRequestParts, State},
    http::request::Parts,
    response::Json,
    routing::get,
    Router,
};
use serde::Serialize;
use serde_json::{json, Value};

use crate::error::{ApiError, ApiResult};
use crate::extract::{Cookies, DbSession, HeaderParams, QueryParams};
use crate::routes::query_params::{page, FAKE_ITEMS_DB};
use crate::validation::{all3, both, coerce_i64, coerce_str};
use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/items/", get(read_items))
        .route("/users/", get(read_users))
        .route("/class/items/", get(read_class_items))
        .route("/query-or-cookie/", get(read_query_or_cookie))
        .route("/verified/items/", get(read_verified_items))
        .route("/db/", get(read_db))
}

/// `q`, `skip` and `limit`, shared by several routes.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CommonQueryParams {
    pub q: Option<String>,
    pub skip: i64,
    pub limit: i64,
}

#[async_trait]
impl<S> FromRequestParts<S> for CommonQueryParams
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let QueryParams(query) = QueryParams::from_request_parts(parts, state).await?;
        let (q, skip, limit) = all3(
            query.optional("q", coerce_str),
            query.or_default("skip", 0, coerce_i64),
            query.or_default("limit", 100, coerce_i64),
        )?;
        Ok(CommonQueryParams { q, skip, limit })
    }
}

pub async fn read_items(commons: CommonQueryParams) -> Json<CommonQueryParams> {
    Json(commons)
}

pub async fn read_users(commons: CommonQueryParams) -> Json<CommonQueryParams> {
    Json(commons)
}

pub async fn read_class_items(commons: CommonQueryParams) -> Json<Value> {
    let items: Vec<Value> = page(&FAKE_ITEMS_DB, commons.skip, commons.limit)
        .into_iter()
        .map(|name| json!({ "item_name": name }))
        .collect();

    let mut response = json!({ "items": items });
    if let Some(q) = commons.q.filter(|q| !q.is_empty()) {
        response["q"] = q.into();
    }
    Json(response)
}

/// The `q` query parameter, falling back to the `last_query` cookie.
pub struct QueryOrCookie(pub Option<String>);

#[async_trait]
impl<S> FromRequestParts<S> for QueryOrCookie
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let QueryParams(query) = QueryParams::from_request_parts(parts, state).await?;
        let q = query.optional("q", coerce_str)?.filter(|q| !q.is_empty());
        if q.is_some() {
            return Ok(QueryOrCookie(q));
        }

        let Cookies(cookies) = Cookies::from_headers(&parts.headers);
        Ok(QueryOrCookie(cookies.optional("last_query", coerce_str)?))
    }
}

pub async fn read_query_or_cookie(QueryOrCookie(q): QueryOrCookie) -> Json<Value> {
    Json(json!({ "q_or_cookie": q }))
}

/// Passes only when `X-Token` and `X-Key` carry the configured secrets.
pub struct VerifiedHeaders;

#[async_trait]
impl FromRequestParts<AppState> for VerifiedHeaders {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let headers = HeaderParams::from_headers(&parts.headers);
        let (token, key) = both(headers.required("x_token"), headers.required("x_key"))?;

        let security = &state.config.security;
        if token != security.expected_token {
            return Err(ApiError::bad_request("X-Token header invalid"));
        }
        if key != security.expected_key {
            return Err(ApiError::bad_request("X-Key header invalid"));
        }
        Ok(VerifiedHeaders)
    }
}

pub async fn read_verified_items(_verified: VerifiedHeaders) -> Json<Value> {
    Json(json!([{ "item": "Foo" }, { "item": "Bar" }]))
}

/// The session stays open until the response has been produced.
pub async fn read_db(State(state): State<AppState>, db: DbSession) -> ApiResult<Json<Value>> {
    Ok(Json(json!({
        "session_id": db.id(),
        "open_sessions": state.sessions.open_sessions(),
    })))
}

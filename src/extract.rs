//! Request extractors that report failures as validation errors.
//!
//! Path, query, header, cookie and form values are exposed as raw text and
//! parsed by the handler through [`Params`], so every failure carries its
//! location (`["query", "skip"]`, `["header", "x-token"]`, ...).

use std::convert::Infallible;
use std::sync::Arc;

use axum::{
    async_trait,
    body::Bytes,
    extract::{
        rejection::FormRejection, FromRequest, FromRequestParts, Multipart, Path, Query, Request,
    },
    http::{header, request::Parts, HeaderMap, StatusCode},
    Form,
};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::debug;

use crate::error::{ApiError, Loc, ValidationErrors};
use crate::store::SessionTracker;
use crate::validation::{parse_param, Invalid, Schema};
use crate::AppState;

// =============================================================================
// JSON bodies
// =============================================================================

/// Carries the status of an axum rejection into the `{"detail": ...}` envelope.
fn rejected(status: StatusCode, text: String) -> ApiError {
    ApiError::http(status, text)
}

/// Decodes `bytes` as JSON. `None` for an empty body.
fn decode_json(bytes: &[u8]) -> Result<Option<Value>, ValidationErrors> {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Ok(None);
    }

    serde_json::from_slice(bytes).map(Some).map_err(|e| {
        ValidationErrors::single(
            &Loc::body().index(e.column()),
            e.to_string(),
            "value_error.jsondecode",
        )
    })
}

fn missing_body() -> ValidationErrors {
    ValidationErrors::single(&Loc::body(), "field required", "value_error.missing")
}

/// The JSON body with its decoding outcome kept aside, so that a handler can
/// report body errors together with path and query errors. Only failures to
/// read the body at all (oversized, aborted) reject the request.
pub struct JsonPayload(pub Result<Option<Value>, ValidationErrors>);

impl JsonPayload {
    pub fn required<T: Schema>(self) -> Result<T, ValidationErrors> {
        T::from_json(&self.0?.ok_or_else(missing_body)?)
    }

    /// An empty or `null` body is no body.
    pub fn optional<T: Schema>(self) -> Result<Option<T>, ValidationErrors> {
        match self.0? {
            None | Some(Value::Null) => Ok(None),
            Some(value) => T::from_json(&value).map(Some),
        }
    }
}

#[async_trait]
impl<S> FromRequest<S> for JsonPayload
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let bytes = Bytes::from_request(req, state)
            .await
            .map_err(|e| rejected(e.status(), e.body_text()))?;
        Ok(JsonPayload(decode_json(&bytes)))
    }
}

/// A validated JSON body.
pub struct JsonBody<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for JsonBody<T>
where
    T: Schema,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let payload = JsonPayload::from_request(req, state).await?;
        Ok(JsonBody(payload.required()?))
    }
}

/// The decoded but unvalidated JSON body.
pub struct RawJson(pub Value);

#[async_trait]
impl<S> FromRequest<S> for RawJson
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let JsonPayload(payload) = JsonPayload::from_request(req, state).await?;
        Ok(RawJson(payload?.ok_or_else(missing_body)?))
    }
}

// =============================================================================
// Path parameters
// =============================================================================

/// Path segments, with undecodable segments rejected in the JSON envelope.
pub struct PathParam<T>(pub T);

#[async_trait]
impl<S, T> FromRequestParts<S> for PathParam<T>
where
    T: DeserializeOwned + Send,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(value) = Path::<T>::from_request_parts(parts, state)
            .await
            .map_err(|e| rejected(e.status(), e.body_text()))?;
        Ok(PathParam(value))
    }
}

// =============================================================================
// Textual parameters
// =============================================================================

/// Name/value pairs from one request source, in arrival order.
#[derive(Debug, Clone)]
pub struct Params {
    source: &'static str,
    pairs: Vec<(String, String)>,
}

impl Params {
    pub fn new(source: &'static str, pairs: Vec<(String, String)>) -> Self {
        Self { source, pairs }
    }

    pub fn loc(&self, name: &str) -> Loc {
        Loc::root(self.source).key(name)
    }

    /// The last value given for `name`.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.pairs
            .iter()
            .rev()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn get_all(&self, name: &str) -> Vec<String> {
        self.pairs
            .iter()
            .filter(|(k, _)| k == name)
            .map(|(_, v)| v.clone())
            .collect()
    }

    pub fn optional<T>(
        &self,
        name: &str,
        coerce: impl FnOnce(&Value) -> Result<T, Invalid>,
    ) -> Result<Option<T>, ValidationErrors> {
        self.get(name)
            .map(|raw| parse_param(raw, &self.loc(name), coerce))
            .transpose()
    }

    pub fn required<T>(
        &self,
        name: &str,
        coerce: impl FnOnce(&Value) -> Result<T, Invalid>,
    ) -> Result<T, ValidationErrors> {
        self.optional(name, coerce)?.ok_or_else(|| {
            ValidationErrors::single(&self.loc(name), "field required", "value_error.missing")
        })
    }

    pub fn or_default<T>(
        &self,
        name: &str,
        default: T,
        coerce: impl FnOnce(&Value) -> Result<T, Invalid>,
    ) -> Result<T, ValidationErrors> {
        Ok(self.optional(name, coerce)?.unwrap_or(default))
    }
}

/// Query string parameters.
pub struct QueryParams(pub Params);

#[async_trait]
impl<S> FromRequestParts<S> for QueryParams
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Query(pairs) = Query::<Vec<(String, String)>>::from_request_parts(parts, state)
            .await
            .map_err(|e| rejected(e.status(), e.body_text()))?;
        Ok(QueryParams(Params::new("query", pairs)))
    }
}

/// URL-encoded form fields. A request that is not a form has no fields.
pub struct FormFields(pub Params);

#[async_trait]
impl<S> FromRequest<S> for FormFields
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Form::<Vec<(String, String)>>::from_request(req, state).await {
            Ok(Form(pairs)) => Ok(FormFields(Params::new("body", pairs))),
            Err(FormRejection::InvalidFormContentType(_)) => {
                Ok(FormFields(Params::new("body", Vec::new())))
            }
            Err(e) => Err(rejected(e.status(), e.body_text())),
        }
    }
}

/// Cookies of the request.
pub struct Cookies(pub Params);

#[async_trait]
impl<S> FromRequestParts<S> for Cookies
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Cookies::from_headers(&parts.headers))
    }
}

impl Cookies {
    pub fn from_headers(headers: &HeaderMap) -> Self {
        Cookies(Params::new("cookie", parse_cookies(headers)))
    }
}

pub fn parse_cookies(headers: &HeaderMap) -> Vec<(String, String)> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| {
            let (name, value) = pair.split_once('=')?;
            let name = name.trim();
            (!name.is_empty()).then(|| (name.to_string(), value.trim().trim_matches('"').to_string()))
        })
        .collect()
}

/// Request headers, addressed by parameter name: `user_agent` reads the
/// `user-agent` header.
pub struct HeaderParams(pub Params);

#[async_trait]
impl<S> FromRequestParts<S> for HeaderParams
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(HeaderParams::from_headers(&parts.headers))
    }
}

impl HeaderParams {
    pub fn from_headers(headers: &HeaderMap) -> Self {
        let pairs = headers
            .iter()
            .filter_map(|(name, value)| {
                let value = value.to_str().ok()?;
                Some((name.as_str().to_string(), value.to_string()))
            })
            .collect();
        HeaderParams(Params::new("header", pairs))
    }

    pub fn header_name(param: &str) -> String {
        param.replace('_', "-").to_ascii_lowercase()
    }

    pub fn get(&self, param: &str) -> Option<&str> {
        self.0.get(&Self::header_name(param))
    }

    /// Every value of a repeated header.
    pub fn get_all(&self, param: &str) -> Vec<String> {
        self.0.get_all(&Self::header_name(param))
    }

    pub fn required(&self, param: &str) -> Result<String, ValidationErrors> {
        self.0
            .required(&Self::header_name(param), crate::validation::coerce_str)
    }
}

// =============================================================================
// Security
// =============================================================================

/// Token from an `Authorization: Bearer <token>` header.
pub struct BearerToken(pub String);

#[async_trait]
impl<S> FromRequestParts<S> for BearerToken
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let authorization = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(ApiError::not_authenticated)?;

        let (scheme, token) = authorization
            .split_once(' ')
            .ok_or_else(ApiError::not_authenticated)?;
        let token = token.trim();

        if !scheme.eq_ignore_ascii_case("bearer") || token.is_empty() {
            return Err(ApiError::not_authenticated());
        }
        Ok(BearerToken(token.to_string()))
    }
}

// =============================================================================
// Multipart
// =============================================================================

/// One uploaded file.
#[derive(Debug, Clone)]
pub struct UploadFile {
    pub filename: Option<String>,
    pub content_type: Option<String>,
    pub data: Bytes,
}

/// A fully read multipart form: parts with a file name are files, the
/// others are text fields.
#[derive(Debug)]
pub struct MultipartForm {
    files: Vec<(String, UploadFile)>,
    fields: Params,
}

impl Default for MultipartForm {
    fn default() -> Self {
        Self {
            files: Vec::new(),
            fields: Params::new("body", Vec::new()),
        }
    }
}

impl MultipartForm {
    pub fn fields(&self) -> &Params {
        &self.fields
    }

    pub fn files(&self, name: &str) -> Vec<&UploadFile> {
        self.files
            .iter()
            .filter(|(n, _)| n == name)
            .map(|(_, f)| f)
            .collect()
    }

    pub fn required_files(&self, name: &str) -> Result<Vec<&UploadFile>, ValidationErrors> {
        let files = self.files(name);
        if files.is_empty() {
            Err(ValidationErrors::single(
                &self.fields.loc(name),
                "field required",
                "value_error.missing",
            ))
        } else {
            Ok(files)
        }
    }

    pub fn required_file(&self, name: &str) -> Result<&UploadFile, ValidationErrors> {
        self.required_files(name).map(|files| files[0])
    }
}

#[async_trait]
impl<S> FromRequest<S> for MultipartForm
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let mut multipart = match Multipart::from_request(req, state).await {
            Ok(multipart) => multipart,
            Err(rejection) => {
                debug!(reason = %rejection.body_text(), "Request is not a multipart form");
                return Ok(Self::default());
            }
        };

        let mut files = Vec::new();
        let mut fields = Vec::new();
        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| rejected(e.status(), e.body_text()))?
        {
            let name = field.name().unwrap_or_default().to_string();
            let filename = field.file_name().map(str::to_string);
            let content_type = field.content_type().map(str::to_string);
            let data = field
                .bytes()
                .await
                .map_err(|e| rejected(e.status(), e.body_text()))?;

            if filename.is_some() {
                files.push((
                    name,
                    UploadFile {
                        filename,
                        content_type,
                        data,
                    },
                ));
            } else {
                fields.push((name, String::from_utf8_lossy(&data).into_owned()));
            }
        }

        Ok(MultipartForm {
            files,
            fields: Params::new("body", fields),
        })
    }
}

// =============================================================================
// Session dependency
// =============================================================================

/// A database-like session: opened when extracted, closed on drop once
/// the handler has returned.
pub struct DbSession {
    id: u64,
    tracker: Arc<SessionTracker>,
}

impl DbSession {
    pub fn id(&self) -> u64 {
        self.id
    }
}

impl Drop for DbSession {
    fn drop(&mut self) {
        self.tracker.close(self.id);
    }
}

#[async_trait]
impl FromRequestParts<AppState> for DbSession {
    type Rejection = Infallible;

    async fn from_request_parts(
        _parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let tracker = state.sessions.clone();
        let id = tracker.open();
        Ok(DbSession { id, tracker })
    }
}

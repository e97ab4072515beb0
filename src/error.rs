//! API error types and their HTTP rendering.
//!
//! Handlers return [`ApiResult`]; the `IntoResponse` impl is the single
//! place where an error kind becomes a status code and a body.

use std::fmt;

use axum::{
    http::{header, HeaderMap, HeaderName, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use thiserror::Error;

pub type ApiResult<T> = Result<T, ApiError>;

#[derive(Debug, Error)]
pub enum ApiError {
    /// Explicit error raised by handler logic.
    #[error("HTTP {status}: {detail}")]
    Http {
        status: StatusCode,
        detail: Value,
        headers: HeaderMap,
    },

    /// Incoming data did not match the declared shape.
    #[error("validation failed: {0}")]
    Validation(ValidationErrors),

    /// Validation failure that echoes the received body back.
    #[error("validation failed: {errors}")]
    InvalidBody { errors: ValidationErrors, body: Value },

    #[error("internal error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn http(status: StatusCode, detail: impl Into<Value>) -> Self {
        Self::Http {
            status,
            detail: detail.into(),
            headers: HeaderMap::new(),
        }
    }

    pub fn not_found(detail: impl Into<Value>) -> Self {
        Self::http(StatusCode::NOT_FOUND, detail)
    }

    pub fn bad_request(detail: impl Into<Value>) -> Self {
        Self::http(StatusCode::BAD_REQUEST, detail)
    }

    /// The rejection of a missing or malformed bearer token.
    pub fn not_authenticated() -> Self {
        Self::http(StatusCode::UNAUTHORIZED, "Not authenticated")
            .with_header(header::WWW_AUTHENTICATE, HeaderValue::from_static("Bearer"))
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Adds an extra response header. Only meaningful for `Http` errors.
    pub fn with_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        if let Self::Http { headers, .. } = &mut self {
            headers.insert(name, value);
        }
        self
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Http { status, .. } => *status,
            ApiError::Validation(_) | ApiError::InvalidBody { .. } => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn is_server_error(&self) -> bool {
        self.status_code().is_server_error()
    }

    fn report(&self) -> ErrorReport {
        match self {
            ApiError::Http { status, detail, .. } => ErrorReport::Http {
                status: *status,
                detail: detail.clone(),
            },
            ApiError::Validation(errors) | ApiError::InvalidBody { errors, .. } => {
                ErrorReport::Validation(errors.clone())
            }
            ApiError::Internal(_) => ErrorReport::Http {
                status: StatusCode::INTERNAL_SERVER_ERROR,
                detail: Value::from("Internal Server Error"),
            },
        }
    }
}

impl From<ValidationErrors> for ApiError {
    fn from(errors: ValidationErrors) -> Self {
        ApiError::Validation(errors)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        if self.is_server_error() {
            tracing::error!(error = %self, status = %status, "Server error occurred");
        } else {
            tracing::debug!(error = %self, status = %status, "Client error occurred");
        }

        let report = self.report();
        let mut response = match self {
            ApiError::Http {
                detail, headers, ..
            } => {
                let mut response = (status, Json(json!({ "detail": detail }))).into_response();
                response.headers_mut().extend(headers);
                response
            }
            ApiError::Validation(errors) => {
                (status, Json(json!({ "detail": errors.errors }))).into_response()
            }
            ApiError::InvalidBody { errors, body } => (
                status,
                Json(json!({ "detail": errors.errors, "body": body })),
            )
                .into_response(),
            ApiError::Internal(_) => (
                status,
                Json(json!({ "detail": "Internal Server Error" })),
            )
                .into_response(),
        };

        response.extensions_mut().insert(report);
        response
    }
}

/// Attached to every error response so that an override layer can
/// re-render the error in a different representation.
#[derive(Debug, Clone)]
pub enum ErrorReport {
    Http { status: StatusCode, detail: Value },
    Validation(ValidationErrors),
}

// =============================================================================
// Validation errors
// =============================================================================

/// One segment of an error location: an object key or an array index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LocPart {
    Key(String),
    Index(usize),
}

impl fmt::Display for LocPart {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LocPart::Key(key) => f.write_str(key),
            LocPart::Index(index) => write!(f, "{index}"),
        }
    }
}

/// Path from the request source (`body`, `query`, ...) down to a field.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Loc(Vec<LocPart>);

impl Loc {
    pub fn root(source: &str) -> Self {
        Self(vec![LocPart::Key(source.to_string())])
    }

    pub fn body() -> Self {
        Self::root("body")
    }

    pub fn key(&self, key: impl Into<String>) -> Self {
        let mut parts = self.0.clone();
        parts.push(LocPart::Key(key.into()));
        Self(parts)
    }

    pub fn index(&self, index: usize) -> Self {
        let mut parts = self.0.clone();
        parts.push(LocPart::Index(index));
        Self(parts)
    }

    pub fn parts(&self) -> &[LocPart] {
        &self.0
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldError {
    pub loc: Vec<LocPart>,
    pub msg: String,
    #[serde(rename = "type")]
    pub kind: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ValidationErrors {
    pub errors: Vec<FieldError>,
}

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn single(loc: &Loc, msg: impl Into<String>, kind: impl Into<String>) -> Self {
        let mut errors = Self::new();
        errors.add(loc, msg, kind);
        errors
    }

    pub fn add(&mut self, loc: &Loc, msg: impl Into<String>, kind: impl Into<String>) {
        self.errors.push(FieldError {
            loc: loc.parts().to_vec(),
            msg: msg.into(),
            kind: kind.into(),
        });
    }

    pub fn extend(&mut self, other: ValidationErrors) {
        self.errors.extend(other.errors);
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    /// `Ok(value)` when no error was collected.
    pub fn into_result<T>(self, value: T) -> Result<T, ValidationErrors> {
        if self.is_empty() {
            Ok(value)
        } else {
            Err(self)
        }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let count = self.errors.len();
        write!(
            f,
            "{count} validation error{}",
            if count == 1 { "" } else { "s" }
        )?;
        for error in &self.errors {
            let loc = error
                .loc
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(" -> ");
            write!(f, "\n{loc}\n  {} (type={})", error.msg, error.kind)?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationErrors {}

// =============================================================================
// Custom error types
// =============================================================================

/// Application error with its own response mapping, independent of the
/// default envelope.
#[derive(Debug, Error)]
#[error("unicorn {name} misbehaved")]
pub struct UnicornError {
    pub name: String,
}

impl IntoResponse for UnicornError {
    fn into_response(self) -> Response {
        tracing::debug!(name = %self.name, "Unicorn error raised");
        (
            StatusCode::IM_A_TEAPOT,
            Json(json!({
                "message": format!("Oops! {} did something. There goes a rainbow...", self.name)
            })),
        )
            .into_response()
    }
}

//! Re-renders error responses as plain text.
//!
//! Validation failures become `400 Bad Request` with the error list as
//! text; explicit HTTP errors keep their status and headers but carry the
//! bare detail as body.

use axum::{
    extract::Request,
    http::{header, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use serde_json::Value;
use tracing::info;

use crate::error::ErrorReport;

pub async fn plain_text_errors(request: Request, next: Next) -> Response {
    let response = next.run(request).await;
    let Some(report) = response.extensions().get::<ErrorReport>().cloned() else {
        return response;
    };

    let mut headers = response.headers().clone();
    headers.remove(header::CONTENT_TYPE);
    headers.remove(header::CONTENT_LENGTH);

    let mut plain = match report {
        ErrorReport::Validation(errors) => {
            info!("The client sent invalid data: {}", errors);
            (StatusCode::BAD_REQUEST, errors.to_string()).into_response()
        }
        ErrorReport::Http { status, detail } => {
            info!(status = %status, "An HTTP error occurred");
            let text = match detail {
                Value::String(s) => s,
                other => other.to_string(),
            };
            (status, text).into_response()
        }
    };

    plain.headers_mut().extend(headers);
    plain
}

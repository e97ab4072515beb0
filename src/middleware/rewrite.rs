//! Request path rewriting and response marking for the middleware routes.

use axum::{
    extract::Request,
    http::{HeaderName, HeaderValue, Uri},
    middleware::Next,
    response::Response,
};
use tracing::debug;

pub const CUSTOM_HEADER: &str = "x-custom-header";

/// Routes `/api/...` to `/apiv2/...` before the router sees the request.
pub async fn rewrite_api_path(mut request: Request, next: Next) -> Response {
    if let Some(rewritten) = rewrite_uri(request.uri()) {
        debug!(from = %request.uri(), to = %rewritten, "Rewriting request path");
        *request.uri_mut() = rewritten;
    }
    next.run(request).await
}

/// Tags every response passing through.
pub async fn mark_response(request: Request, next: Next) -> Response {
    let mut response = next.run(request).await;
    response
        .headers_mut()
        .insert(HeaderName::from_static(CUSTOM_HEADER), HeaderValue::from_static("Modified"));
    response
}

/// Replaces a leading `api` path segment with `apiv2`, keeping the query.
pub fn rewrite_uri(uri: &Uri) -> Option<Uri> {
    let rest = uri.path().strip_prefix("/api")?;
    if !(rest.is_empty() || rest.starts_with('/')) {
        return None;
    }

    let path_and_query = match uri.query() {
        Some(query) => format!("/apiv2{rest}?{query}"),
        None => format!("/apiv2{rest}"),
    };

    let mut parts = uri.clone().into_parts();
    parts.path_and_query = Some(path_and_query.parse().ok()?);
    Uri::from_parts(parts).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rewrites_leading_api_segment() {
        let uri: Uri = "/api/info?x=1".parse().unwrap();
        assert_eq!(rewrite_uri(&uri).unwrap(), "/apiv2/info?x=1");
    }

    #[test]
    fn test_leaves_other_paths_alone() {
        for raw in ["/info", "/apiv2/info", "/apis/info", "/v1/api/info"] {
            let uri: Uri = raw.parse().unwrap();
            assert!(rewrite_uri(&uri).is_none(), "{raw}");
        }
    }
}

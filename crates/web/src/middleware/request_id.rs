//! Request ID middleware for request tracing and correlation.
//!
//! Every request gets an ID: the upstream `x-request-id` header when a proxy
//! set one, otherwise a fresh UUID v4. The ID is recorded on the request span
//! built by [`make_request_span`], tagged on the Sentry scope and echoed back
//! in the response headers.

use axum::{
    extract::Request,
    http::{HeaderValue, Request as HttpRequest},
    middleware::Next,
    response::Response,
};
use tracing::Span;
use uuid::Uuid;

/// The HTTP header name for request IDs.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Span factory for `TraceLayer` declaring the `request_id` field up front.
pub fn make_request_span<B>(request: &HttpRequest<B>) -> Span {
    tracing::info_span!(
        "request",
        method = %request.method(),
        path = %request.uri().path(),
        request_id = tracing::field::Empty,
    )
}

/// Use the incoming ID when it is a sane header value, otherwise mint one.
fn resolve_request_id(incoming: Option<&HeaderValue>) -> String {
    incoming
        .and_then(|h| h.to_str().ok())
        .map(str::trim)
        .filter(|id| !id.is_empty() && id.len() <= 128)
        .map_or_else(|| Uuid::new_v4().to_string(), String::from)
}

/// Middleware that ensures every request has a unique request ID.
pub async fn request_id_middleware(request: Request, next: Next) -> Response {
    let request_id = resolve_request_id(request.headers().get(REQUEST_ID_HEADER));

    Span::current().record("request_id", request_id.as_str());

    sentry::configure_scope(|scope| {
        scope.set_tag("request_id", &request_id);
    });

    let mut response = next.run(request).await;

    if let Ok(value) = HeaderValue::from_str(&request_id) {
        response.headers_mut().insert(REQUEST_ID_HEADER, value);
    }

    response
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_keeps_upstream_id() {
        let header = HeaderValue::from_static("cf-1234");
        assert_eq!(resolve_request_id(Some(&header)), "cf-1234");
    }

    #[test]
    fn test_generates_uuid_when_missing_or_blank() {
        let generated = resolve_request_id(None);
        assert!(Uuid::parse_str(&generated).is_ok());

        let blank = HeaderValue::from_static("   ");
        assert!(Uuid::parse_str(&resolve_request_id(Some(&blank))).is_ok());
    }
}

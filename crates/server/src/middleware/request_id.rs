//! Request ID middleware for request tracing and correlation.
//!
//! Reuses an inbound `x-request-id` when it looks sane, otherwise mints a
//! UUID v4. The ID is recorded in the current span, tagged on the Sentry
//! scope, stored in request extensions and echoed in the response.

use axum::{extract::Request, http::HeaderValue, middleware::Next, response::Response};
use tracing::Span;
use uuid::Uuid;

/// The HTTP header name for request IDs.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Longest inbound request ID that is trusted.
const MAX_REQUEST_ID_LENGTH: usize = 128;

/// The ID assigned to the current request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestId(pub String);

fn inbound_id(request: &Request) -> Option<String> {
    let value = request.headers().get(REQUEST_ID_HEADER)?.to_str().ok()?;
    let value = value.trim();
    let acceptable = !value.is_empty()
        && value.len() <= MAX_REQUEST_ID_LENGTH
        && value
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || matches!(b, b'-' | b'_' | b'.'));
    acceptable.then(|| value.to_owned())
}

/// Middleware that ensures every request has a request ID.
pub async fn request_id_middleware(mut request: Request, next: Next) -> Response {
    let request_id = inbound_id(&request).unwrap_or_else(|| Uuid::new_v4().to_string());

    Span::current().record("request_id", &request_id);

    sentry::configure_scope(|scope| {
        scope.set_tag("request_id", &request_id);
    });

    request
        .extensions_mut()
        .insert(RequestId(request_id.clone()));

    let mut response = next.run(request).await;

    if let Ok(value) = HeaderValue::from_str(&request_id) {
        response.headers_mut().insert(REQUEST_ID_HEADER, value);
    }

    response
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::body::Body;

    use super::*;

    fn request(id: Option<&str>) -> Request {
        let mut builder = Request::builder().uri("/health");
        if let Some(id) = id {
            builder = builder.header(REQUEST_ID_HEADER, id);
        }
        builder.body(Body::empty()).unwrap()
    }

    #[test]
    fn test_inbound_id_kept_when_sane() {
        assert_eq!(
            inbound_id(&request(Some("cf-8a1b2c.3"))).as_deref(),
            Some("cf-8a1b2c.3")
        );
    }

    #[test]
    fn test_inbound_id_rejected_when_odd() {
        assert!(inbound_id(&request(None)).is_none());
        assert!(inbound_id(&request(Some("  "))).is_none());
        assert!(inbound_id(&request(Some("has space"))).is_none());
        assert!(inbound_id(&request(Some(&"a".repeat(200)))).is_none());
    }
}

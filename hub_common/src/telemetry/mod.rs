//! # Request Telemetry
//!
//! The HTTP layer opens (or inherits) a span per request and calls
//! [`record_http_request`] before handing off to the route. Attributes are only
//! attached when a subscriber is actually interested in the span.

use tracing::field::Empty;
use tracing::Span;

/// Attribute key for the request method.
pub const HTTP_METHOD: &str = "http.method";
/// Attribute key for the request path.
pub const HTTP_PATH: &str = "http.path";

/// Opens an `http.request` span with empty method/path slots.
pub fn request_span(method: &str, path: &str) -> Span {
    let span = tracing::info_span!("http.request", "http.method" = Empty, "http.path" = Empty);
    record_http_request(&span, method, path);
    span
}

/// Fills `http.method` and `http.path` on `span`.
///
/// Returns `false` without touching the span when it is disabled.
pub fn record_http_request(span: &Span, method: &str, path: &str) -> bool {
    if span.is_disabled() {
        return false;
    }
    span.record(HTTP_METHOD, method);
    span.record(HTTP_PATH, path);
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn disabled_span_is_left_alone() {
        let span = Span::none();
        assert!(!record_http_request(&span, "GET", "/api/v1/repeaters"));
    }

    #[test]
    fn enabled_span_gets_attributes() {
        tracing::subscriber::with_default(tracing_subscriber::registry(), || {
            let span = request_span("POST", "/api/v1/users/login");
            assert!(!span.is_disabled());
            assert!(record_http_request(&span, "POST", "/api/v1/users/login"));
        });
    }
}

//! Request ID middleware.
//!
//! Each inbound request gets an `X-Request-ID`, taken from the caller when
//! they send a usable one and generated (UUID v4) otherwise. The handler runs
//! inside a span carrying the ID, so probe logs can be tied back to the
//! request that triggered them, and the ID is echoed on the response.

use axum::{
    extract::Request,
    http::{HeaderName, HeaderValue},
    middleware::Next,
    response::Response,
};
use tracing::Instrument as _;
use uuid::Uuid;

pub static X_REQUEST_ID: HeaderName = HeaderName::from_static("x-request-id");

/// Axum middleware that tags every request with an ID.
///
/// Apply it **inside** `tower_http::trace::TraceLayer` so its span nests under
/// the HTTP span.
pub async fn request_id_middleware(req: Request, next: Next) -> Response {
    let id = req
        .headers()
        .get(&X_REQUEST_ID)
        .filter(|v| !v.is_empty())
        .cloned()
        .unwrap_or_else(fresh_id);

    let span = tracing::debug_span!("request", id = %log_id(&id));
    let mut response = next.run(req).instrument(span).await;
    response.headers_mut().insert(X_REQUEST_ID.clone(), id);
    response
}

fn fresh_id() -> HeaderValue {
    HeaderValue::from_str(&Uuid::new_v4().to_string())
        .expect("a hyphenated UUID is a valid header value")
}

/// The ID as plain text for log fields. Opaque (non-visible-ASCII) IDs log
/// as empty but are still echoed back unchanged.
fn log_id(id: &HeaderValue) -> &str {
    id.to_str().unwrap_or("")
}

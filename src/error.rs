//! HTTP error type for the `/proxy-check` handler.
//!
//! Probe failures are not errors (they become [`crate::checker::Outcome`]
//! data). The only thing a caller can get wrong is the request itself, and
//! that is answered with a bare status code and no body.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};

/// Request-level failures surfaced to the HTTP client.
#[derive(Debug, thiserror::Error)]
pub enum CheckError {
    /// No non-empty `url` query parameter was supplied.
    #[error("missing `url` query parameter")]
    MissingUrl,
}

impl CheckError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::MissingUrl => StatusCode::BAD_REQUEST,
        }
    }
}

impl IntoResponse for CheckError {
    fn into_response(self) -> Response {
        tracing::debug!(error = %self, "rejecting check request");
        self.status().into_response()
    }
}

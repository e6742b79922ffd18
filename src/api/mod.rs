//! HTTP surface of proxy-check.
//!
//! Dispatch is a plain route table: `/proxy-check` goes to the liveness
//! handler, and everything else falls through to static file serving over the
//! document root.

use std::{path::Path, sync::Arc};

use axum::{routing::get, Router};
use tower_http::services::ServeDir;

use crate::checker::LivenessChecker;

pub mod check;
pub mod request_id;

/// Path of the liveness-check endpoint. Matched exactly.
pub const CHECK_PATH: &str = "/proxy-check";

/// Shared state injected into handlers via [`axum::extract::State`].
///
/// Nothing in here is mutated after startup; requests never share state
/// beyond the probe client's connection pool.
pub struct AppState {
    pub checker: LivenessChecker,
}

impl AppState {
    pub fn new(checker: LivenessChecker) -> Self {
        Self { checker }
    }
}

/// Build the application router.
///
/// Unknown paths are answered by [`ServeDir`]: file bytes with a content type
/// inferred from the extension, byte-range support, `index.html` for
/// directories, and 404 when nothing matches.
pub fn router(state: Arc<AppState>, doc_root: &Path) -> Router {
    Router::new()
        .route(CHECK_PATH, get(check::proxy_check))
        .fallback_service(ServeDir::new(doc_root))
        .with_state(state)
}

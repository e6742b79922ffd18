//! `GET /proxy-check?url=<target>` — report whether a remote URL is live.
//!
//! The handler only translates HTTP concerns. Everything about the probe
//! itself lives in [`crate::checker`].

use std::sync::Arc;

use axum::{
    extract::{rejection::QueryRejection, Query, State},
    http::header,
    response::IntoResponse,
    Json,
};
use tracing::info;

use super::AppState;
use crate::error::CheckError;

/// Name of the query parameter carrying the target URL.
const URL_PARAM: &str = "url";

/// Probe the `url` query parameter and answer with
/// `{"live": <bool>, "status": <int|string>}`.
///
/// The response is readable from any origin. A missing or blank `url` is a
/// 400 with an empty body.
pub async fn proxy_check(
    State(state): State<Arc<AppState>>,
    query: Result<Query<Vec<(String, String)>>, QueryRejection>,
) -> Result<impl IntoResponse, CheckError> {
    let params = query.map(|Query(params)| params).unwrap_or_default();
    let url = target_url(&params).ok_or(CheckError::MissingUrl)?;

    let result = state.checker.check(url).await;
    info!(url, ?result, "liveness check");

    Ok((
        [(header::ACCESS_CONTROL_ALLOW_ORIGIN, "*")],
        Json(result),
    ))
}

/// First non-empty `url` value, in query-string order.
///
/// Blank values are skipped, so `?url=&url=x` checks `x` and `?url=` counts
/// as missing.
fn target_url(params: &[(String, String)]) -> Option<&str> {
    params
        .iter()
        .filter(|(key, _)| key == URL_PARAM)
        .map(|(_, value)| value.as_str())
        .find(|value| !value.is_empty())
}

//! Outbound liveness probe.
//!
//! A [`LivenessChecker`] issues a single `GET` to a target URL while
//! presenting a desktop-browser `User-Agent`, then reduces whatever happened to
//! an [`Outcome`]. Failures never escape as errors: a probe always yields a
//! [`CheckResult`] that can be handed straight back to the caller.
//!
//! Classification:
//!
//! | What happened                                      | `live`  | `status`              |
//! |----------------------------------------------------|---------|-----------------------|
//! | final response in `200..400`                       | `true`  | the code              |
//! | final response outside `200..400`                  | `false` | the code              |
//! | redirect loop or chain too long                    | `false` | the last 3xx code     |
//! | no response (DNS, refused, TLS, timeout, bad URL)  | `false` | `"Connection Failed"` |
//!
//! Redirects are followed by the client; the final hop is what gets classified.
//! A chain is cut short after [`MAX_REDIRECTS`] hops, or once the same URL has
//! been requested [`MAX_REPEATS`] times, and the redirect that was refused is
//! reported with its own code. There are no retries.

use std::ops::Range;

use anyhow::Context;
use reqwest::{header, redirect, Client, Response, StatusCode};
use serde::{Serialize, Serializer};
use tracing::debug;

use crate::config::CheckerConfig;

/// Status codes that count as "live".
const LIVE_STATUS: Range<u16> = 200..400;

/// Redirects followed before a chain is cut short.
pub const MAX_REDIRECTS: usize = 10;

/// Times a single URL may appear in one chain before it counts as a loop.
pub const MAX_REPEATS: usize = 4;

/// Sentinel reported when no HTTP response was obtained at all.
pub const CONNECTION_FAILED: &str = "Connection Failed";

/// What a single probe observed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The remote answered with a status in `200..400`.
    Success(u16),
    /// The remote answered, but with a status outside `200..400`.
    RemoteError(u16),
    /// No HTTP response was obtained.
    ConnectionFailure,
}

impl Outcome {
    /// Classify a status code from a response that actually arrived.
    pub fn from_status(code: u16) -> Self {
        if LIVE_STATUS.contains(&code) {
            Self::Success(code)
        } else {
            Self::RemoteError(code)
        }
    }
}

/// The `status` field of a [`CheckResult`]: a real HTTP code or a sentinel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Code(u16),
    ConnectionFailed,
}

impl Serialize for Status {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Code(code) => serializer.serialize_u16(*code),
            Self::ConnectionFailed => serializer.serialize_str(CONNECTION_FAILED),
        }
    }
}

/// JSON body returned by `/proxy-check`.
///
/// Only constructible from an [`Outcome`], so `live == true` always comes with
/// a numeric status in `200..400`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CheckResult {
    live: bool,
    status: Status,
}

impl From<Outcome> for CheckResult {
    fn from(outcome: Outcome) -> Self {
        match outcome {
            Outcome::Success(code) => Self {
                live: true,
                status: Status::Code(code),
            },
            Outcome::RemoteError(code) => Self {
                live: false,
                status: Status::Code(code),
            },
            Outcome::ConnectionFailure => Self {
                live: false,
                status: Status::ConnectionFailed,
            },
        }
    }
}

/// Issues liveness probes with a fixed identity and timeout.
///
/// Holds one [`reqwest::Client`] for the lifetime of the server; the client is
/// internally reference-counted and safe to use from concurrent handlers.
#[derive(Debug, Clone)]
pub struct LivenessChecker {
    client: Client,
}

impl LivenessChecker {
    /// Build a checker from the given settings.
    ///
    /// The `User-Agent` is installed as a default header and the timeout bounds
    /// the whole exchange, redirects included.
    pub fn new(cfg: &CheckerConfig) -> anyhow::Result<Self> {
        let mut headers = header::HeaderMap::new();
        headers.insert(
            header::USER_AGENT,
            header::HeaderValue::from_str(&cfg.user_agent)
                .context("invalid User-Agent header value")?,
        );

        let client = Client::builder()
            .default_headers(headers)
            .redirect(redirect_policy())
            .timeout(cfg.timeout)
            .build()
            .context("building reqwest client")?;

        Ok(Self { client })
    }

    /// Probe `url` and shape the outcome for the JSON response.
    pub async fn check(&self, url: &str) -> CheckResult {
        self.probe(url).await.into()
    }

    /// Send one `GET` to `url` and classify what came back.
    ///
    /// The body is never read: the response is dropped as soon as the status
    /// line and headers are in.
    #[tracing::instrument(skip(self), level = "debug")]
    pub async fn probe(&self, url: &str) -> Outcome {
        let outcome = match self.client.get(url).send().await {
            Ok(response) if is_refused_redirect(&response) => {
                debug!(status = %response.status(), final_url = %response.url(), "redirect chain cut short");
                Outcome::RemoteError(response.status().as_u16())
            }
            Ok(response) => Outcome::from_status(response.status().as_u16()),
            Err(e) => {
                debug!(error = %e, timeout = e.is_timeout(), "probe got no response");
                Outcome::ConnectionFailure
            }
        };
        debug!(?outcome, "probe finished");
        outcome
    }
}

/// Follow redirects until the chain loops or grows past [`MAX_REDIRECTS`].
///
/// A stopped chain hands back the 3xx response itself rather than an error.
fn redirect_policy() -> redirect::Policy {
    redirect::Policy::custom(|attempt| {
        let repeats = attempt
            .previous()
            .iter()
            .filter(|seen| *seen == attempt.url())
            .count();
        if attempt.previous().len() > MAX_REDIRECTS || repeats >= MAX_REPEATS {
            attempt.stop()
        } else {
            attempt.follow()
        }
    })
}

/// A followable redirect that came back to us was refused by [`redirect_policy`].
fn is_refused_redirect(response: &Response) -> bool {
    matches!(
        response.status(),
        StatusCode::MOVED_PERMANENTLY
            | StatusCode::FOUND
            | StatusCode::SEE_OTHER
            | StatusCode::TEMPORARY_REDIRECT
            | StatusCode::PERMANENT_REDIRECT
    ) && response.headers().contains_key(header::LOCATION)
}

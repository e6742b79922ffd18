//! Server configuration for proxy-check.
//!
//! The only externally supplied value is the listening port, read from the
//! `PORT` environment variable (as set by most PaaS hosts). Every other knob is
//! fixed, but still carried in [`Config`] so the server is built from an
//! explicit value instead of process-wide state.
//!
//! An unparsable `PORT` is rejected with a clear error rather than silently
//! falling back to the default.

use std::{
    net::{IpAddr, Ipv4Addr, SocketAddr},
    path::PathBuf,
    time::Duration,
};

use anyhow::Context;

/// Environment variable holding the listening port.
pub const PORT_ENV: &str = "PORT";

/// Port used when `PORT` is unset or empty.
pub const DEFAULT_PORT: u16 = 8000;

/// Upper bound on a single liveness probe.
pub const CHECK_TIMEOUT: Duration = Duration::from_secs(10);

/// Identity presented to remote hosts. Some hosts refuse requests that don't
/// look like they came from a desktop browser.
pub const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
     AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// Top-level server configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Port to listen on (default: 8000).
    pub port: u16,

    /// Address to bind (always `0.0.0.0`).
    pub bind_ip: IpAddr,

    /// Directory served for every path other than `/proxy-check`.
    pub doc_root: PathBuf,

    /// Set `SO_REUSEADDR` on the listening socket so a restarted server can
    /// rebind while old connections sit in `TIME_WAIT`.
    pub reuse_address: bool,

    pub checker: CheckerConfig,
}

/// Settings for the outbound liveness probe.
#[derive(Debug, Clone)]
pub struct CheckerConfig {
    /// Total time allowed for a probe, redirects included.
    pub timeout: Duration,

    /// Value of the `User-Agent` header on every probe.
    pub user_agent: String,
}

impl Default for CheckerConfig {
    fn default() -> Self {
        Self {
            timeout: CHECK_TIMEOUT,
            user_agent: BROWSER_USER_AGENT.to_string(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            bind_ip: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            doc_root: PathBuf::from("."),
            reuse_address: true,
            checker: CheckerConfig::default(),
        }
    }
}

impl Config {
    /// Build the config from the process environment.
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the config from an arbitrary variable lookup.
    ///
    /// Split out from [`Config::from_env`] so tests never have to mutate the
    /// real environment.
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let port = match lookup(PORT_ENV).map(|v| v.trim().to_string()) {
            Some(raw) if !raw.is_empty() => raw
                .parse::<u16>()
                .with_context(|| format!("invalid {PORT_ENV} value `{raw}`"))?,
            _ => DEFAULT_PORT,
        };

        Ok(Self {
            port,
            ..Self::default()
        })
    }

    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.bind_ip, self.port)
    }
}

use std::{net::SocketAddr, sync::Arc};

use anyhow::Context;
use tokio::{
    net::{TcpListener, TcpSocket},
    signal,
};
use tracing::info;

mod api;
mod checker;
mod config;
mod error;

use checker::LivenessChecker;
use config::Config;

/// Pending connections the kernel queues before `accept`.
const LISTEN_BACKLOG: u32 = 1024;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialise tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "proxy_check=info,tower_http=warn".into()),
        )
        .init();

    let config = Config::from_env().context("loading configuration")?;
    let checker = LivenessChecker::new(&config.checker).context("building liveness checker")?;
    let state = Arc::new(api::AppState::new(checker));

    let trace_layer = tower_http::trace::TraceLayer::new_for_http()
        .make_span_with(tower_http::trace::DefaultMakeSpan::new().level(tracing::Level::INFO))
        .on_response(tower_http::trace::DefaultOnResponse::new().level(tracing::Level::INFO));

    let app = api::router(state, &config.doc_root)
        .layer(axum::middleware::from_fn(api::request_id::request_id_middleware))
        .layer(trace_layer);

    let listener = bind(&config)?;
    info!(
        addr = %config.socket_addr(),
        doc_root = %config.doc_root.display(),
        "proxy-check listening"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    info!("server stopped");
    Ok(())
}

/// Open the listening socket with the options from `config`.
fn bind(config: &Config) -> anyhow::Result<TcpListener> {
    let addr = config.socket_addr();
    let socket = match addr {
        SocketAddr::V4(_) => TcpSocket::new_v4(),
        SocketAddr::V6(_) => TcpSocket::new_v6(),
    };
    let socket = socket.context("creating listening socket")?;

    socket
        .set_reuseaddr(config.reuse_address)
        .context("setting SO_REUSEADDR")?;
    socket
        .bind(addr)
        .with_context(|| format!("binding {addr}"))?;
    socket
        .listen(LISTEN_BACKLOG)
        .with_context(|| format!("listening on {addr}"))
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c().await.expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    info!("shutdown signal received");
}

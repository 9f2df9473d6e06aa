// ABOUTME: PTY host serving terminal sessions over WebSocket
// Each connection to /ws gets its own child process in a fresh pseudo-terminal

pub mod error;
pub mod pty;
pub mod session;

pub use error::ServerError;
pub use pty::{PtyCommand, PtyProcess};

use crate::bridge::endpoint::SESSION_PATH;
use crate::bridge::Geometry;
use crate::config::ServerConfig;
use axum::extract::{RawQuery, State, WebSocketUpgrade};
use axum::response::Response;
use axum::routing::get;
use axum::Router;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::info;

/// Bind to the configured address and serve until the process is stopped.
pub async fn run(config: ServerConfig) -> Result<(), ServerError> {
    let addr: SocketAddr = config
        .bind
        .parse()
        .map_err(|_| ServerError::InvalidBind(config.bind.clone()))?;
    let listener = TcpListener::bind(addr).await?;
    info!("Session host listening on http://{}", listener.local_addr()?);
    serve(listener, config).await
}

/// Serve sessions on an already bound listener.
pub async fn serve(listener: TcpListener, config: ServerConfig) -> Result<(), ServerError> {
    axum::serve(listener, router(config).into_make_service()).await?;
    Ok(())
}

pub fn router(config: ServerConfig) -> Router {
    Router::new()
        .route("/", get(|| async { "OK" }))
        .route(SESSION_PATH, get(upgrade))
        .with_state(Arc::new(config))
}

async fn upgrade(
    ws: WebSocketUpgrade,
    RawQuery(query): RawQuery,
    State(config): State<Arc<ServerConfig>>,
) -> Response {
    let command = session_command(&config, query.as_deref());
    ws.on_upgrade(move |socket| session::relay(socket, command))
}

/// Build the command for one session, appending forwarded query keys.
pub fn session_command(config: &ServerConfig, query: Option<&str>) -> PtyCommand {
    let mut args = config.args.clone();
    args.extend(forwarded_args(&config.forward_query, query));

    PtyCommand {
        program: config.command.clone(),
        args,
        term: config.term.clone(),
        size: Geometry::new(config.cols, config.rows),
    }
}

/// `--key=value` for every allowed key present in `query`, in allowlist order.
/// Only the first occurrence of a key counts; empty values are skipped.
pub fn forwarded_args(allowed: &[String], query: Option<&str>) -> Vec<String> {
    let Some(query) = query else {
        return Vec::new();
    };
    let pairs: Vec<(String, String)> = url::form_urlencoded::parse(query.as_bytes())
        .into_owned()
        .collect();

    allowed
        .iter()
        .filter_map(|key| {
            pairs
                .iter()
                .find(|(k, _)| k == key)
                .filter(|(_, v)| !v.is_empty())
                .map(|(k, v)| format!("--{k}={v}"))
        })
        .collect()
}

//! HTTP/WebSocket surface and server assembly.
//!
//! The routing layer is thin: `/` serves the bundled viewer page, `/ws`
//! upgrades into a session task. Everything stateful lives behind the
//! registry; one watch channel stops the broadcaster, every session, and
//! the listener together.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use axum::{
    extract::{State, WebSocketUpgrade},
    response::{Html, IntoResponse},
    routing::get,
    Router,
};
use futures_util::StreamExt;
use orbit_shared::config::ServerConfig;
use tokio::{net::TcpListener, sync::watch};
use tracing::info;

use crate::{
    broadcast::Broadcaster,
    registry::WorldRegistry,
    session::run_session,
    ws::{WsFeed, WsLink},
};

/// Bundled canvas viewer for browsers.
static INDEX_HTML: &str = include_str!("../assets/index.html");

/// Shared handles for the router.
#[derive(Clone)]
struct AppState {
    registry: Arc<WorldRegistry>,
    shutdown: watch::Receiver<bool>,
}

/// The assembled server: registry, broadcaster, HTTP surface.
pub struct OrbitServer {
    cfg: ServerConfig,
    registry: Arc<WorldRegistry>,
    listener: TcpListener,
    shutdown_tx: watch::Sender<bool>,
    shutdown_rx: watch::Receiver<bool>,
}

impl OrbitServer {
    /// Binds the listener; the world starts empty.
    pub async fn bind(cfg: ServerConfig) -> anyhow::Result<Self> {
        let addr: SocketAddr = cfg.listen_addr.parse().context("parse listen_addr")?;
        let listener = TcpListener::bind(addr).await.context("tcp bind")?;
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        Ok(Self {
            cfg,
            registry: Arc::new(WorldRegistry::new()),
            listener,
            shutdown_tx,
            shutdown_rx,
        })
    }

    /// Returns the local address (after binding).
    pub fn local_addr(&self) -> anyhow::Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// The world registry, shared with every task.
    pub fn registry(&self) -> Arc<WorldRegistry> {
        self.registry.clone()
    }

    /// Handle that stops the broadcaster, every session, and the listener.
    pub fn shutdown_handle(&self) -> watch::Sender<bool> {
        self.shutdown_tx.clone()
    }

    /// Serves until the stop signal fires; the broadcaster runs alongside.
    pub async fn run(self) -> anyhow::Result<()> {
        let state = AppState {
            registry: self.registry.clone(),
            shutdown: self.shutdown_rx.clone(),
        };
        let app = router(state);

        let broadcaster = Broadcaster::new(self.registry.clone(), self.cfg.tick_hz);
        let bcast = tokio::spawn(broadcaster.run(self.shutdown_rx.clone()));

        info!(
            addr = %self.listener.local_addr().context("local addr")?,
            tick_hz = self.cfg.tick_hz,
            "serving"
        );

        let mut shutdown = self.shutdown_rx;
        axum::serve(self.listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown.changed().await;
            })
            .await
            .context("serve")?;

        bcast.await.context("join broadcast loop")?;
        Ok(())
    }
}

fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/ws", get(ws_upgrade))
        .with_state(state)
}

async fn index() -> Html<&'static str> {
    Html(INDEX_HTML)
}

async fn ws_upgrade(State(state): State<AppState>, ws: WebSocketUpgrade) -> impl IntoResponse {
    ws.on_upgrade(move |socket| async move {
        let (sink, stream) = socket.split();
        run_session(
            state.registry,
            Box::new(WsLink::new(sink)),
            WsFeed::new(stream),
            state.shutdown,
        )
        .await;
    })
}

/// Helper for tests: bind to an ephemeral port.
pub async fn bind_ephemeral(tick_hz: u32) -> anyhow::Result<(OrbitServer, ServerConfig)> {
    let cfg = ServerConfig {
        listen_addr: "127.0.0.1:0".to_string(),
        tick_hz,
    };
    let server = OrbitServer::bind(cfg.clone()).await?;
    let mut cfg = cfg;
    cfg.listen_addr = server.local_addr()?.to_string();
    Ok((server, cfg))
}

//! Standalone server binary.
//!
//! Usage:
//!   cargo run -p orbit_server -- [--addr 127.0.0.1:8080] [--tick-hz 60]
//!
//! Serves the viewer page on `/` and the world feed on `/ws`, and runs the
//! fixed timestep gravity loop until Ctrl-C.

use std::env;

use anyhow::Context;
use orbit_server::server::OrbitServer;
use orbit_shared::config::ServerConfig;
use tracing::info;

fn parse_args() -> ServerConfig {
    let mut cfg = ServerConfig::default();
    let args: Vec<String> = env::args().collect();
    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--addr" if i + 1 < args.len() => {
                cfg.listen_addr = args[i + 1].clone();
                i += 2;
            }
            "--tick-hz" if i + 1 < args.len() => {
                cfg.tick_hz = args[i + 1].parse().unwrap_or(60);
                i += 2;
            }
            _ => i += 1,
        }
    }
    cfg
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .init();

    let cfg = parse_args();
    info!(addr = %cfg.listen_addr, tick_hz = cfg.tick_hz, "starting server");

    let server = OrbitServer::bind(cfg).await.context("bind server")?;
    let local = server.local_addr()?;
    info!(%local, "server listening");

    let stop = server.shutdown_handle();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("ctrl-c received, shutting down");
            let _ = stop.send(true);
        }
    });

    server.run().await
}

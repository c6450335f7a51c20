//! WebSocket adapters.
//!
//! Bridges axum's socket halves onto the transport seam: the sink becomes
//! the session's outbound link (held by the registry for fan-out), the
//! stream becomes its liveness feed.

use anyhow::Context;
use async_trait::async_trait;
use axum::extract::ws::{Message, WebSocket};
use futures_util::{
    stream::{SplitSink, SplitStream},
    SinkExt, StreamExt,
};
use orbit_shared::net::{Inbound, Outbound};

/// Outbound link over one WebSocket.
pub struct WsLink {
    sink: SplitSink<WebSocket, Message>,
}

impl WsLink {
    pub fn new(sink: SplitSink<WebSocket, Message>) -> Self {
        Self { sink }
    }
}

#[async_trait]
impl Outbound for WsLink {
    async fn send_text(&mut self, payload: &str) -> anyhow::Result<()> {
        self.sink
            .send(Message::Text(payload.to_owned()))
            .await
            .context("websocket write")
    }

    async fn close(&mut self) {
        let _ = self.sink.close().await;
    }
}

/// Liveness feed over one WebSocket.
pub struct WsFeed {
    stream: SplitStream<WebSocket>,
}

impl WsFeed {
    pub fn new(stream: SplitStream<WebSocket>) -> Self {
        Self { stream }
    }
}

#[async_trait]
impl Inbound for WsFeed {
    async fn recv(&mut self) -> anyhow::Result<()> {
        match self.stream.next().await {
            Some(Ok(Message::Close(_))) => Err(anyhow::anyhow!("peer closed")),
            Some(Ok(_)) => Ok(()),
            Some(Err(error)) => Err(error).context("websocket read"),
            None => Err(anyhow::anyhow!("websocket ended")),
        }
    }
}

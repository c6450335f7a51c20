//! Transport seam and wire payloads.
//!
//! Goals:
//! - Keep the broadcast payload shape explicit and versionable.
//! - Put traits at the transport boundary so the simulation can be driven
//!   and observed without sockets.

use anyhow::Context;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use crate::entity::Entity;

/// Broadcast payload fanned out once per tick.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WorldUpdate {
    pub entities: Vec<Entity>,
}

/// Encodes one update as the JSON text frame clients parse.
pub fn encode_update(update: &WorldUpdate) -> anyhow::Result<String> {
    serde_json::to_string(update).context("serialize world update")
}

/// Outbound half of one session's transport.
#[async_trait]
pub trait Outbound: Send {
    /// Writes one text frame to the peer.
    async fn send_text(&mut self, payload: &str) -> anyhow::Result<()>;

    /// Closes the transport. Failures are not meaningful past this point.
    async fn close(&mut self) {}
}

/// Inbound half of one session's transport.
///
/// Payload content is never interpreted; `recv` only reports liveness.
#[async_trait]
pub trait Inbound: Send {
    /// Waits for the next inbound frame. `Err` means the peer is gone.
    async fn recv(&mut self) -> anyhow::Result<()>;
}

/// Outbound link backed by an unbounded in-process channel.
///
/// Stands in for a socket in tests and headless tooling: the link is handed
/// to the registry, the receiver half observes every broadcast frame.
pub struct ChannelLink {
    tx: mpsc::UnboundedSender<String>,
}

/// Creates a channel link plus the receiving end for its frames.
pub fn channel_link() -> (ChannelLink, mpsc::UnboundedReceiver<String>) {
    let (tx, rx) = mpsc::unbounded_channel();
    (ChannelLink { tx }, rx)
}

#[async_trait]
impl Outbound for ChannelLink {
    async fn send_text(&mut self, payload: &str) -> anyhow::Result<()> {
        self.tx
            .send(payload.to_owned())
            .map_err(|_| anyhow::anyhow!("channel link receiver dropped"))
    }
}

/// Inbound feed backed by an unbounded in-process channel.
///
/// Dropping the sender half ends the session the way a socket close would.
pub struct ChannelFeed {
    rx: mpsc::UnboundedReceiver<()>,
}

/// Creates a channel feed plus the sending end that keeps it alive.
pub fn channel_feed() -> (mpsc::UnboundedSender<()>, ChannelFeed) {
    let (tx, rx) = mpsc::unbounded_channel();
    (tx, ChannelFeed { rx })
}

#[async_trait]
impl Inbound for ChannelFeed {
    async fn recv(&mut self) -> anyhow::Result<()> {
        self.rx
            .recv()
            .await
            .ok_or_else(|| anyhow::anyhow!("feed closed"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::Vec2;

    #[test]
    fn update_wire_casing_is_stable() {
        let update = WorldUpdate {
            entities: vec![Entity::spawned(
                "1700000000000000000".to_string(),
                Vec2::new(1.5, -2.0),
            )],
        };
        let json = encode_update(&update).unwrap();
        assert_eq!(
            json,
            r#"{"entities":[{"ID":"1700000000000000000","Position":{"X":1.5,"Y":-2.0},"Velocity":{"X":0.0,"Y":0.0},"Connected":true}]}"#
        );
    }

    #[test]
    fn update_roundtrips() {
        let update = WorldUpdate {
            entities: vec![Entity::spawned("7".to_string(), Vec2::new(0.25, 64.0))],
        };
        let back: WorldUpdate = serde_json::from_str(&encode_update(&update).unwrap()).unwrap();
        assert_eq!(back, update);
    }

    #[tokio::test]
    async fn channel_link_delivers_then_fails_without_receiver() {
        let (mut link, mut rx) = channel_link();
        link.send_text("frame").await.unwrap();
        assert_eq!(rx.recv().await.unwrap(), "frame");

        drop(rx);
        assert!(link.send_text("frame").await.is_err());
    }

    #[tokio::test]
    async fn channel_feed_errors_once_sender_is_gone() {
        let (tx, mut feed) = channel_feed();
        tx.send(()).unwrap();
        assert!(feed.recv().await.is_ok());

        drop(tx);
        assert!(feed.recv().await.is_err());
    }
}

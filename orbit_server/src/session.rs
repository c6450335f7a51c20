//! Session lifecycle.
//!
//! One task per session. The inbound read loop exists solely to observe
//! liveness; payloads are accepted and discarded. Deregistration here is
//! the only path that removes an entity from the registry; a failed
//! broadcast write alone never does.

use std::sync::Arc;

use orbit_shared::net::{Inbound, Outbound};
use tokio::sync::watch;
use tracing::{debug, info};

use crate::registry::{SessionId, WorldRegistry};

/// Per-session lifecycle states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Transport accepted, not yet in the world.
    Connecting,
    /// Registered and receiving broadcasts.
    Active,
    /// Liveness lost, removal in progress.
    Disconnecting,
    /// Deregistered, transport closed.
    Removed,
}

/// Binds one transport to one registry entry for the transport's lifetime.
pub async fn run_session<I>(
    registry: Arc<WorldRegistry>,
    link: Box<dyn Outbound>,
    mut feed: I,
    mut shutdown: watch::Receiver<bool>,
) where
    I: Inbound,
{
    let session = SessionId::new_unique();
    let mut state = SessionState::Connecting;
    debug!(session = ?session, state = ?state, "session opened");

    let entity = registry.register(session, link).await;
    state = SessionState::Active;
    info!(session = ?session, entity = %entity.id, "session active");

    while state == SessionState::Active {
        tokio::select! {
            _ = shutdown.changed() => {
                debug!(session = ?session, "session stopping on shutdown signal");
                state = SessionState::Disconnecting;
            }
            frame = feed.recv() => {
                // Inbound payloads are never interpreted; only their
                // absence matters.
                if let Err(error) = frame {
                    debug!(session = ?session, error = %error, "session read ended");
                    state = SessionState::Disconnecting;
                }
            }
        }
    }

    registry.deregister(session).await;
    state = SessionState::Removed;
    info!(session = ?session, state = ?state, "session removed");
}

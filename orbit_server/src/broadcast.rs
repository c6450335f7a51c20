//! Broadcast scheduler.
//!
//! One long-lived task drives the fixed-rate tick: integrate, snapshot,
//! serialize, fan out. The whole tick runs under a single registry lock
//! acquisition, so joins and leaves never interleave with it. Fan-out is
//! sequential under that lock; one slow link stalls the tick for everyone.

use std::sync::Arc;
use std::time::Duration;

use orbit_shared::{
    net::{encode_update, WorldUpdate},
    physics::{self, TIME_STEP},
};
use tokio::{
    sync::watch,
    time::{self, MissedTickBehavior},
};
use tracing::{debug, info, warn};

use crate::registry::WorldRegistry;

/// Fixed-rate world tick driver.
pub struct Broadcaster {
    registry: Arc<WorldRegistry>,
    tick_hz: u32,
}

impl Broadcaster {
    pub fn new(registry: Arc<WorldRegistry>, tick_hz: u32) -> Self {
        Self { registry, tick_hz }
    }

    /// Runs ticks until the stop signal fires.
    pub async fn run(self, mut shutdown: watch::Receiver<bool>) {
        let period = Duration::from_secs_f64(1.0 / f64::from(self.tick_hz));
        let mut timer = time::interval(period);
        // A stalled tick resumes at the normal cadence, never bursts to
        // catch up.
        timer.set_missed_tick_behavior(MissedTickBehavior::Delay);

        info!(tick_hz = self.tick_hz, "broadcast loop started");
        loop {
            tokio::select! {
                _ = shutdown.changed() => {
                    info!("broadcast loop stopping");
                    break;
                }
                _ = timer.tick() => self.tick().await,
            }
        }
    }

    /// One tick: physics, snapshot, serialize, fan out.
    pub async fn tick(&self) {
        let mut state = self.registry.lock().await;

        state.mutate_all(|entity| {
            if entity.connected {
                physics::integrate(entity, TIME_STEP);
            }
        });

        // Ghosts are snapshotted too; only removal hides an entity.
        let update = WorldUpdate {
            entities: state.snapshot(),
        };
        let payload = match encode_update(&update) {
            Ok(payload) => payload,
            Err(error) => {
                // The physics step stays applied; only this broadcast is
                // lost.
                warn!(error = %error, "snapshot serialization failed, skipping broadcast");
                return;
            }
        };

        let state = &mut *state;
        for (session, entity) in state.entities.iter_mut() {
            if !entity.connected {
                continue;
            }
            let Some(link) = state.links.get_mut(session) else {
                continue;
            };
            if let Err(error) = link.send_text(&payload).await {
                // The entity lingers until its own read loop deregisters it.
                debug!(
                    session = ?session,
                    entity = %entity.id,
                    error = %error,
                    "broadcast write failed, marking disconnected"
                );
                entity.connected = false;
            }
        }
    }
}

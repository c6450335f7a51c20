//! World registry.
//!
//! Single point of mutation for the whole world: one exclusive lock guards
//! the session → entity mapping and the outbound links broadcasts are
//! written to. Sessions join and leave concurrently with the broadcast
//! loop; the lock serializes them. No finer-grained locking; the expected
//! entity population is small.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use orbit_shared::{entity::Entity, net::Outbound, physics};
use tokio::sync::{Mutex, MutexGuard};
use tracing::debug;

/// Opaque handle tying one network session to its registry entry.
///
/// Transport identity stays out of the map key: the session object owns the
/// socket, the registry entry owns simulation state, and this id links them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionId(pub u64);

static NEXT_SESSION_ID: AtomicU64 = AtomicU64::new(1);

impl SessionId {
    pub fn new_unique() -> Self {
        SessionId(NEXT_SESSION_ID.fetch_add(1, Ordering::Relaxed))
    }
}

/// Source of entity ids. Injectable so tests can mint deterministic,
/// collision-free ids.
pub trait IdSource: Send + Sync {
    fn mint(&self) -> String;
}

/// Wall-clock nanosecond ids. Collisions under extreme registration rates
/// are theoretically possible and accepted.
pub struct ClockIds;

impl IdSource for ClockIds {
    fn mint(&self) -> String {
        chrono::Utc::now()
            .timestamp_nanos_opt()
            .unwrap_or_default()
            .to_string()
    }
}

/// Monotonic counter ids, deterministic and collision-free.
pub struct CounterIds(AtomicU64);

impl CounterIds {
    pub fn new() -> Self {
        Self(AtomicU64::new(1))
    }
}

impl Default for CounterIds {
    fn default() -> Self {
        Self::new()
    }
}

impl IdSource for CounterIds {
    fn mint(&self) -> String {
        self.0.fetch_add(1, Ordering::Relaxed).to_string()
    }
}

/// Everything the registry lock guards. The two maps stay in lockstep: a
/// session is present in both or neither.
pub(crate) struct WorldState {
    pub(crate) entities: HashMap<SessionId, Entity>,
    pub(crate) links: HashMap<SessionId, Box<dyn Outbound>>,
}

impl WorldState {
    pub(crate) fn mutate_all(&mut self, mut f: impl FnMut(&mut Entity)) {
        for entity in self.entities.values_mut() {
            f(entity);
        }
    }

    pub(crate) fn snapshot(&self) -> Vec<Entity> {
        self.entities.values().cloned().collect()
    }
}

/// Concurrency-safe registry; the single source of truth for world state.
pub struct WorldRegistry {
    state: Mutex<WorldState>,
    ids: Box<dyn IdSource>,
}

impl WorldRegistry {
    pub fn new() -> Self {
        Self::with_ids(Box::new(ClockIds))
    }

    /// Registry with an injected id source.
    pub fn with_ids(ids: Box<dyn IdSource>) -> Self {
        Self {
            state: Mutex::new(WorldState {
                entities: HashMap::new(),
                links: HashMap::new(),
            }),
            ids,
        }
    }

    /// Admits a session: fresh id, random orbit spawn, zero velocity.
    /// Registration never fails.
    pub async fn register(&self, session: SessionId, link: Box<dyn Outbound>) -> Entity {
        let entity = Entity::spawned(
            self.ids.mint(),
            physics::random_orbit_position(&mut rand::thread_rng()),
        );
        let mut state = self.state.lock().await;
        state.entities.insert(session, entity.clone());
        state.links.insert(session, link);
        debug!(
            session = ?session,
            entity = %entity.id,
            population = state.entities.len(),
            "entity registered"
        );
        entity
    }

    /// Drops a session's entity and closes its link. Idempotent.
    pub async fn deregister(&self, session: SessionId) {
        let mut state = self.state.lock().await;
        let entity = state.entities.remove(&session);
        if let Some(mut link) = state.links.remove(&session) {
            link.close().await;
        }
        if let Some(entity) = entity {
            debug!(
                session = ?session,
                entity = %entity.id,
                population = state.entities.len(),
                "entity removed"
            );
        }
    }

    /// Every registered entity, ghosts included.
    pub async fn snapshot(&self) -> Vec<Entity> {
        self.state.lock().await.snapshot()
    }

    /// Applies a transform to every registered entity in place.
    pub async fn mutate_all(&self, f: impl FnMut(&mut Entity)) {
        self.state.lock().await.mutate_all(f);
    }

    /// One guard for a whole broadcast tick.
    pub(crate) async fn lock(&self) -> MutexGuard<'_, WorldState> {
        self.state.lock().await
    }
}

impl Default for WorldRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use orbit_shared::physics::{MAX_DISTANCE, MIN_DISTANCE};
    use std::collections::HashSet;
    use std::sync::Arc;

    struct SilentLink;

    #[async_trait]
    impl Outbound for SilentLink {
        async fn send_text(&mut self, _payload: &str) -> anyhow::Result<()> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn register_spawns_at_rest_inside_band() {
        let registry = WorldRegistry::with_ids(Box::new(CounterIds::new()));
        let entity = registry
            .register(SessionId::new_unique(), Box::new(SilentLink))
            .await;

        assert!(entity.connected);
        assert_eq!(entity.velocity, orbit_shared::math::Vec2::ZERO);
        let r = entity.position.length();
        assert!(r > MIN_DISTANCE - 1e-9 && r < MAX_DISTANCE + 1e-9);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_registrations_never_share_ids() {
        let registry = Arc::new(WorldRegistry::with_ids(Box::new(CounterIds::new())));

        let mut handles = Vec::new();
        for _ in 0..32 {
            let registry = registry.clone();
            handles.push(tokio::spawn(async move {
                registry
                    .register(SessionId::new_unique(), Box::new(SilentLink))
                    .await
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        let snapshot = registry.snapshot().await;
        assert_eq!(snapshot.len(), 32);
        let ids: HashSet<_> = snapshot.iter().map(|e| e.id.clone()).collect();
        assert_eq!(ids.len(), 32);
    }

    #[tokio::test]
    async fn deregister_is_idempotent() {
        let registry = WorldRegistry::with_ids(Box::new(CounterIds::new()));
        let session = SessionId::new_unique();
        registry.register(session, Box::new(SilentLink)).await;
        assert_eq!(registry.snapshot().await.len(), 1);

        registry.deregister(session).await;
        registry.deregister(session).await;
        assert!(registry.snapshot().await.is_empty());

        // A handle that was never registered is also a no-op.
        registry.deregister(SessionId::new_unique()).await;
    }

    #[tokio::test]
    async fn mutate_all_touches_every_entity() {
        let registry = WorldRegistry::with_ids(Box::new(CounterIds::new()));
        for _ in 0..3 {
            registry
                .register(SessionId::new_unique(), Box::new(SilentLink))
                .await;
        }

        registry.mutate_all(|e| e.connected = false).await;
        assert!(registry.snapshot().await.iter().all(|e| !e.connected));
    }

    #[test]
    fn session_ids_are_process_unique() {
        let a = SessionId::new_unique();
        let b = SessionId::new_unique();
        assert_ne!(a, b);
    }
}

//! Full world-flow integration: sessions join over in-process links, the
//! broadcaster ticks, snapshots fan out, disconnects prune the world.

use std::sync::Arc;
use std::time::Duration;

use orbit_server::{
    registry::{CounterIds, WorldRegistry},
    session::run_session,
    Broadcaster,
};
use orbit_shared::net::{channel_feed, channel_link, WorldUpdate};
use tokio::sync::watch;

async fn wait_for_population(registry: &WorldRegistry, want: usize) {
    for _ in 0..200 {
        if registry.snapshot().await.len() == want {
            return;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    panic!("world never reached population {want}");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn sessions_receive_snapshots_until_disconnect() -> anyhow::Result<()> {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("info")
        .with_test_writer()
        .try_init();

    let registry = Arc::new(WorldRegistry::with_ids(Box::new(CounterIds::new())));
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    // Two sessions join over in-process transports.
    let (link_a, mut rx_a) = channel_link();
    let (feed_a_tx, feed_a) = channel_feed();
    let task_a = tokio::spawn(run_session(
        registry.clone(),
        Box::new(link_a),
        feed_a,
        shutdown_rx.clone(),
    ));

    let (link_b, mut rx_b) = channel_link();
    let (_feed_b_tx, feed_b) = channel_feed();
    let task_b = tokio::spawn(run_session(
        registry.clone(),
        Box::new(link_b),
        feed_b,
        shutdown_rx.clone(),
    ));

    wait_for_population(&registry, 2).await;

    // Drive ticks directly so the flow is deterministic.
    let broadcaster = Broadcaster::new(registry.clone(), 60);
    broadcaster.tick().await;
    broadcaster.tick().await;

    let first: WorldUpdate = serde_json::from_str(&rx_a.recv().await.unwrap())?;
    let second: WorldUpdate = serde_json::from_str(&rx_a.recv().await.unwrap())?;
    assert_eq!(first.entities.len(), 2);
    assert_eq!(second.entities.len(), 2);

    // Gravity moved every entity between the two ticks.
    for entity in &first.entities {
        let later = second
            .entities
            .iter()
            .find(|e| e.id == entity.id)
            .expect("entity present in both snapshots");
        assert_ne!(later.position, entity.position);
    }
    assert!(rx_b.recv().await.is_some());

    // Inbound frames are ignored but keep the session alive.
    feed_a_tx.send(())?;
    broadcaster.tick().await;
    assert!(rx_a.recv().await.is_some());

    // Closing a's feed removes its entity; b keeps receiving.
    drop(feed_a_tx);
    task_a.await?;
    wait_for_population(&registry, 1).await;

    while rx_b.try_recv().is_ok() {}
    broadcaster.tick().await;
    let after: WorldUpdate = serde_json::from_str(&rx_b.recv().await.unwrap())?;
    assert_eq!(after.entities.len(), 1);

    // The stop signal ends the remaining session.
    shutdown_tx.send(true)?;
    task_b.await?;
    assert!(registry.snapshot().await.is_empty());
    Ok(())
}

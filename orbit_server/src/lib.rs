//! `orbit_server`
//!
//! Server-side systems:
//! - World registry under one exclusive lock
//! - Fixed timestep gravity integration
//! - Periodic snapshot broadcast to every live session
//! - Per-session liveness loop
//!
//! Networking model:
//! - HTTP: serves the browser viewer page
//! - WebSocket: one persistent session per client; JSON snapshots out,
//!   inbound frames observed only for liveness

pub mod broadcast;
pub mod registry;
pub mod server;
pub mod session;
pub mod ws;

pub use broadcast::Broadcaster;
pub use registry::WorldRegistry;
pub use server::OrbitServer;

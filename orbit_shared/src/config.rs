//! Configuration system.
//!
//! Loads server configuration from JSON strings (file IO left to the app).

use serde::{Deserialize, Serialize};

/// Root server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Listen address, e.g. `127.0.0.1:8080`.
    #[serde(default = "default_listen_addr")]
    pub listen_addr: String,
    /// Fixed broadcast tick rate.
    #[serde(default = "default_tick_hz")]
    pub tick_hz: u32,
}

fn default_listen_addr() -> String {
    "127.0.0.1:8080".to_string()
}

fn default_tick_hz() -> u32 {
    60
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: default_listen_addr(),
            tick_hz: default_tick_hz(),
        }
    }
}

impl ServerConfig {
    /// Parses config from JSON.
    pub fn from_json_str(s: &str) -> serde_json::Result<Self> {
        serde_json::from_str(s)
    }
}

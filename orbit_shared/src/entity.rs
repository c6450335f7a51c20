//! Entity model.
//!
//! One entity per connected session. The struct doubles as the wire record;
//! serde renames pin the exported field casing clients already parse, while
//! the containing `entities` array key stays lower-case.

use serde::{Deserialize, Serialize};

use crate::math::Vec2;

/// One simulated point mass.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Entity {
    /// Unique per session, minted at registration time.
    #[serde(rename = "ID")]
    pub id: String,
    #[serde(rename = "Position")]
    pub position: Vec2,
    #[serde(rename = "Velocity")]
    pub velocity: Vec2,
    /// True while the session is considered live for broadcast purposes.
    #[serde(rename = "Connected")]
    pub connected: bool,
}

impl Entity {
    /// A freshly registered entity: at rest at `position`, live for
    /// broadcast.
    pub fn spawned(id: String, position: Vec2) -> Self {
        Self {
            id,
            position,
            velocity: Vec2::ZERO,
            connected: true,
        }
    }
}

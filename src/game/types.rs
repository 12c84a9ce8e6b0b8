//! Arena Data Model
//!
//! Game-phase records. Positions are world units with the origin at the
//! top-left corner of the arena.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::core::ids::PlayerId;

/// Game-phase player.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerState {
    /// Connection handle.
    pub id: PlayerId,
    /// X position, kept within `[radius, width - radius]`.
    pub x: f32,
    /// Y position, kept within `[radius, height - radius]`.
    pub y: f32,
    /// Assigned color (0xRRGGBB).
    pub color: u32,
    /// Display name.
    pub name: String,
    /// Accumulated collectible value.
    pub score: u32,
}

/// Latched directional input. Last write wins.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerInput {
    /// Move toward -x.
    #[serde(default)]
    pub left: bool,
    /// Move toward +x.
    #[serde(default)]
    pub right: bool,
    /// Move toward -y.
    #[serde(default)]
    pub up: bool,
    /// Move toward +y.
    #[serde(default)]
    pub down: bool,
}

impl PlayerInput {
    /// Whether no direction is held.
    pub fn is_idle(&self) -> bool {
        !(self.left || self.right || self.up || self.down)
    }
}

/// Scoring pickup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Collectible {
    /// Unique within its room.
    pub id: String,
    /// X position.
    pub x: f32,
    /// Y position.
    pub y: f32,
    /// Points awarded on pickup, 1..=3.
    pub value: u32,
}

/// Immutable copy of a room, sent to joining clients.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameSnapshot {
    /// Players keyed by id.
    pub players: BTreeMap<PlayerId, PlayerState>,
    /// Live collectibles in id order.
    pub collectibles: Vec<Collectible>,
}

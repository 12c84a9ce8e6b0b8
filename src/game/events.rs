//! Game Events
//!
//! Per-tick deltas produced by `GameRoom`, in emission order.

use crate::core::ids::PlayerId;
use crate::game::types::Collectible;

/// Room delta.
#[derive(Debug, Clone, PartialEq)]
pub enum RoomEvent {
    /// A player's position changed this tick.
    PlayerMoved {
        /// Mover.
        id: PlayerId,
        /// New x.
        x: f32,
        /// New y.
        y: f32,
    },

    /// A player's score changed; carries the new total.
    PlayerScored {
        /// Scorer.
        id: PlayerId,
        /// New total.
        score: u32,
    },

    /// A replacement collectible appeared.
    CollectibleSpawned(Collectible),

    /// A collectible was picked up.
    CollectibleCollected {
        /// Id of the removed collectible.
        id: String,
    },
}

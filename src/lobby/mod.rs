//! Lobby Module
//!
//! Pre-game matchmaking: seats, host authority, readiness and map choice.
//!
//! ## Module Structure
//!
//! - `types`: Lobby, slot and player records plus the listing summary
//! - `maps`: Canonical map catalog
//! - `logic`: Pure transitions over a single lobby
//! - `manager`: All lobbies and the player -> lobby index
//! - `events`: Notifications queued by the manager
//! - `error`: User-facing error taxonomy

pub mod error;
pub mod events;
pub mod logic;
pub mod manager;
pub mod maps;
pub mod types;

// Re-export key types
pub use error::LobbyError;
pub use events::{Audience, LobbyEvent};
pub use manager::{GameStart, JoinOutcome, LeaveOutcome, LobbyManager, ReadyOutcome};
pub use maps::{map_exists, MapInfo, ALL_MAPS};
pub use types::{LobbySlot, LobbyState, LobbyStatus, LobbySummary, PlayerInfo};

//! Core primitives shared by the lobby and game layers.
//!
//! Nothing in here touches the network or a clock.

pub mod config;
pub mod ids;
pub mod rng;

// Re-export core types
pub use config::{GameConfig, MAX_PLAYERS_PER_LOBBY};
pub use ids::{generate_id, LobbyId, PlayerId};
pub use rng::ArenaRng;

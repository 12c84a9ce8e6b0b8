//! Game Logic Module
//!
//! Arena simulation for an active session.
//!
//! ## Module Structure
//!
//! - `types`: Player, input, collectible and snapshot records
//! - `logic`: Movement, collision and collectible placement
//! - `room`: Stateful tick simulation
//! - `events`: Per-tick deltas

pub mod events;
pub mod logic;
pub mod room;
pub mod types;

// Re-export key types
pub use events::RoomEvent;
pub use room::GameRoom;
pub use types::{Collectible, GameSnapshot, PlayerInput, PlayerState};

//! # Lobby Arena Server
//!
//! Authoritative server for a small multiplayer arena: clients gather in
//! four-seat lobbies, the host starts a game, and a fixed-tick room
//! simulates movement and collectible pickups.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    LOBBY ARENA SERVER                        │
//! ├─────────────────────────────────────────────────────────────┤
//! │  core/           - Shared primitives                         │
//! │  ├── config.rs   - Tunables (world size, speeds, palette)    │
//! │  ├── ids.rs      - Player and lobby identifiers              │
//! │  └── rng.rs      - Seeded Xorshift128+ PRNG                  │
//! │                                                              │
//! │  lobby/          - Pre-game state machine                    │
//! │  ├── types.rs    - Lobby, slot and summary records           │
//! │  ├── maps.rs     - Map catalog                               │
//! │  ├── logic.rs    - Pure single-lobby transitions             │
//! │  ├── manager.rs  - All lobbies + player index                │
//! │  ├── events.rs   - Lifecycle notifications                   │
//! │  └── error.rs    - User-facing errors                        │
//! │                                                              │
//! │  game/           - Arena simulation                          │
//! │  ├── types.rs    - Player, input, collectible, snapshot      │
//! │  ├── logic.rs    - Movement, collision, spawning             │
//! │  ├── room.rs     - Tick simulation                           │
//! │  └── events.rs   - Per-tick deltas                           │
//! │                                                              │
//! │  network/        - Networking (async)                        │
//! │  ├── server.rs   - WebSocket gateway                         │
//! │  ├── protocol.rs - Message types                             │
//! │  └── session.rs  - Per-room tick tasks                       │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Ownership
//!
//! Lobby state has a single owner (`LobbyManager`) and every game room is
//! owned by exactly one session task. Other layers only ever see
//! snapshots and ids.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod core;
pub mod game;
pub mod lobby;
pub mod network;

// Re-export commonly used types
pub use crate::core::config::{GameConfig, MAX_PLAYERS_PER_LOBBY};
pub use crate::core::rng::ArenaRng;
pub use crate::game::room::GameRoom;
pub use crate::lobby::error::LobbyError;
pub use crate::lobby::manager::LobbyManager;
pub use crate::network::server::{GameServer, ServerConfig};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

//! Network Layer
//!
//! WebSocket gateway and per-room session tasks. Everything here is
//! async; lobby and game state live in `lobby/` and `game/`.

pub mod protocol;
pub mod server;
pub mod session;

pub use protocol::{ClientMessage, ServerMessage};
pub use server::{GameServer, GameServerError, ServerConfig, FREE_PLAY_ROOM};
pub use session::{spawn_room_session, RoomCommand, RoomHandle};

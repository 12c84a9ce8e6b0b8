//! Lobby Events
//!
//! Notifications queued by `LobbyManager` for the gateway to fan out.

use crate::core::ids::{LobbyId, PlayerId};
use crate::lobby::types::{LobbySummary, PlayerInfo};

/// Who should receive an event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Audience {
    /// Every connected client (lobby browser updates).
    Everyone,
    /// Current members of one lobby.
    Lobby(LobbyId),
}

/// Lobby lifecycle and room-scoped notifications.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LobbyEvent {
    /// A lobby appeared.
    Created(LobbySummary),
    /// A lobby's listing changed.
    Updated(LobbySummary),
    /// A lobby emptied and was deleted.
    Removed(LobbySummary),
    /// Someone took a seat.
    PlayerJoined {
        /// Lobby the seat belongs to.
        lobby_id: LobbyId,
        /// Seat index.
        slot: usize,
        /// New occupant.
        player: PlayerInfo,
    },
    /// Someone left a seat.
    PlayerLeft {
        /// Lobby the seat belongs to.
        lobby_id: LobbyId,
        /// Vacated seat index.
        slot: usize,
        /// Former occupant.
        player_id: PlayerId,
    },
    /// A seat's ready flag flipped.
    ReadyChanged {
        /// Lobby the seat belongs to.
        lobby_id: LobbyId,
        /// Seat index.
        slot: usize,
        /// New flag.
        ready: bool,
    },
    /// The host picked another map.
    MapChanged {
        /// Affected lobby.
        lobby_id: LobbyId,
        /// Newly selected map.
        map_id: String,
    },
    /// Host authority moved.
    HostChanged {
        /// Affected lobby.
        lobby_id: LobbyId,
        /// Occupant of the lowest remaining seat.
        new_host_id: PlayerId,
    },
    /// Start accepted; the roster follows.
    GameStarting {
        /// Starting lobby.
        lobby_id: LobbyId,
    },
    /// Handoff to a game room.
    GameStarted {
        /// Started lobby, also the room key.
        lobby_id: LobbyId,
        /// Map the room runs on.
        map_id: String,
        /// Roster in slot order.
        players: Vec<PlayerInfo>,
    },
}

impl LobbyEvent {
    /// Recipients of this event.
    pub fn audience(&self) -> Audience {
        match self {
            LobbyEvent::Created(_) | LobbyEvent::Updated(_) | LobbyEvent::Removed(_) => Audience::Everyone,
            LobbyEvent::PlayerJoined { lobby_id, .. }
            | LobbyEvent::PlayerLeft { lobby_id, .. }
            | LobbyEvent::ReadyChanged { lobby_id, .. }
            | LobbyEvent::MapChanged { lobby_id, .. }
            | LobbyEvent::HostChanged { lobby_id, .. }
            | LobbyEvent::GameStarting { lobby_id }
            | LobbyEvent::GameStarted { lobby_id, .. } => Audience::Lobby(lobby_id.clone()),
        }
    }
}

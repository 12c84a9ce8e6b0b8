//! Lobby error taxonomy.
//!
//! Every variant is user-facing: its message goes back to the requester only
//! and the lobby state is left untouched.

/// Errors from lobby operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LobbyError {
    /// Requester is already registered in some lobby.
    #[error("Player already in a lobby")]
    AlreadyInLobby,

    /// Requester is not registered in any lobby.
    #[error("Player not in a lobby")]
    NotInLobby,

    /// Target lobby id is unknown.
    #[error("Lobby not found")]
    LobbyNotFound,

    /// Lobby is no longer waiting for players.
    #[error("Lobby is not accepting players")]
    NotAcceptingPlayers,

    /// Player already holds a seat in this lobby.
    #[error("Player already in lobby")]
    PlayerAlreadyInLobby,

    /// No free seat.
    #[error("Lobby is full")]
    LobbyFull,

    /// Player holds no seat in this lobby.
    #[error("Player not in lobby")]
    PlayerNotInLobby,

    /// The host is always counted ready.
    #[error("Host does not need to ready up")]
    HostCannotReady,

    /// Host-only action attempted by someone else.
    #[error("Only host can {0}")]
    NotHost(&'static str),

    /// Map id is not in the catalog.
    #[error("Invalid map id")]
    InvalidMapId,

    /// Lobby already left the waiting state.
    #[error("Game already starting or in progress")]
    AlreadyStarted,

    /// No occupied seats.
    #[error("Not enough players")]
    NoPlayers,

    /// Some non-host seat is not ready.
    #[error("Not all players are ready")]
    PlayersNotReady,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages() {
        assert_eq!(LobbyError::LobbyFull.to_string(), "Lobby is full");
        assert_eq!(
            LobbyError::NotHost("select map").to_string(),
            "Only host can select map"
        );
        assert_eq!(
            LobbyError::HostCannotReady.to_string(),
            "Host does not need to ready up"
        );
    }
}

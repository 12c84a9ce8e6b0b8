//! Lobby Data Model
//!
//! A lobby is four fixed seats, one host, a selected map and a status.

use serde::{Deserialize, Serialize};

use crate::core::config::MAX_PLAYERS_PER_LOBBY;
use crate::core::ids::{LobbyId, PlayerId};

/// Lobby-phase identity of a player.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerInfo {
    /// Connection handle.
    pub id: PlayerId,
    /// Display name.
    pub name: String,
    /// Assigned color (0xRRGGBB).
    pub color: u32,
    /// Index of the slot this player occupies.
    pub slot: usize,
}

/// One seat in a lobby.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LobbySlot {
    /// Occupant, if any.
    pub player: Option<PlayerInfo>,
    /// Readiness. Ignored for the host's slot.
    pub ready: bool,
}

impl LobbySlot {
    /// Seat holding `player`, not ready.
    pub fn occupied(player: PlayerInfo) -> Self {
        Self {
            player: Some(player),
            ready: false,
        }
    }

    /// Whether the seat is free.
    pub fn is_empty(&self) -> bool {
        self.player.is_none()
    }

    /// Whether the seat holds `player_id`.
    pub fn holds(&self, player_id: &str) -> bool {
        self.player.as_ref().is_some_and(|p| p.id == player_id)
    }
}

/// Lobby lifecycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LobbyStatus {
    /// Accepting players.
    #[default]
    Waiting,
    /// Reserved; no transition produces it.
    Countdown,
    /// Game started, lobby closed to joins.
    InGame,
}

/// Full state of one lobby.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LobbyState {
    /// Lobby id.
    pub id: LobbyId,
    /// Display name.
    pub name: String,
    /// Occupant with authority over map and start.
    pub host_id: PlayerId,
    /// Always an id from the map catalog.
    pub selected_map_id: String,
    /// Lifecycle status.
    pub status: LobbyStatus,
    /// Seats in index order.
    pub slots: [LobbySlot; MAX_PLAYERS_PER_LOBBY],
}

impl LobbyState {
    /// Slot index holding `player_id`.
    pub fn slot_of(&self, player_id: &str) -> Option<usize> {
        self.slots.iter().position(|s| s.holds(player_id))
    }

    /// The host's record, if the host still occupies a seat.
    pub fn host(&self) -> Option<&PlayerInfo> {
        self.slots
            .iter()
            .filter_map(|s| s.player.as_ref())
            .find(|p| p.id == self.host_id)
    }
}

/// Listing entry broadcast to every client browsing lobbies.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LobbySummary {
    /// Lobby id.
    pub id: LobbyId,
    /// Display name.
    pub name: String,
    /// Host display name ("Unknown" once the host is gone).
    pub host_display_name: String,
    /// Occupied seats.
    pub player_count: usize,
    /// Seat count.
    pub max_players: usize,
    /// Selected map.
    pub selected_map_id: String,
    /// Lifecycle status.
    pub status: LobbyStatus,
}

impl From<&LobbyState> for LobbySummary {
    fn from(state: &LobbyState) -> Self {
        Self {
            id: state.id.clone(),
            name: state.name.clone(),
            host_display_name: state
                .host()
                .map(|p| p.name.clone())
                .unwrap_or_else(|| "Unknown".to_string()),
            player_count: state.slots.iter().filter(|s| !s.is_empty()).count(),
            max_players: MAX_PLAYERS_PER_LOBBY,
            selected_map_id: state.selected_map_id.clone(),
            status: state.status,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn player(id: &str, slot: usize) -> PlayerInfo {
        PlayerInfo {
            id: id.to_string(),
            name: id.to_uppercase(),
            color: 0,
            slot,
        }
    }

    fn lobby() -> LobbyState {
        LobbyState {
            id: "lobby_1".to_string(),
            name: "Fun".to_string(),
            host_id: "a".to_string(),
            selected_map_id: "grasslands".to_string(),
            status: LobbyStatus::Waiting,
            slots: [
                LobbySlot::occupied(player("a", 0)),
                LobbySlot::default(),
                LobbySlot::occupied(player("b", 2)),
                LobbySlot::default(),
            ],
        }
    }

    #[test]
    fn test_slot_lookup() {
        let state = lobby();
        assert_eq!(state.slot_of("a"), Some(0));
        assert_eq!(state.slot_of("b"), Some(2));
        assert_eq!(state.slot_of("c"), None);
        assert_eq!(state.host().map(|p| p.name.as_str()), Some("A"));
    }

    #[test]
    fn test_summary() {
        let summary = LobbySummary::from(&lobby());
        assert_eq!(summary.host_display_name, "A");
        assert_eq!(summary.player_count, 2);
        assert_eq!(summary.max_players, 4);
    }

    #[test]
    fn test_wire_shape() {
        let json = serde_json::to_value(LobbySummary::from(&lobby())).unwrap();
        assert_eq!(json["hostDisplayName"], "A");
        assert_eq!(json["maxPlayers"], 4);
        assert_eq!(json["status"], "waiting");

        let mut state = lobby();
        state.status = LobbyStatus::InGame;
        let json = serde_json::to_value(&state).unwrap();
        assert_eq!(json["status"], "in_game");
        assert_eq!(json["slots"].as_array().unwrap().len(), 4);
        assert!(json["slots"][1]["player"].is_null());
    }
}

//! Lobby Transitions
//!
//! Pure functions over a single `LobbyState`. They know nothing about other
//! lobbies; the cross-lobby "one seat per player" rule belongs to the manager.
//! On `Err` the lobby is left exactly as it was.

use crate::core::config::MAX_PLAYERS_PER_LOBBY;
use crate::core::ids::{LobbyId, PlayerId};
use crate::lobby::error::LobbyError;
use crate::lobby::maps::{default_map_id, map_exists};
use crate::lobby::types::{LobbySlot, LobbyState, LobbyStatus, PlayerInfo};

/// Result of removing a player.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Removal {
    /// Slot that was cleared.
    pub removed_slot: usize,
    /// New host when the host left; `None` if the host stayed or nobody remains.
    pub new_host_id: Option<PlayerId>,
}

/// Build a fresh lobby with `host` in slot 0.
pub fn create_lobby_state(id: LobbyId, name: String, mut host: PlayerInfo) -> LobbyState {
    host.slot = 0;
    let host_id = host.id.clone();
    let mut slots: [LobbySlot; MAX_PLAYERS_PER_LOBBY] = std::array::from_fn(|_| LobbySlot::default());
    slots[0] = LobbySlot::occupied(host);

    LobbyState {
        id,
        name,
        host_id,
        selected_map_id: default_map_id().to_string(),
        status: LobbyStatus::Waiting,
        slots,
    }
}

/// Lowest-indexed free seat.
pub fn find_empty_slot(state: &LobbyState) -> Option<usize> {
    state.slots.iter().position(LobbySlot::is_empty)
}

/// Seat `player` in the lowest free slot. Returns the slot index.
pub fn add_player_to_lobby(state: &mut LobbyState, mut player: PlayerInfo) -> Result<usize, LobbyError> {
    if state.status != LobbyStatus::Waiting {
        return Err(LobbyError::NotAcceptingPlayers);
    }
    if state.slot_of(&player.id).is_some() {
        return Err(LobbyError::PlayerAlreadyInLobby);
    }
    let slot = find_empty_slot(state).ok_or(LobbyError::LobbyFull)?;

    player.slot = slot;
    state.slots[slot] = LobbySlot::occupied(player);
    Ok(slot)
}

/// Clear `player_id`'s seat, passing host to the lowest occupied slot if needed.
pub fn remove_player_from_lobby(state: &mut LobbyState, player_id: &str) -> Result<Removal, LobbyError> {
    let removed_slot = state.slot_of(player_id).ok_or(LobbyError::PlayerNotInLobby)?;
    state.slots[removed_slot] = LobbySlot::default();

    let mut new_host_id = None;
    if state.host_id == player_id {
        if let Some(next) = state.slots.iter().find_map(|s| s.player.as_ref()) {
            state.host_id = next.id.clone();
            new_host_id = Some(next.id.clone());
        }
    }

    Ok(Removal {
        removed_slot,
        new_host_id,
    })
}

/// Flip a non-host player's ready flag. Returns `(slot, ready)`.
pub fn toggle_ready(state: &mut LobbyState, player_id: &str) -> Result<(usize, bool), LobbyError> {
    let slot = state.slot_of(player_id).ok_or(LobbyError::PlayerNotInLobby)?;
    if state.host_id == player_id {
        return Err(LobbyError::HostCannotReady);
    }

    let seat = &mut state.slots[slot];
    seat.ready = !seat.ready;
    Ok((slot, seat.ready))
}

/// Host-only map change.
pub fn select_map(state: &mut LobbyState, requester_id: &str, map_id: &str) -> Result<(), LobbyError> {
    if state.host_id != requester_id {
        return Err(LobbyError::NotHost("select map"));
    }
    if !map_exists(map_id) {
        return Err(LobbyError::InvalidMapId);
    }
    state.selected_map_id = map_id.to_string();
    Ok(())
}

/// Whether `requester_id` may start the game now.
///
/// The host is implicitly ready; a solo host may start.
pub fn can_start_game(state: &LobbyState, requester_id: &str) -> Result<(), LobbyError> {
    if state.host_id != requester_id {
        return Err(LobbyError::NotHost("start the game"));
    }
    if state.status != LobbyStatus::Waiting {
        return Err(LobbyError::AlreadyStarted);
    }
    if is_lobby_empty(state) {
        return Err(LobbyError::NoPlayers);
    }

    let all_ready = state
        .slots
        .iter()
        .filter(|s| !s.is_empty() && !s.holds(&state.host_id))
        .all(|s| s.ready);
    if !all_ready {
        return Err(LobbyError::PlayersNotReady);
    }
    Ok(())
}

/// Occupied seat count.
pub fn player_count(state: &LobbyState) -> usize {
    state.slots.iter().filter(|s| !s.is_empty()).count()
}

/// Whether every seat is free.
pub fn is_lobby_empty(state: &LobbyState) -> bool {
    state.slots.iter().all(LobbySlot::is_empty)
}

/// Players in slot order.
pub fn players_in_lobby(state: &LobbyState) -> Vec<PlayerInfo> {
    state.slots.iter().filter_map(|s| s.player.clone()).collect()
}

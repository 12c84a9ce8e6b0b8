//! Lobby Manager
//!
//! Owns every lobby and the player -> lobby reverse index. Wraps the pure
//! transitions in `logic` with the cross-lobby bookkeeping they cannot see,
//! and queues `LobbyEvent`s for the caller to drain after each operation.

use std::collections::BTreeMap;

use tracing::{debug, info};

use crate::core::config::GameConfig;
use crate::core::ids::{generate_id, LobbyId, PlayerId};
use crate::lobby::error::LobbyError;
use crate::lobby::events::LobbyEvent;
use crate::lobby::logic;
use crate::lobby::types::{LobbyState, LobbyStatus, LobbySummary, PlayerInfo};

/// Successful join.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JoinOutcome {
    /// Lobby snapshot after the join.
    pub state: LobbyState,
    /// Seat the player took.
    pub slot: usize,
}

/// Successful leave.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeaveOutcome {
    /// Lobby the player left.
    pub lobby_id: LobbyId,
    /// Seat that was cleared.
    pub removed_slot: usize,
    /// New host, when the leaver was host and someone remains.
    pub new_host_id: Option<PlayerId>,
    /// Whether the lobby emptied and was deleted.
    pub lobby_removed: bool,
}

/// Successful ready toggle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReadyOutcome {
    /// Seat index.
    pub slot: usize,
    /// New flag value.
    pub ready: bool,
}

/// Handoff data for a game room.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameStart {
    /// Lobby that started.
    pub lobby_id: LobbyId,
    /// Selected map.
    pub map_id: String,
    /// Roster in slot order.
    pub players: Vec<PlayerInfo>,
}

/// Manages all lobbies.
pub struct LobbyManager {
    config: GameConfig,
    /// Lobby storage.
    lobbies: BTreeMap<LobbyId, LobbyState>,
    /// At most one lobby per player.
    player_to_lobby: BTreeMap<PlayerId, LobbyId>,
    /// Notifications waiting to be drained.
    pending_events: Vec<LobbyEvent>,
}

impl LobbyManager {
    /// Create an empty manager.
    pub fn new(config: GameConfig) -> Self {
        Self {
            config,
            lobbies: BTreeMap::new(),
            player_to_lobby: BTreeMap::new(),
            pending_events: Vec::new(),
        }
    }

    /// Open a new lobby with the caller as host.
    pub fn create_lobby(
        &mut self,
        player_id: &str,
        player_name: &str,
        lobby_name: &str,
    ) -> Result<LobbyState, LobbyError> {
        if self.player_to_lobby.contains_key(player_id) {
            return Err(LobbyError::AlreadyInLobby);
        }

        let lobby_id = generate_id("lobby");
        let host = PlayerInfo {
            id: player_id.to_string(),
            name: self.config.clip_player_name(player_name),
            color: self.config.color_for(0),
            slot: 0,
        };
        let state = logic::create_lobby_state(lobby_id.clone(), self.config.clip_lobby_name(lobby_name), host);

        self.lobbies.insert(lobby_id.clone(), state.clone());
        self.player_to_lobby.insert(player_id.to_string(), lobby_id.clone());

        info!("Lobby {} created by {}", lobby_id, player_id);
        self.push_event(LobbyEvent::Created(LobbySummary::from(&state)));
        Ok(state)
    }

    /// Take a seat in an existing lobby.
    pub fn join_lobby(
        &mut self,
        lobby_id: &str,
        player_id: &str,
        player_name: &str,
    ) -> Result<JoinOutcome, LobbyError> {
        if self.player_to_lobby.contains_key(player_id) {
            return Err(LobbyError::AlreadyInLobby);
        }

        let state = self.lobbies.get_mut(lobby_id).ok_or(LobbyError::LobbyNotFound)?;
        let player = PlayerInfo {
            id: player_id.to_string(),
            name: self.config.clip_player_name(player_name),
            color: self.config.color_for(logic::player_count(state)),
            slot: 0,
        };

        let slot = logic::add_player_to_lobby(state, player)?;
        let seated = state.slots[slot].player.clone();
        let state = state.clone();

        self.player_to_lobby.insert(player_id.to_string(), lobby_id.to_string());

        debug!("Player {} joined lobby {} in slot {}", player_id, lobby_id, slot);
        if let Some(player) = seated {
            self.push_event(LobbyEvent::PlayerJoined {
                lobby_id: lobby_id.to_string(),
                slot,
                player,
            });
        }
        self.push_event(LobbyEvent::Updated(LobbySummary::from(&state)));

        Ok(JoinOutcome { state, slot })
    }

    /// Leave the caller's lobby, deleting it once empty.
    pub fn leave_lobby(&mut self, player_id: &str) -> Result<LeaveOutcome, LobbyError> {
        let lobby_id = self.lobby_id_of(player_id)?;
        let state = self.lobbies.get_mut(&lobby_id).ok_or(LobbyError::LobbyNotFound)?;

        let removal = logic::remove_player_from_lobby(state, player_id)?;
        self.player_to_lobby.remove(player_id);

        let lobby_removed = logic::is_lobby_empty(state);
        if lobby_removed {
            let summary = LobbySummary::from(&*state);
            self.lobbies.remove(&lobby_id);
            info!("Lobby {} removed", lobby_id);
            self.push_event(LobbyEvent::Removed(summary));
        } else {
            let summary = LobbySummary::from(&*state);
            if let Some(new_host_id) = &removal.new_host_id {
                self.push_event(LobbyEvent::HostChanged {
                    lobby_id: lobby_id.clone(),
                    new_host_id: new_host_id.clone(),
                });
            }
            self.push_event(LobbyEvent::PlayerLeft {
                lobby_id: lobby_id.clone(),
                slot: removal.removed_slot,
                player_id: player_id.to_string(),
            });
            self.push_event(LobbyEvent::Updated(summary));
        }

        debug!("Player {} left lobby {}", player_id, lobby_id);
        Ok(LeaveOutcome {
            lobby_id,
            removed_slot: removal.removed_slot,
            new_host_id: removal.new_host_id,
            lobby_removed,
        })
    }

    /// Flip the caller's ready flag.
    pub fn toggle_ready(&mut self, player_id: &str) -> Result<ReadyOutcome, LobbyError> {
        let lobby_id = self.lobby_id_of(player_id)?;
        let state = self.lobbies.get_mut(&lobby_id).ok_or(LobbyError::LobbyNotFound)?;

        let (slot, ready) = logic::toggle_ready(state, player_id)?;

        self.push_event(LobbyEvent::ReadyChanged { lobby_id, slot, ready });
        Ok(ReadyOutcome { slot, ready })
    }

    /// Host changes the lobby's map.
    pub fn select_map(&mut self, player_id: &str, map_id: &str) -> Result<LobbyId, LobbyError> {
        let lobby_id = self.lobby_id_of(player_id)?;
        let state = self.lobbies.get_mut(&lobby_id).ok_or(LobbyError::LobbyNotFound)?;

        logic::select_map(state, player_id, map_id)?;
        let summary = LobbySummary::from(&*state);

        self.push_event(LobbyEvent::MapChanged {
            lobby_id: lobby_id.clone(),
            map_id: map_id.to_string(),
        });
        self.push_event(LobbyEvent::Updated(summary));
        Ok(lobby_id)
    }

    /// Host starts the game. The lobby moves to `in_game` and the roster is
    /// handed off to whoever builds the game room.
    pub fn start_game(&mut self, player_id: &str) -> Result<GameStart, LobbyError> {
        let lobby_id = self.lobby_id_of(player_id)?;
        let state = self.lobbies.get_mut(&lobby_id).ok_or(LobbyError::LobbyNotFound)?;

        logic::can_start_game(state, player_id)?;
        state.status = LobbyStatus::InGame;

        let start = GameStart {
            lobby_id: lobby_id.clone(),
            map_id: state.selected_map_id.clone(),
            players: logic::players_in_lobby(state),
        };
        let summary = LobbySummary::from(&*state);

        info!(
            "Lobby {} starting on {} with {} players",
            lobby_id,
            start.map_id,
            start.players.len()
        );
        self.push_event(LobbyEvent::GameStarting {
            lobby_id: lobby_id.clone(),
        });
        self.push_event(LobbyEvent::GameStarted {
            lobby_id: start.lobby_id.clone(),
            map_id: start.map_id.clone(),
            players: start.players.clone(),
        });
        self.push_event(LobbyEvent::Updated(summary));

        Ok(start)
    }

    /// Kicking is part of the protocol but has no semantics yet: accepted,
    /// nothing changes.
    pub fn kick_player(&mut self, requester_id: &str, target_id: &str) {
        debug!("Ignoring kick of {} requested by {}", target_id, requester_id);
    }

    /// Listing of every lobby.
    pub fn lobbies(&self) -> Vec<LobbySummary> {
        self.lobbies.values().map(LobbySummary::from).collect()
    }

    /// Snapshot of one lobby.
    pub fn lobby(&self, lobby_id: &str) -> Option<LobbyState> {
        self.lobbies.get(lobby_id).cloned()
    }

    /// Snapshot of the caller's lobby.
    pub fn lobby_for_player(&self, player_id: &str) -> Option<LobbyState> {
        self.player_to_lobby
            .get(player_id)
            .and_then(|id| self.lobbies.get(id))
            .cloned()
    }

    /// Lobby id the player is registered in.
    pub fn player_lobby_id(&self, player_id: &str) -> Option<LobbyId> {
        self.player_to_lobby.get(player_id).cloned()
    }

    /// Member ids of a lobby, in slot order.
    pub fn lobby_members(&self, lobby_id: &str) -> Vec<PlayerId> {
        self.lobbies
            .get(lobby_id)
            .map(|state| logic::players_in_lobby(state).into_iter().map(|p| p.id).collect())
            .unwrap_or_default()
    }

    /// Number of open lobbies.
    pub fn lobby_count(&self) -> usize {
        self.lobbies.len()
    }

    /// Take pending events (consumes them).
    pub fn take_events(&mut self) -> Vec<LobbyEvent> {
        std::mem::take(&mut self.pending_events)
    }

    fn push_event(&mut self, event: LobbyEvent) {
        self.pending_events.push(event);
    }

    fn lobby_id_of(&self, player_id: &str) -> Result<LobbyId, LobbyError> {
        self.player_to_lobby
            .get(player_id)
            .cloned()
            .ok_or(LobbyError::NotInLobby)
    }
}

impl Default for LobbyManager {
    fn default() -> Self {
        Self::new(GameConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn manager_with_lobby() -> (LobbyManager, LobbyId) {
        let mut manager = LobbyManager::default();
        let state = manager.create_lobby("alice", "Alice", "L").unwrap();
        manager.take_events();
        (manager, state.id)
    }

    #[test]
    fn test_create_lobby() {
        let mut manager = LobbyManager::default();
        let state = manager.create_lobby("alice", "Alice", "Fun Lobby").unwrap();

        assert!(state.id.starts_with("lobby_"));
        assert_eq!(state.name, "Fun Lobby");
        assert_eq!(state.host_id, "alice");
        assert_eq!(manager.player_lobby_id("alice"), Some(state.id.clone()));

        let events = manager.take_events();
        assert_eq!(events.len(), 1);
        match &events[0] {
            LobbyEvent::Created(summary) => {
                assert_eq!(summary.id, state.id);
                assert_eq!(summary.host_display_name, "Alice");
                assert_eq!(summary.player_count, 1);
                assert_eq!(summary.max_players, 4);
                assert_eq!(summary.selected_map_id, "grasslands");
            }
            other => panic!("unexpected event {:?}", other),
        }
        assert!(manager.take_events().is_empty());
    }

    #[test]
    fn test_create_twice_rejected() {
        let (mut manager, _) = manager_with_lobby();
        assert_eq!(
            manager.create_lobby("alice", "Alice", "Other"),
            Err(LobbyError::AlreadyInLobby)
        );
        assert_eq!(manager.lobby_count(), 1);
        assert!(manager.take_events().is_empty());
    }

    #[test]
    fn test_list_lobbies() {
        let mut manager = LobbyManager::default();
        manager.create_lobby("a", "A", "One").unwrap();
        manager.create_lobby("b", "B", "Two").unwrap();

        let mut names: Vec<String> = manager.lobbies().into_iter().map(|s| s.name).collect();
        names.sort();
        assert_eq!(names, vec!["One", "Two"]);
    }

    #[test]
    fn test_join_lobby() {
        let (mut manager, lobby_id) = manager_with_lobby();
        let outcome = manager.join_lobby(&lobby_id, "bob", "Bob").unwrap();

        assert_eq!(outcome.slot, 1);
        assert_eq!(outcome.state.slots[1].player.as_ref().unwrap().name, "Bob");
        assert_eq!(outcome.state.slots[1].player.as_ref().unwrap().color, 0x44ff44);
        assert_eq!(manager.player_lobby_id("bob"), Some(lobby_id.clone()));
        assert_eq!(manager.lobby_for_player("bob").map(|s| s.id), Some(lobby_id.clone()));
        assert_eq!(manager.lobby_members(&lobby_id), vec!["alice", "bob"]);

        let events = manager.take_events();
        assert!(matches!(&events[0], LobbyEvent::PlayerJoined { slot: 1, player, .. } if player.id == "bob"));
        assert!(matches!(&events[1], LobbyEvent::Updated(s) if s.player_count == 2));
    }

    #[test]
    fn test_join_errors() {
        let (mut manager, lobby_id) = manager_with_lobby();
        assert_eq!(
            manager.join_lobby("lobby_missing", "bob", "Bob"),
            Err(LobbyError::LobbyNotFound)
        );
        assert_eq!(
            manager.join_lobby(&lobby_id, "alice", "Alice"),
            Err(LobbyError::AlreadyInLobby)
        );

        for id in ["b", "c", "d"] {
            manager.join_lobby(&lobby_id, id, id).unwrap();
        }
        assert_eq!(manager.join_lobby(&lobby_id, "e", "E"), Err(LobbyError::LobbyFull));
        assert_eq!(manager.player_lobby_id("e"), None);
    }

    #[test]
    fn test_leave_lobby() {
        let (mut manager, lobby_id) = manager_with_lobby();
        manager.join_lobby(&lobby_id, "bob", "Bob").unwrap();
        manager.take_events();

        let outcome = manager.leave_lobby("bob").unwrap();
        assert_eq!(outcome.removed_slot, 1);
        assert_eq!(outcome.new_host_id, None);
        assert!(!outcome.lobby_removed);
        assert_eq!(manager.player_lobby_id("bob"), None);

        let events = manager.take_events();
        assert!(matches!(&events[0], LobbyEvent::PlayerLeft { slot: 1, player_id, .. } if player_id == "bob"));
        assert!(matches!(&events[1], LobbyEvent::Updated(s) if s.player_count == 1));

        assert_eq!(manager.leave_lobby("bob"), Err(LobbyError::NotInLobby));
    }

    #[test]
    fn test_last_leave_removes_lobby() {
        let (mut manager, lobby_id) = manager_with_lobby();
        let outcome = manager.leave_lobby("alice").unwrap();

        assert!(outcome.lobby_removed);
        assert_eq!(outcome.new_host_id, None);
        assert!(manager.lobby(&lobby_id).is_none());
        assert_eq!(manager.lobby_count(), 0);

        let events = manager.take_events();
        assert_eq!(events.len(), 1);
        assert!(matches!(&events[0], LobbyEvent::Removed(s) if s.id == lobby_id && s.player_count == 0));
    }

    #[test]
    fn test_host_leave_reassigns() {
        let (mut manager, lobby_id) = manager_with_lobby();
        manager.join_lobby(&lobby_id, "bob", "Bob").unwrap();
        manager.join_lobby(&lobby_id, "carol", "Carol").unwrap();
        manager.leave_lobby("bob").unwrap();
        manager.take_events();

        let outcome = manager.leave_lobby("alice").unwrap();
        assert_eq!(outcome.new_host_id.as_deref(), Some("carol"));
        assert_eq!(manager.lobby(&lobby_id).unwrap().host_id, "carol");

        let events = manager.take_events();
        assert!(matches!(&events[0], LobbyEvent::HostChanged { new_host_id, .. } if new_host_id == "carol"));
        assert!(matches!(&events[1], LobbyEvent::PlayerLeft { slot: 0, .. }));
        assert!(matches!(&events[2], LobbyEvent::Updated(s) if s.host_display_name == "Carol"));
    }

    #[test]
    fn test_toggle_ready() {
        let (mut manager, lobby_id) = manager_with_lobby();
        manager.join_lobby(&lobby_id, "bob", "Bob").unwrap();
        manager.take_events();

        assert_eq!(manager.toggle_ready("bob"), Ok(ReadyOutcome { slot: 1, ready: true }));
        assert_eq!(
            manager.take_events(),
            vec![LobbyEvent::ReadyChanged {
                lobby_id: lobby_id.clone(),
                slot: 1,
                ready: true
            }]
        );
        assert_eq!(manager.toggle_ready("alice"), Err(LobbyError::HostCannotReady));
        assert_eq!(manager.toggle_ready("nobody"), Err(LobbyError::NotInLobby));
    }

    #[test]
    fn test_select_map() {
        let (mut manager, lobby_id) = manager_with_lobby();
        assert_eq!(manager.select_map("alice", "fortress"), Ok(lobby_id.clone()));
        assert_eq!(manager.lobby(&lobby_id).unwrap().selected_map_id, "fortress");

        let events = manager.take_events();
        assert!(matches!(&events[0], LobbyEvent::MapChanged { map_id, .. } if map_id == "fortress"));
        assert!(matches!(&events[1], LobbyEvent::Updated(s) if s.selected_map_id == "fortress"));

        assert_eq!(manager.select_map("alice", "bogus"), Err(LobbyError::InvalidMapId));
        assert!(manager.take_events().is_empty());
    }

    #[test]
    fn test_start_requires_ready() {
        let (mut manager, lobby_id) = manager_with_lobby();
        manager.join_lobby(&lobby_id, "bob", "Bob").unwrap();
        manager.take_events();

        assert_eq!(manager.start_game("alice"), Err(LobbyError::PlayersNotReady));
        assert_eq!(manager.lobby(&lobby_id).unwrap().status, LobbyStatus::Waiting);
        assert!(manager.take_events().is_empty());
    }

    #[test]
    fn test_full_flow_create_join_ready_start() {
        let mut manager = LobbyManager::default();
        let lobby_id = manager.create_lobby("alice", "Alice", "L").unwrap().id;
        manager.join_lobby(&lobby_id, "bob", "Bob").unwrap();
        manager.toggle_ready("bob").unwrap();
        manager.take_events();

        let start = manager.start_game("alice").unwrap();
        assert_eq!(start.map_id, "grasslands");
        let ids: Vec<&str> = start.players.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["alice", "bob"]);
        assert_eq!(manager.lobby(&lobby_id).unwrap().status, LobbyStatus::InGame);

        let events = manager.take_events();
        assert!(matches!(&events[0], LobbyEvent::GameStarting { .. }));
        match &events[1] {
            LobbyEvent::GameStarted { map_id, players, .. } => {
                assert_eq!(map_id, "grasslands");
                assert_eq!(players.len(), 2);
            }
            other => panic!("unexpected event {:?}", other),
        }
        assert!(matches!(&events[2], LobbyEvent::Updated(s) if s.status == LobbyStatus::InGame));

        assert_eq!(manager.start_game("alice"), Err(LobbyError::AlreadyStarted));
        assert_eq!(
            manager.join_lobby(&lobby_id, "carol", "Carol"),
            Err(LobbyError::NotAcceptingPlayers)
        );
    }

    #[test]
    fn test_kick_is_noop() {
        let (mut manager, lobby_id) = manager_with_lobby();
        manager.join_lobby(&lobby_id, "bob", "Bob").unwrap();
        manager.take_events();
        let before = manager.lobby(&lobby_id);

        manager.kick_player("alice", "bob");
        assert_eq!(manager.lobby(&lobby_id), before);
        assert!(manager.take_events().is_empty());
    }

    #[test]
    fn test_long_names_clipped() {
        let mut manager = LobbyManager::default();
        let state = manager
            .create_lobby("a", "An extremely long player name", "An extremely long lobby name indeed")
            .unwrap();
        assert_eq!(state.name.chars().count(), 24);
        assert_eq!(state.slots[0].player.as_ref().unwrap().name.chars().count(), 16);
    }

    #[derive(Debug, Clone)]
    enum Op {
        Create(usize),
        Join(usize, usize),
        Leave(usize),
    }

    fn op() -> impl Strategy<Value = Op> {
        prop_oneof![
            (0..6usize).prop_map(Op::Create),
            (0..6usize, 0..6usize).prop_map(|(p, l)| Op::Join(p, l)),
            (0..6usize).prop_map(Op::Leave),
        ]
    }

    proptest! {
        #[test]
        fn test_player_in_at_most_one_lobby(ops in prop::collection::vec(op(), 1..60)) {
            let mut manager = LobbyManager::default();

            for op in ops {
                match op {
                    Op::Create(p) => {
                        let _ = manager.create_lobby(&format!("p{}", p), "P", "L");
                    }
                    Op::Join(p, l) => {
                        let ids: Vec<LobbyId> = manager.lobbies().into_iter().map(|s| s.id).collect();
                        if let Some(lobby_id) = ids.get(l % ids.len().max(1)) {
                            let _ = manager.join_lobby(lobby_id, &format!("p{}", p), "P");
                        }
                    }
                    Op::Leave(p) => {
                        let _ = manager.leave_lobby(&format!("p{}", p));
                    }
                }

                for p in 0..6 {
                    let id = format!("p{}", p);
                    let seated: Vec<LobbyId> = manager
                        .lobbies()
                        .into_iter()
                        .filter(|s| manager.lobby_members(&s.id).contains(&id))
                        .map(|s| s.id)
                        .collect();
                    prop_assert!(seated.len() <= 1);
                    prop_assert_eq!(seated.first().cloned(), manager.player_lobby_id(&id));
                }
                for summary in manager.lobbies() {
                    prop_assert!(summary.player_count > 0);
                    let state = manager.lobby(&summary.id).unwrap();
                    prop_assert!(state.slot_of(&state.host_id).is_some());
                }
            }
        }
    }
}

//! Protocol Messages
//!
//! Wire format for client-server communication over WebSocket.
//! Every frame is a JSON object whose `type` field names the event,
//! e.g. `{"type":"lobby:join","lobbyId":"lobby_1a2b","playerName":"Bob"}`.

use serde::{Deserialize, Serialize};

use crate::core::ids::PlayerId;
use crate::game::events::RoomEvent;
use crate::game::types::{Collectible, GameSnapshot, PlayerInput, PlayerState};
use crate::lobby::events::LobbyEvent;
use crate::lobby::types::{LobbyState, LobbySummary, PlayerInfo};

// =============================================================================
// CLIENT -> SERVER MESSAGES
// =============================================================================

/// Messages sent from client to server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ClientMessage {
    /// Ask for the lobby listing.
    #[serde(rename = "lobby:list-request")]
    LobbyListRequest,

    /// Open a lobby as host.
    #[serde(rename = "lobby:create", rename_all = "camelCase")]
    CreateLobby {
        /// Lobby display name.
        lobby_name: String,
        /// Host display name.
        player_name: String,
    },

    /// Take a seat in a lobby.
    #[serde(rename = "lobby:join", rename_all = "camelCase")]
    JoinLobby {
        /// Target lobby.
        lobby_id: String,
        /// Display name in the lobby.
        player_name: String,
    },

    /// Leave the current lobby.
    #[serde(rename = "lobby:leave")]
    LeaveLobby,

    /// Flip own ready flag.
    #[serde(rename = "lobby:toggle-ready")]
    ToggleReady,

    /// Host picks a map.
    #[serde(rename = "lobby:select-map", rename_all = "camelCase")]
    SelectMap {
        /// Catalog id.
        map_id: String,
    },

    /// Host starts the game.
    #[serde(rename = "lobby:start-game")]
    StartGame,

    /// Host kicks a player. Accepted and ignored.
    #[serde(rename = "lobby:kick", rename_all = "camelCase")]
    Kick {
        /// Player to remove.
        player_id: PlayerId,
    },

    /// Enter a game room.
    #[serde(rename = "game:join")]
    JoinGame {
        /// Display name in the room.
        #[serde(default)]
        name: String,
    },

    /// Latch directional input.
    #[serde(rename = "game:input")]
    Input(PlayerInput),

    /// Ping for latency measurement.
    #[serde(rename = "ping")]
    Ping {
        /// Client clock, echoed back.
        timestamp: u64,
    },
}

// =============================================================================
// SERVER -> CLIENT MESSAGES
// =============================================================================

/// Messages sent from server to client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ServerMessage {
    /// Lobby listing.
    #[serde(rename = "lobby:list")]
    LobbyList {
        /// Every open lobby.
        lobbies: Vec<LobbySummary>,
    },

    /// A lobby appeared.
    #[serde(rename = "lobby:created")]
    LobbyCreated(LobbySummary),

    /// A lobby emptied and was deleted.
    #[serde(rename = "lobby:removed")]
    LobbyRemoved(LobbySummary),

    /// A lobby's listing changed.
    #[serde(rename = "lobby:updated")]
    LobbyUpdated(LobbySummary),

    /// Full lobby state, sent to the requester on create/join.
    #[serde(rename = "lobby:state")]
    Lobby(LobbyState),

    /// Someone took a seat.
    #[serde(rename = "lobby:player-joined")]
    PlayerJoinedLobby {
        /// Seat index.
        slot: usize,
        /// New occupant.
        player: PlayerInfo,
    },

    /// Someone left a seat.
    #[serde(rename = "lobby:player-left", rename_all = "camelCase")]
    PlayerLeftLobby {
        /// Vacated seat index.
        slot: usize,
        /// Former occupant.
        player_id: PlayerId,
    },

    /// A seat's ready flag flipped.
    #[serde(rename = "lobby:ready-changed")]
    ReadyChanged {
        /// Seat index.
        slot: usize,
        /// New flag.
        ready: bool,
    },

    /// Host picked another map.
    #[serde(rename = "lobby:map-changed", rename_all = "camelCase")]
    MapChanged {
        /// Newly selected map.
        map_id: String,
    },

    /// Host authority moved.
    #[serde(rename = "lobby:host-changed", rename_all = "camelCase")]
    HostChanged {
        /// New host.
        new_host_id: PlayerId,
    },

    /// Start accepted.
    #[serde(rename = "lobby:game-starting")]
    GameStarting,

    /// Lobby handed off to a game room.
    #[serde(rename = "game:started", rename_all = "camelCase")]
    GameStarted {
        /// Map the room runs on.
        map_id: String,
        /// Roster in slot order.
        players: Vec<PlayerInfo>,
    },

    /// Request failed; sent to the requester only.
    #[serde(rename = "error")]
    Error {
        /// Human-readable reason.
        message: String,
    },

    /// Room snapshot for a joining client.
    #[serde(rename = "game:state")]
    GameState(GameSnapshot),

    /// Another player entered the room.
    #[serde(rename = "game:player-joined")]
    PlayerJoined(PlayerState),

    /// A player left the room.
    #[serde(rename = "game:player-left", rename_all = "camelCase")]
    PlayerLeft {
        /// Departed player.
        player_id: PlayerId,
    },

    /// Position delta.
    #[serde(rename = "game:player-moved")]
    PlayerMoved {
        /// Mover.
        id: PlayerId,
        /// New x.
        x: f32,
        /// New y.
        y: f32,
    },

    /// Score delta.
    #[serde(rename = "game:player-scored")]
    PlayerScored {
        /// Scorer.
        id: PlayerId,
        /// New total.
        score: u32,
    },

    /// Collectible appeared.
    #[serde(rename = "game:collectible-spawned")]
    CollectibleSpawned(Collectible),

    /// Collectible picked up.
    #[serde(rename = "game:collectible-collected")]
    CollectibleCollected {
        /// Removed collectible.
        id: String,
    },

    /// Pong response.
    #[serde(rename = "pong", rename_all = "camelCase")]
    Pong {
        /// Echo of the ping's timestamp.
        timestamp: u64,
        /// Server clock in epoch millis.
        server_time: u64,
    },

    /// Server is shutting down.
    #[serde(rename = "shutdown")]
    Shutdown {
        /// Why the server is going away.
        reason: String,
    },
}

impl ServerMessage {
    /// Error reply carrying a user-facing message.
    pub fn error(message: impl ToString) -> Self {
        ServerMessage::Error {
            message: message.to_string(),
        }
    }
}

impl From<LobbyEvent> for ServerMessage {
    fn from(event: LobbyEvent) -> Self {
        match event {
            LobbyEvent::Created(summary) => ServerMessage::LobbyCreated(summary),
            LobbyEvent::Updated(summary) => ServerMessage::LobbyUpdated(summary),
            LobbyEvent::Removed(summary) => ServerMessage::LobbyRemoved(summary),
            LobbyEvent::PlayerJoined { slot, player, .. } => ServerMessage::PlayerJoinedLobby { slot, player },
            LobbyEvent::PlayerLeft { slot, player_id, .. } => ServerMessage::PlayerLeftLobby { slot, player_id },
            LobbyEvent::ReadyChanged { slot, ready, .. } => ServerMessage::ReadyChanged { slot, ready },
            LobbyEvent::MapChanged { map_id, .. } => ServerMessage::MapChanged { map_id },
            LobbyEvent::HostChanged { new_host_id, .. } => ServerMessage::HostChanged { new_host_id },
            LobbyEvent::GameStarting { .. } => ServerMessage::GameStarting,
            LobbyEvent::GameStarted { map_id, players, .. } => ServerMessage::GameStarted { map_id, players },
        }
    }
}

impl From<RoomEvent> for ServerMessage {
    fn from(event: RoomEvent) -> Self {
        match event {
            RoomEvent::PlayerMoved { id, x, y } => ServerMessage::PlayerMoved { id, x, y },
            RoomEvent::PlayerScored { id, score } => ServerMessage::PlayerScored { id, score },
            RoomEvent::CollectibleSpawned(c) => ServerMessage::CollectibleSpawned(c),
            RoomEvent::CollectibleCollected { id } => ServerMessage::CollectibleCollected { id },
        }
    }
}

// =============================================================================
// SERIALIZATION HELPERS
// =============================================================================

impl ClientMessage {
    /// Serialize to JSON string.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Deserialize from JSON string.
    pub fn from_json(s: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(s)
    }
}

impl ServerMessage {
    /// Serialize to JSON string.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Deserialize from JSON string.
    pub fn from_json(s: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lobby::types::LobbyStatus;
    use serde_json::{json, Value};

    fn summary() -> LobbySummary {
        LobbySummary {
            id: "lobby_1".to_string(),
            name: "L".to_string(),
            host_display_name: "Alice".to_string(),
            player_count: 1,
            max_players: 4,
            selected_map_id: "grasslands".to_string(),
            status: LobbyStatus::Waiting,
        }
    }

    #[test]
    fn test_parse_lobby_requests() {
        let msg = ClientMessage::from_json(
            r#"{"type":"lobby:create","lobbyName":"Fun","playerName":"Alice"}"#,
        )
        .unwrap();
        assert_eq!(
            msg,
            ClientMessage::CreateLobby {
                lobby_name: "Fun".to_string(),
                player_name: "Alice".to_string()
            }
        );

        let msg = ClientMessage::from_json(r#"{"type":"lobby:join","lobbyId":"lobby_1","playerName":"Bob"}"#).unwrap();
        assert!(matches!(msg, ClientMessage::JoinLobby { ref lobby_id, .. } if lobby_id == "lobby_1"));

        let msg = ClientMessage::from_json(r#"{"type":"lobby:toggle-ready"}"#).unwrap();
        assert_eq!(msg, ClientMessage::ToggleReady);

        let msg = ClientMessage::from_json(r#"{"type":"lobby:kick","playerId":"p2"}"#).unwrap();
        assert_eq!(
            msg,
            ClientMessage::Kick {
                player_id: "p2".to_string()
            }
        );
    }

    #[test]
    fn test_parse_game_requests() {
        let msg = ClientMessage::from_json(r#"{"type":"game:input","left":true,"right":false,"up":true,"down":false}"#)
            .unwrap();
        assert_eq!(
            msg,
            ClientMessage::Input(PlayerInput {
                left: true,
                up: true,
                ..Default::default()
            })
        );

        let msg = ClientMessage::from_json(r#"{"type":"game:join"}"#).unwrap();
        assert_eq!(msg, ClientMessage::JoinGame { name: String::new() });

        let msg = ClientMessage::from_json(r#"{"type":"ping","timestamp":42}"#).unwrap();
        assert_eq!(msg, ClientMessage::Ping { timestamp: 42 });
    }

    #[test]
    fn test_rejects_unknown_type() {
        assert!(ClientMessage::from_json(r#"{"type":"lobby:explode"}"#).is_err());
        assert!(ClientMessage::from_json("not json").is_err());
    }

    #[test]
    fn test_server_message_shape() {
        let json: Value = serde_json::from_str(&ServerMessage::LobbyCreated(summary()).to_json().unwrap()).unwrap();
        assert_eq!(json["type"], "lobby:created");
        assert_eq!(json["hostDisplayName"], "Alice");
        assert_eq!(json["maxPlayers"], 4);

        let json: Value = serde_json::from_str(
            &ServerMessage::PlayerLeftLobby {
                slot: 2,
                player_id: "p2".to_string(),
            }
            .to_json()
            .unwrap(),
        )
        .unwrap();
        assert_eq!(json, json!({"type": "lobby:player-left", "slot": 2, "playerId": "p2"}));

        let json: Value =
            serde_json::from_str(&ServerMessage::error("Lobby is full").to_json().unwrap()).unwrap();
        assert_eq!(json, json!({"type": "error", "message": "Lobby is full"}));
    }

    #[test]
    fn test_lobby_event_conversion() {
        let msg = ServerMessage::from(LobbyEvent::HostChanged {
            lobby_id: "lobby_1".to_string(),
            new_host_id: "p2".to_string(),
        });
        assert_eq!(
            msg,
            ServerMessage::HostChanged {
                new_host_id: "p2".to_string()
            }
        );

        let msg = ServerMessage::from(LobbyEvent::Removed(summary()));
        assert_eq!(msg, ServerMessage::LobbyRemoved(summary()));

        let msg = ServerMessage::from(LobbyEvent::GameStarting {
            lobby_id: "lobby_1".to_string(),
        });
        assert_eq!(msg.to_json().unwrap(), r#"{"type":"lobby:game-starting"}"#);
    }

    #[test]
    fn test_room_event_conversion() {
        let msg = ServerMessage::from(RoomEvent::PlayerScored {
            id: "p1".to_string(),
            score: 5,
        });
        let json: Value = serde_json::from_str(&msg.to_json().unwrap()).unwrap();
        assert_eq!(json, json!({"type": "game:player-scored", "id": "p1", "score": 5}));

        let msg = ServerMessage::from(RoomEvent::CollectibleSpawned(Collectible {
            id: "c_1".to_string(),
            x: 10.0,
            y: 20.0,
            value: 3,
        }));
        let json: Value = serde_json::from_str(&msg.to_json().unwrap()).unwrap();
        assert_eq!(json["type"], "game:collectible-spawned");
        assert_eq!(json["value"], 3);
    }

    #[test]
    fn test_pong_camel_case() {
        let json = ServerMessage::Pong {
            timestamp: 1,
            server_time: 2,
        }
        .to_json()
        .unwrap();
        assert!(json.contains("\"serverTime\":2"));
    }
}

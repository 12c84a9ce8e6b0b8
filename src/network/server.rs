//! WebSocket Game Server
//!
//! Async WebSocket gateway. Routes lobby requests to the `LobbyManager`,
//! game requests to room sessions, and fans lobby events out to the
//! connections that should see them.

use std::collections::BTreeMap;
use std::fmt::Display;
use std::net::SocketAddr;
use std::str::FromStr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use futures_util::{SinkExt, StreamExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{broadcast, mpsc, Mutex, RwLock};
use tokio::time::timeout;
use tokio_tungstenite::{accept_async, tungstenite::Message};
use tracing::{debug, error, info, instrument, warn};

use crate::core::config::GameConfig;
use crate::core::ids::{connection_id, PlayerId};
use crate::game::room::GameRoom;
use crate::game::types::PlayerInput;
use crate::lobby::error::LobbyError;
use crate::lobby::events::{Audience, LobbyEvent};
use crate::lobby::manager::{GameStart, LobbyManager};
use crate::lobby::maps::map_by_id;
use crate::lobby::types::{LobbyState, LobbySummary};
use crate::network::protocol::{ClientMessage, ServerMessage};
use crate::network::session::{spawn_room_session, RoomHandle};

/// Room key of the shared room players land in outside a started lobby.
pub const FREE_PLAY_ROOM: &str = "free-play";

/// Outbound queue depth per connection.
const CLIENT_CHANNEL_CAPACITY: usize = 256;

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address.
    pub bind_addr: SocketAddr,
    /// Maximum concurrent connections.
    pub max_connections: usize,
    /// Server version string.
    pub version: String,
    /// Lobby and simulation tunables.
    pub game: GameConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 3000)),
            max_connections: 1000,
            version: env!("CARGO_PKG_VERSION").to_string(),
            game: GameConfig::default(),
        }
    }
}

impl ServerConfig {
    /// Defaults overridden by `ARENA_BIND_ADDR`, `ARENA_TICK_RATE` and
    /// `ARENA_MAX_CONNECTIONS`.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        config.bind_addr = env_or("ARENA_BIND_ADDR", config.bind_addr);
        config.max_connections = env_or("ARENA_MAX_CONNECTIONS", config.max_connections);
        config.game.tick_rate = env_or("ARENA_TICK_RATE", config.game.tick_rate);
        config
    }
}

fn env_or<T: FromStr + Display>(key: &str, default: T) -> T {
    match std::env::var(key) {
        Ok(raw) => raw.parse().unwrap_or_else(|_| {
            warn!("Ignoring invalid {}={:?}, using {}", key, raw, default);
            default
        }),
        Err(_) => default,
    }
}

/// Game server errors.
#[derive(Debug, thiserror::Error)]
pub enum GameServerError {
    /// Failed to bind to address.
    #[error("Failed to bind: {0}")]
    BindFailed(#[from] std::io::Error),

    /// WebSocket error.
    #[error("WebSocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),

    /// Connection limit reached.
    #[error("Connection limit reached")]
    ConnectionLimitReached,
}

/// Connected client state.
struct ConnectedClient {
    /// Peer address (absent for in-process clients).
    addr: Option<SocketAddr>,
    /// Connection time.
    connected_at: Instant,
    /// Message sender (for direct messaging to client).
    sender: mpsc::Sender<ServerMessage>,
    /// Game room the client joined, if any.
    room_id: Option<String>,
}

/// What a lobby operation hands back besides its queued events.
enum LobbyReply {
    Nothing,
    /// Listing for the requester.
    Listing(Vec<LobbySummary>),
    /// Full state for the requester.
    State(LobbyState),
    /// A room must open before the start events go out.
    Started(GameStart),
}

/// Resolved recipients of one outgoing message.
enum Recipients {
    One(PlayerId),
    Many(Vec<PlayerId>),
    Everyone,
}

fn enqueue(clients: &BTreeMap<PlayerId, ConnectedClient>, player_id: &str, message: ServerMessage) {
    let Some(client) = clients.get(player_id) else {
        return;
    };
    if let Err(mpsc::error::TrySendError::Full(_)) = client.sender.try_send(message) {
        warn!("Client {} channel full, dropping lobby message", player_id);
    }
}

/// The game server.
#[derive(Clone)]
pub struct GameServer {
    /// Server configuration.
    config: ServerConfig,
    /// Lobby state.
    lobbies: Arc<Mutex<LobbyManager>>,
    /// Connected clients by connection id.
    clients: Arc<RwLock<BTreeMap<PlayerId, ConnectedClient>>>,
    /// Running game rooms by lobby id (or `FREE_PLAY_ROOM`).
    rooms: Arc<RwLock<BTreeMap<String, RoomHandle>>>,
    /// Shutdown signal.
    shutdown_tx: broadcast::Sender<()>,
}

impl GameServer {
    /// Create a new game server.
    pub fn new(config: ServerConfig) -> Self {
        let (shutdown_tx, _) = broadcast::channel(1);
        let lobbies = LobbyManager::new(config.game.clone());

        Self {
            config,
            lobbies: Arc::new(Mutex::new(lobbies)),
            clients: Arc::new(RwLock::new(BTreeMap::new())),
            rooms: Arc::new(RwLock::new(BTreeMap::new())),
            shutdown_tx,
        }
    }

    /// Run the server.
    #[instrument(skip(self))]
    pub async fn run(&self) -> Result<(), GameServerError> {
        let listener = TcpListener::bind(&self.config.bind_addr).await?;
        info!(
            "Lobby arena server v{} listening on {}",
            self.config.version, self.config.bind_addr
        );

        // The shared room is always up.
        self.free_play_room().await;

        let mut shutdown_rx = self.shutdown_tx.subscribe();

        loop {
            tokio::select! {
                result = listener.accept() => {
                    match result {
                        Ok((stream, addr)) => {
                            if self.connection_count().await >= self.config.max_connections {
                                warn!("{}, rejecting {}", GameServerError::ConnectionLimitReached, addr);
                                continue;
                            }

                            info!("New connection from {}", addr);
                            self.handle_connection(stream, addr);
                        }
                        Err(e) => {
                            error!("Accept error: {}", e);
                        }
                    }
                }
                _ = shutdown_rx.recv() => {
                    info!("Shutdown signal received");
                    break;
                }
            }
        }

        self.close_all_rooms().await;
        Ok(())
    }

    /// Handle a new WebSocket connection.
    fn handle_connection(&self, stream: TcpStream, addr: SocketAddr) {
        let server = self.clone();
        tokio::spawn(async move {
            if let Err(e) = server.serve_connection(stream, addr).await {
                error!("Connection {} failed: {}", addr, e);
            }
        });
    }

    async fn serve_connection(&self, stream: TcpStream, addr: SocketAddr) -> Result<(), GameServerError> {
        let ws_stream = accept_async(stream).await?;
        let (mut ws_sender, mut ws_receiver) = ws_stream.split();
        let (msg_tx, mut msg_rx) = mpsc::channel::<ServerMessage>(CLIENT_CHANNEL_CAPACITY);

        let player_id = self.register_client(Some(addr), msg_tx.clone()).await;
        let mut shutdown_rx = self.shutdown_tx.subscribe();

        // Spawn message sender task
        let mut sender_task = tokio::spawn(async move {
            while let Some(msg) = msg_rx.recv().await {
                let text = match msg.to_json() {
                    Ok(t) => t,
                    Err(e) => {
                        error!("Failed to serialize message: {}", e);
                        continue;
                    }
                };
                if ws_sender.send(Message::Text(text)).await.is_err() {
                    break;
                }
            }
            let _ = ws_sender.close().await;
        });

        // Handle incoming messages
        loop {
            tokio::select! {
                msg = ws_receiver.next() => {
                    match msg {
                        Some(Ok(Message::Text(text))) => {
                            self.handle_text(&player_id, &text).await;
                        }
                        Some(Ok(Message::Binary(_))) => {
                            self.send_to(&player_id, ServerMessage::error("Invalid message format")).await;
                        }
                        Some(Ok(Message::Close(_))) | None => {
                            debug!("Client {} disconnected", addr);
                            break;
                        }
                        Some(Err(e)) => {
                            warn!("WebSocket error for {}: {}", addr, e);
                            break;
                        }
                        _ => {}
                    }
                }
                _ = shutdown_rx.recv() => {
                    let _ = msg_tx.send(ServerMessage::Shutdown {
                        reason: "Server shutting down".to_string(),
                    }).await;
                    break;
                }
            }
        }

        // Cleanup
        self.disconnect(&player_id).await;
        drop(msg_tx);
        if timeout(Duration::from_secs(1), &mut sender_task).await.is_err() {
            sender_task.abort();
        }

        Ok(())
    }

    /// Register an outbound channel under a fresh connection id.
    async fn register_client(&self, addr: Option<SocketAddr>, sender: mpsc::Sender<ServerMessage>) -> PlayerId {
        let player_id = connection_id();
        self.clients.write().await.insert(
            player_id.clone(),
            ConnectedClient {
                addr,
                connected_at: Instant::now(),
                sender,
                room_id: None,
            },
        );
        player_id
    }

    /// Implicit room leave and lobby leave for a closed connection.
    async fn disconnect(&self, player_id: &str) {
        let client = self.clients.write().await.remove(player_id);

        if let Some(room_id) = client.as_ref().and_then(|c| c.room_id.as_deref()) {
            self.leave_room(player_id, room_id).await;
        }

        self.lobby_request(player_id, |lobbies| match lobbies.leave_lobby(player_id) {
            Ok(_) | Err(LobbyError::NotInLobby) => Ok(LobbyReply::Nothing),
            Err(e) => {
                warn!("Lobby cleanup for {} failed: {}", player_id, e);
                Ok(LobbyReply::Nothing)
            }
        })
        .await;

        if let Some(client) = client {
            info!(
                "Client {} ({:?}) cleaned up after {:?}",
                player_id,
                client.addr,
                client.connected_at.elapsed()
            );
        }
    }

    /// Parse and handle one text frame.
    async fn handle_text(&self, player_id: &str, text: &str) {
        match ClientMessage::from_json(text) {
            Ok(msg) => self.handle_client_message(player_id, msg).await,
            Err(e) => {
                debug!("Invalid message from {}: {}", player_id, e);
                self.send_to(player_id, ServerMessage::error("Invalid message format")).await;
            }
        }
    }

    /// Handle a client message.
    async fn handle_client_message(&self, player_id: &str, msg: ClientMessage) {
        match msg {
            ClientMessage::LobbyListRequest => {
                self.lobby_request(player_id, |lobbies| Ok(LobbyReply::Listing(lobbies.lobbies())))
                    .await;
            }
            ClientMessage::CreateLobby {
                lobby_name,
                player_name,
            } => {
                self.lobby_request(player_id, |lobbies| {
                    lobbies
                        .create_lobby(player_id, &player_name, &lobby_name)
                        .map(LobbyReply::State)
                })
                .await;
            }
            ClientMessage::JoinLobby {
                lobby_id,
                player_name,
            } => {
                self.lobby_request(player_id, |lobbies| {
                    lobbies
                        .join_lobby(&lobby_id, player_id, &player_name)
                        .map(|outcome| LobbyReply::State(outcome.state))
                })
                .await;
            }
            ClientMessage::LeaveLobby => {
                self.lobby_request(player_id, |lobbies| {
                    lobbies.leave_lobby(player_id).map(|_| LobbyReply::Nothing)
                })
                .await;
            }
            ClientMessage::ToggleReady => {
                self.lobby_request(player_id, |lobbies| {
                    lobbies.toggle_ready(player_id).map(|_| LobbyReply::Nothing)
                })
                .await;
            }
            ClientMessage::SelectMap { map_id } => {
                self.lobby_request(player_id, |lobbies| {
                    lobbies.select_map(player_id, &map_id).map(|_| LobbyReply::Nothing)
                })
                .await;
            }
            ClientMessage::StartGame => {
                self.lobby_request(player_id, |lobbies| {
                    lobbies.start_game(player_id).map(LobbyReply::Started)
                })
                .await;
            }
            ClientMessage::Kick { player_id: target } => {
                self.lobby_request(player_id, |lobbies| {
                    lobbies.kick_player(player_id, &target);
                    Ok(LobbyReply::Nothing)
                })
                .await;
            }
            ClientMessage::JoinGame { name } => {
                self.join_game(player_id, &name).await;
            }
            ClientMessage::Input(input) => {
                self.route_input(player_id, input).await;
            }
            ClientMessage::Ping { timestamp } => {
                self.send_to(
                    player_id,
                    ServerMessage::Pong {
                        timestamp,
                        server_time: std::time::SystemTime::now()
                            .duration_since(std::time::UNIX_EPOCH)
                            .unwrap_or_default()
                            .as_millis() as u64,
                    },
                )
                .await;
            }
        }
    }

    /// Run one lobby operation and queue its reply and events while the
    /// lobby lock is still held, so another request's messages can never
    /// land between them.
    async fn lobby_request<F>(&self, player_id: &str, op: F)
    where
        F: FnOnce(&mut LobbyManager) -> Result<LobbyReply, LobbyError>,
    {
        let mut lobbies = self.lobbies.lock().await;
        let mut outbox: Vec<(Recipients, ServerMessage)> = Vec::new();
        let requester = || Recipients::One(player_id.to_string());

        match op(&mut *lobbies) {
            Ok(LobbyReply::Nothing) => {}
            Ok(LobbyReply::Listing(list)) => {
                outbox.push((requester(), ServerMessage::LobbyList { lobbies: list }));
            }
            Ok(LobbyReply::State(state)) => outbox.push((requester(), ServerMessage::Lobby(state))),
            // The room is registered before `game:started` goes out.
            Ok(LobbyReply::Started(start)) => self.open_lobby_room(start).await,
            Err(e) => {
                debug!("Request from {} rejected: {}", player_id, e);
                outbox.push((requester(), ServerMessage::error(e)));
            }
        }

        for event in lobbies.take_events() {
            let recipients = match event.audience() {
                Audience::Everyone => Recipients::Everyone,
                Audience::Lobby(id) => Recipients::Many(lobbies.lobby_members(&id)),
            };
            if let LobbyEvent::Removed(summary) = &event {
                self.close_room(&summary.id).await;
            }
            outbox.push((recipients, ServerMessage::from(event)));
        }

        self.deliver(outbox).await;
        drop(lobbies);
    }

    /// Enqueue resolved messages in order. Never waits on a slow connection.
    async fn deliver(&self, outbox: Vec<(Recipients, ServerMessage)>) {
        if outbox.is_empty() {
            return;
        }

        let clients = self.clients.read().await;
        for (recipients, message) in outbox {
            match recipients {
                Recipients::One(id) => enqueue(&clients, &id, message),
                Recipients::Many(ids) => {
                    for id in ids {
                        enqueue(&clients, &id, message.clone());
                    }
                }
                Recipients::Everyone => {
                    for id in clients.keys() {
                        enqueue(&clients, id, message.clone());
                    }
                }
            }
        }
    }

    /// Spin up the room for a lobby that just started.
    async fn open_lobby_room(&self, start: GameStart) {
        let room = GameRoom::new(self.config.game.clone());
        let (handle, _task) = spawn_room_session(start.lobby_id.clone(), Some(start.map_id.clone()), room);
        handle.start();

        info!(
            "Room {} opened on {} for {} players",
            start.lobby_id,
            map_by_id(&start.map_id).map_or(start.map_id.as_str(), |m| m.name),
            start.players.len()
        );
        if let Some(previous) = self.rooms.write().await.insert(start.lobby_id, handle) {
            previous.shutdown();
        }
    }

    /// The shared room, started on first use.
    async fn free_play_room(&self) -> RoomHandle {
        let mut rooms = self.rooms.write().await;
        if let Some(handle) = rooms.get(FREE_PLAY_ROOM).filter(|h| !h.is_closed()) {
            return handle.clone();
        }

        let room = GameRoom::new(self.config.game.clone());
        let (handle, _task) = spawn_room_session(FREE_PLAY_ROOM, None, room);
        handle.start();
        rooms.insert(FREE_PLAY_ROOM.to_string(), handle.clone());
        handle
    }

    /// Join the caller's lobby room if it is running, the shared room otherwise.
    async fn join_game(&self, player_id: &str, name: &str) {
        let lobby_id = self.lobbies.lock().await.player_lobby_id(player_id);
        let lobby_room = match lobby_id {
            Some(id) => self.rooms.read().await.get(&id).cloned(),
            None => None,
        };
        let handle = match lobby_room {
            Some(handle) => handle,
            None => self.free_play_room().await,
        };

        let (sender, previous) = {
            let mut clients = self.clients.write().await;
            let Some(client) = clients.get_mut(player_id) else {
                return;
            };
            let previous = client.room_id.replace(handle.room_id().to_string());
            (client.sender.clone(), previous)
        };

        if let Some(previous) = previous {
            self.leave_room(player_id, &previous).await;
        }
        handle.join(player_id, name, sender);
    }

    async fn route_input(&self, player_id: &str, input: PlayerInput) {
        let room_id = self
            .clients
            .read()
            .await
            .get(player_id)
            .and_then(|c| c.room_id.clone());

        if let Some(room_id) = room_id {
            if let Some(room) = self.rooms.read().await.get(&room_id) {
                room.input(player_id, input);
            }
        }
    }

    async fn leave_room(&self, player_id: &str, room_id: &str) {
        if let Some(room) = self.rooms.read().await.get(room_id) {
            room.leave(player_id);
        }
    }

    async fn close_room(&self, room_id: &str) {
        if let Some(room) = self.rooms.write().await.remove(room_id) {
            room.shutdown();
            info!("Room {} closed", room_id);
        }
    }

    async fn close_all_rooms(&self) {
        let mut rooms = self.rooms.write().await;
        for room in rooms.values() {
            room.shutdown();
        }
        rooms.clear();
    }

    /// Send to one connection.
    async fn send_to(&self, player_id: &str, message: ServerMessage) {
        let sender = self.clients.read().await.get(player_id).map(|c| c.sender.clone());
        if let Some(sender) = sender {
            let _ = sender.send(message).await;
        }
    }

    /// Shutdown the server.
    pub fn shutdown(&self) {
        let _ = self.shutdown_tx.send(());
    }

    /// Get active connection count.
    pub async fn connection_count(&self) -> usize {
        self.clients.read().await.len()
    }

    /// Get open lobby count.
    pub async fn lobby_count(&self) -> usize {
        self.lobbies.lock().await.lobby_count()
    }

    /// Get running room count.
    pub async fn room_count(&self) -> usize {
        self.rooms.read().await.len()
    }
}

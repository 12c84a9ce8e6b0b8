//! Room Sessions
//!
//! Each `GameRoom` runs inside its own tokio task that owns it outright. The
//! gateway never touches the room directly: it sends `RoomCommand`s through a
//! `RoomHandle` and the task fans the resulting messages out to the room's
//! members.

use std::collections::BTreeMap;
use std::time::{Duration, Instant};

use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use crate::core::ids::PlayerId;
use crate::game::room::GameRoom;
use crate::game::types::{GameSnapshot, PlayerInput};
use crate::network::protocol::ServerMessage;

/// Commands sent from the gateway to a room task.
#[derive(Debug)]
pub enum RoomCommand {
    /// Add a player.
    Join {
        /// Connection id.
        player_id: PlayerId,
        /// Requested display name; blank gets a placeholder.
        name: String,
        /// Outbound channel.
        sender: mpsc::Sender<ServerMessage>,
    },
    /// Latch a player's input.
    Input {
        /// Connection id.
        player_id: PlayerId,
        /// Latest input state.
        input: PlayerInput,
    },
    /// Remove a player.
    Leave {
        /// Connection id.
        player_id: PlayerId,
    },
    /// Request a snapshot.
    Snapshot {
        /// Receives the copy.
        reply: oneshot::Sender<GameSnapshot>,
    },
    /// Seed collectibles and begin ticking.
    Start,
    /// Pause ticking.
    Stop,
    /// End the task.
    Shutdown,
}

/// Gateway-side handle to a running room task.
#[derive(Debug, Clone)]
pub struct RoomHandle {
    room_id: String,
    map_id: Option<String>,
    tx: mpsc::UnboundedSender<RoomCommand>,
}

impl RoomHandle {
    /// Room key (lobby id, or the free-play key).
    pub fn room_id(&self) -> &str {
        &self.room_id
    }

    /// Map the room was started on, if it came from a lobby.
    pub fn map_id(&self) -> Option<&str> {
        self.map_id.as_deref()
    }

    /// Add a player to the room.
    pub fn join(&self, player_id: &str, name: &str, sender: mpsc::Sender<ServerMessage>) {
        self.send(RoomCommand::Join {
            player_id: player_id.to_string(),
            name: name.to_string(),
            sender,
        });
    }

    /// Latch a player's input.
    pub fn input(&self, player_id: &str, input: PlayerInput) {
        self.send(RoomCommand::Input {
            player_id: player_id.to_string(),
            input,
        });
    }

    /// Remove a player.
    pub fn leave(&self, player_id: &str) {
        self.send(RoomCommand::Leave {
            player_id: player_id.to_string(),
        });
    }

    /// Begin ticking.
    pub fn start(&self) {
        self.send(RoomCommand::Start);
    }

    /// Pause ticking.
    pub fn stop(&self) {
        self.send(RoomCommand::Stop);
    }

    /// End the room task.
    pub fn shutdown(&self) {
        self.send(RoomCommand::Shutdown);
    }

    /// Current room snapshot, or `None` once the task is gone.
    pub async fn snapshot(&self) -> Option<GameSnapshot> {
        let (reply, rx) = oneshot::channel();
        self.tx.send(RoomCommand::Snapshot { reply }).ok()?;
        rx.await.ok()
    }

    /// Whether the room task has exited.
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }

    fn send(&self, cmd: RoomCommand) {
        if self.tx.send(cmd).is_err() {
            debug!("Room {} is gone, dropping command", self.room_id);
        }
    }
}

/// Spawn a room task. The room is idle until `RoomHandle::start`.
pub fn spawn_room_session(
    room_id: impl Into<String>,
    map_id: Option<String>,
    room: GameRoom,
) -> (RoomHandle, JoinHandle<()>) {
    let room_id = room_id.into();
    let (tx, rx) = mpsc::unbounded_channel();

    let task_room_id = room_id.clone();
    let handle = tokio::spawn(async move {
        run_room_session(task_room_id, room, rx).await;
    });

    (RoomHandle { room_id, map_id, tx }, handle)
}

/// The room's tick loop.
async fn run_room_session(
    room_id: String,
    mut room: GameRoom,
    mut cmd_rx: mpsc::UnboundedReceiver<RoomCommand>,
) {
    let tick_rate = room.config().tick_rate.max(1);
    let mut interval = tokio::time::interval(Duration::from_secs_f64(1.0 / f64::from(tick_rate)));
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

    let mut members: BTreeMap<PlayerId, mpsc::Sender<ServerMessage>> = BTreeMap::new();

    info!("Room {} session started ({} Hz)", room_id, tick_rate);

    loop {
        tokio::select! {
            cmd = cmd_rx.recv() => {
                match cmd {
                    Some(RoomCommand::Shutdown) | None => break,
                    Some(cmd) => handle_command(&room_id, &mut room, &mut members, cmd),
                }
            }
            _ = interval.tick() => {
                for event in room.tick(Instant::now()) {
                    broadcast(&members, ServerMessage::from(event));
                }
            }
        }
    }

    room.stop();
    info!("Room {} session ended", room_id);
}

fn handle_command(
    room_id: &str,
    room: &mut GameRoom,
    members: &mut BTreeMap<PlayerId, mpsc::Sender<ServerMessage>>,
    cmd: RoomCommand,
) {
    match cmd {
        RoomCommand::Join {
            player_id,
            name,
            sender,
        } => {
            let player = room.add_player(&player_id, &name);
            deliver(&sender, ServerMessage::GameState(room.get_state()));

            let joined = ServerMessage::PlayerJoined(player);
            for (id, member) in members.iter() {
                if *id != player_id {
                    deliver(member, joined.clone());
                }
            }
            members.insert(player_id.clone(), sender);
            debug!("Player {} joined room {}", player_id, room_id);
        }
        RoomCommand::Input { player_id, input } => {
            room.set_player_input(&player_id, input);
        }
        RoomCommand::Leave { player_id } => {
            let was_member = members.remove(&player_id).is_some();
            if room.remove_player(&player_id) || was_member {
                broadcast(members, ServerMessage::PlayerLeft { player_id: player_id.clone() });
                debug!("Player {} left room {}", player_id, room_id);
            }
        }
        RoomCommand::Snapshot { reply } => {
            let _ = reply.send(room.get_state());
        }
        RoomCommand::Start => room.start(),
        RoomCommand::Stop => room.stop(),
        RoomCommand::Shutdown => {}
    }
}

/// Send to every member.
fn broadcast(members: &BTreeMap<PlayerId, mpsc::Sender<ServerMessage>>, message: ServerMessage) {
    for sender in members.values() {
        deliver(sender, message.clone());
    }
}

/// Never block the tick loop on a slow client.
fn deliver(sender: &mpsc::Sender<ServerMessage>, message: ServerMessage) {
    if let Err(mpsc::error::TrySendError::Full(_)) = sender.try_send(message) {
        warn!("Client channel full, dropping room message");
    }
}

//! Game Room
//!
//! One active session: players, their latched inputs and the collectible
//! pool. The room has no timer of its own; whoever owns it calls `tick` at
//! the configured rate and forwards the returned events.

use std::collections::BTreeMap;
use std::time::Instant;

use tracing::debug;

use crate::core::config::GameConfig;
use crate::core::ids::PlayerId;
use crate::core::rng::ArenaRng;
use crate::game::events::RoomEvent;
use crate::game::logic::{check_collision, create_collectible, move_player};
use crate::game::types::{Collectible, GameSnapshot, PlayerInput, PlayerState};

/// Authoritative arena simulation.
pub struct GameRoom {
    config: GameConfig,
    players: BTreeMap<PlayerId, PlayerState>,
    inputs: BTreeMap<PlayerId, PlayerInput>,
    /// Keyed by id, which is also the collision scan order.
    collectibles: BTreeMap<String, Collectible>,
    /// Monotonic; drives color assignment and never goes back down.
    join_counter: usize,
    rng: ArenaRng,
    running: bool,
    last_tick: Option<Instant>,
}

impl GameRoom {
    /// Create a room seeded from OS entropy.
    pub fn new(config: GameConfig) -> Self {
        Self::with_rng(config, ArenaRng::from_entropy())
    }

    /// Create a room with a given generator (deterministic in tests).
    pub fn with_rng(config: GameConfig, rng: ArenaRng) -> Self {
        Self {
            config,
            players: BTreeMap::new(),
            inputs: BTreeMap::new(),
            collectibles: BTreeMap::new(),
            join_counter: 0,
            rng,
            running: false,
            last_tick: None,
        }
    }

    /// Room configuration.
    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    /// Add a player at a random spawn point. Blank names get a placeholder.
    pub fn add_player(&mut self, id: &str, name: &str) -> PlayerState {
        let mut name = self.config.clip_player_name(name);
        if name.is_empty() {
            name = format!("Player {}", self.players.len() + 1);
        }

        let margin = self.config.spawn_margin;
        let player = PlayerState {
            id: id.to_string(),
            x: self.rng.next_f32_range(margin, self.config.world_width - margin),
            y: self.rng.next_f32_range(margin, self.config.world_height - margin),
            color: self.config.color_for(self.join_counter),
            name,
            score: 0,
        };
        self.join_counter += 1;

        self.players.insert(player.id.clone(), player.clone());
        self.inputs.insert(player.id.clone(), PlayerInput::default());

        debug!("Player {} joined room at ({:.1}, {:.1})", id, player.x, player.y);
        player
    }

    /// Remove a player. Unknown ids are ignored.
    pub fn remove_player(&mut self, id: &str) -> bool {
        self.inputs.remove(id);
        self.players.remove(id).is_some()
    }

    /// Latch a player's input. Unknown ids are ignored.
    pub fn set_player_input(&mut self, id: &str, input: PlayerInput) {
        if let Some(latched) = self.inputs.get_mut(id) {
            *latched = input;
        }
    }

    /// Copy of every player and live collectible.
    pub fn get_state(&self) -> GameSnapshot {
        GameSnapshot {
            players: self.players.clone(),
            collectibles: self.collectibles.values().cloned().collect(),
        }
    }

    /// Look up a player.
    pub fn player(&self, id: &str) -> Option<&PlayerState> {
        self.players.get(id)
    }

    /// Number of players.
    pub fn player_count(&self) -> usize {
        self.players.len()
    }

    /// Number of live collectibles.
    pub fn collectible_count(&self) -> usize {
        self.collectibles.len()
    }

    /// Seed collectibles to the target and begin accepting ticks.
    ///
    /// Seeding emits nothing; joiners see the pool through their snapshot.
    pub fn start(&mut self) {
        if self.running {
            return;
        }
        while self.collectibles.len() < self.config.target_collectibles {
            let c = self.spawn_collectible();
            self.collectibles.insert(c.id.clone(), c);
        }
        self.running = true;
        self.last_tick = Some(Instant::now());
    }

    /// Stop accepting ticks. State is kept.
    pub fn stop(&mut self) {
        self.running = false;
        self.last_tick = None;
    }

    /// Whether `start` is in effect.
    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Advance by the wall-clock time since the previous tick.
    ///
    /// No-op while stopped.
    pub fn tick(&mut self, now: Instant) -> Vec<RoomEvent> {
        if !self.running {
            return Vec::new();
        }
        let delta = match self.last_tick {
            Some(last) => now.saturating_duration_since(last).as_secs_f32(),
            None => 0.0,
        };
        self.last_tick = Some(now);
        self.advance(delta)
    }

    /// Run one simulation step of `delta` seconds.
    pub fn advance(&mut self, delta: f32) -> Vec<RoomEvent> {
        let mut events = Vec::new();

        // 1. Movement
        for (id, player) in self.players.iter_mut() {
            let Some(input) = self.inputs.get(id).filter(|i| !i.is_idle()) else {
                continue;
            };
            let (prev_x, prev_y) = (player.x, player.y);
            move_player(player, input, delta, &self.config);

            if player.x != prev_x || player.y != prev_y {
                events.push(RoomEvent::PlayerMoved {
                    id: id.clone(),
                    x: player.x,
                    y: player.y,
                });
            }
        }

        // 2. Pickups: at most one per player, first hit in id order
        let ids: Vec<PlayerId> = self.players.keys().cloned().collect();
        for id in ids {
            let hit = match self.players.get(&id) {
                Some(player) => self
                    .collectibles
                    .values()
                    .find(|c| check_collision(player, c, &self.config))
                    .map(|c| c.id.clone()),
                None => None,
            };
            let Some(collectible) = hit.and_then(|cid| self.collectibles.remove(&cid)) else {
                continue;
            };
            let Some(player) = self.players.get_mut(&id) else {
                continue;
            };
            player.score += collectible.value;
            let score = player.score;

            events.push(RoomEvent::CollectibleCollected { id: collectible.id });
            events.push(RoomEvent::PlayerScored { id, score });

            // 3. Replenish
            if self.collectibles.len() < self.config.target_collectibles {
                let c = self.spawn_collectible();
                self.collectibles.insert(c.id.clone(), c.clone());
                events.push(RoomEvent::CollectibleSpawned(c));
            }
        }

        events
    }

    fn spawn_collectible(&mut self) -> Collectible {
        let taken = &self.collectibles;
        create_collectible(|id| taken.contains_key(id), &mut self.rng, &self.config)
    }
}

//! Tunables
//!
//! Every number the lobby and the arena simulation depend on lives here.
//! Defaults match the shipped client.

use serde::{Deserialize, Serialize};

/// Number of seats in every lobby.
///
/// Compile-time because lobby slots are a fixed-size array.
pub const MAX_PLAYERS_PER_LOBBY: usize = 4;

/// Default player colors, assigned round-robin.
pub const DEFAULT_PLAYER_COLORS: [u32; 4] = [0xff4444, 0x44ff44, 0x4444ff, 0xffff44];

/// Configuration shared by the lobby layer and game rooms.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameConfig {
    /// World width in world units.
    pub world_width: f32,
    /// World height in world units.
    pub world_height: f32,
    /// Player collision radius; also the clamp margin at the world edge.
    pub player_radius: f32,
    /// Player speed per axis, in units per second.
    pub player_speed: f32,
    /// Collectible collision radius.
    pub collectible_radius: f32,
    /// Number of live collectibles a room keeps topped up.
    pub target_collectibles: usize,
    /// Simulation rate (Hz).
    pub tick_rate: u32,
    /// Distance from the world edge inside which players never spawn.
    pub spawn_margin: f32,
    /// Longest accepted player name (chars). Longer names are truncated.
    pub player_name_max_len: usize,
    /// Longest accepted lobby name (chars). Longer names are truncated.
    pub lobby_name_max_len: usize,
    /// Player color palette.
    pub player_colors: Vec<u32>,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            world_width: 1200.0,
            world_height: 800.0,
            player_radius: 20.0,
            player_speed: 200.0,
            collectible_radius: 10.0,
            target_collectibles: 10,
            tick_rate: 60,
            spawn_margin: 50.0,
            player_name_max_len: 16,
            lobby_name_max_len: 24,
            player_colors: DEFAULT_PLAYER_COLORS.to_vec(),
        }
    }
}

impl GameConfig {
    /// Color for the n-th assignment, wrapping around the palette.
    pub fn color_for(&self, index: usize) -> u32 {
        if self.player_colors.is_empty() {
            return DEFAULT_PLAYER_COLORS[index % DEFAULT_PLAYER_COLORS.len()];
        }
        self.player_colors[index % self.player_colors.len()]
    }

    /// Clip a player name to the configured length.
    pub fn clip_player_name(&self, name: &str) -> String {
        clip(name, self.player_name_max_len)
    }

    /// Clip a lobby name to the configured length.
    pub fn clip_lobby_name(&self, name: &str) -> String {
        clip(name, self.lobby_name_max_len)
    }
}

fn clip(s: &str, max_chars: usize) -> String {
    s.trim().chars().take(max_chars).collect()
}

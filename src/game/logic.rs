//! Simulation Primitives
//!
//! Stateless movement, collision and collectible placement. The room drives
//! these once per tick; nothing here reads a clock.

use crate::core::config::GameConfig;
use crate::core::rng::ArenaRng;
use crate::game::types::{Collectible, PlayerInput, PlayerState};

/// Constrain `value` to `[min, max]`.
#[inline]
pub fn clamp(value: f32, min: f32, max: f32) -> f32 {
    value.min(max).max(min)
}

/// Integrate one step of movement and clamp to the arena.
///
/// Axes are independent: a diagonal covers `speed * delta` on each axis.
pub fn move_player(player: &mut PlayerState, input: &PlayerInput, delta: f32, config: &GameConfig) {
    let step = config.player_speed * delta;

    if input.left {
        player.x -= step;
    }
    if input.right {
        player.x += step;
    }
    if input.up {
        player.y -= step;
    }
    if input.down {
        player.y += step;
    }

    let r = config.player_radius;
    player.x = clamp(player.x, r, config.world_width - r);
    player.y = clamp(player.y, r, config.world_height - r);
}

/// Circle overlap between a player and a collectible.
///
/// Touching exactly at the sum of radii does not count.
#[inline]
pub fn check_collision(player: &PlayerState, collectible: &Collectible, config: &GameConfig) -> bool {
    let dx = player.x - collectible.x;
    let dy = player.y - collectible.y;
    let reach = config.player_radius + config.collectible_radius;
    dx * dx + dy * dy < reach * reach
}

/// Spawn a collectible whose id is not taken according to `is_taken`.
pub fn create_collectible<F>(is_taken: F, rng: &mut ArenaRng, config: &GameConfig) -> Collectible
where
    F: Fn(&str) -> bool,
{
    let mut id = format!("c_{}", rng.next_token());
    while is_taken(&id) {
        id = format!("c_{}", rng.next_token());
    }

    let r = config.collectible_radius;
    Collectible {
        id,
        x: rng.next_f32_range(r, config.world_width - r),
        y: rng.next_f32_range(r, config.world_height - r),
        value: rng.next_int_range(1, 3),
    }
}

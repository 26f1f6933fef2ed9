//! Hammer Fight - a physics-driven aerial melee
//!
//! Core modules:
//! - `sim`: Deterministic simulation (rigid bodies, combat, spawning, difficulty)
//! - `tuning`: Data-driven game balance

pub mod sim;
pub mod tuning;

pub use tuning::{Tuning, TuningError};

use glam::Vec2;

/// Game configuration constants (defaults for [`Tuning`])
pub mod consts {
    /// Simulation ticks per second
    pub const FPS: f32 = 60.0;
    /// Simulated seconds per real second (the fixed step is `GAME_SPEED / FPS`)
    pub const GAME_SPEED: f32 = 1.0;

    /// Arena dimensions (y axis up, origin bottom-left)
    pub const ARENA_WIDTH: f32 = 1024.0;
    pub const ARENA_HEIGHT: f32 = 768.0;

    /// World gravity (pixels/s², pointing down)
    pub const GRAVITY: f32 = -900.0;
    /// Fraction of velocity kept after one second (prevents eternal swinging)
    pub const DAMPING: f32 = 0.3;
    /// Solver iterations per step
    pub const SOLVER_ITERATIONS: u32 = 10;

    pub const PLAYER_ARMOR: f32 = 10_000.0;
    pub const ENEMY_ARMOR: f32 = 3_000.0;
    /// Plain enemies switch to the damaged look below this armor
    pub const ENEMY_DAMAGED_ARMOR: f32 = 1_500.0;

    pub const MAX_ENEMIES: usize = 10;
    /// Seconds between spawns at the start of a run
    pub const DEFAULT_SPAWN_INTERVAL: f32 = 5.0;
    /// Spawn interval never drops below this
    pub const MIN_SPAWN_INTERVAL: f32 = 1.0;
    /// Interval multiplier applied on each difficulty ramp
    pub const SPAWN_INTERVAL_COEFFICIENT: f32 = 0.8;
    /// Kills between difficulty ramps
    pub const KILL_LIMIT_SPAWN_INTERVAL_CHANGE: u64 = 3;
    /// Seconds a dead enemy stays in the world for its fade-out
    pub const REMOVAL_GRACE_DELAY: f32 = 0.5;

    /// Bonus draw weights, in enumeration order
    pub const NO_BONUS_WEIGHT: f32 = 0.90;
    pub const HEALTH_BONUS_WEIGHT: f32 = 0.07;
    pub const KILLALL_BONUS_WEIGHT: f32 = 0.03;
}

/// Rotate a body-local offset into world orientation
#[inline]
pub fn rotate(offset: Vec2, angle: f32) -> Vec2 {
    Vec2::from_angle(angle).rotate(offset)
}

/// Convert a physics angle (radians, counter-clockwise) to sprite rotation
/// (degrees, clockwise)
#[inline]
pub fn sprite_rotation(angle: f32) -> f32 {
    -angle.to_degrees()
}

/// Convert a duration in simulated seconds to a whole number of ticks (at least one)
#[inline]
pub fn seconds_to_ticks(seconds: f32, dt: f32) -> u64 {
    ((seconds / dt).round() as u64).max(1)
}

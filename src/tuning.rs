//! Game balance and physics tuning
//!
//! Every constant the simulation consumes lives here so a run can be
//! reconfigured from JSON. Values are empirical (gameplay feel), not derived.

use std::f32::consts::PI;

use glam::Vec2;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::consts::*;
use crate::sim::BonusType;

/// Weight sums may drift this far from 1.0
const WEIGHT_TOLERANCE: f32 = 1e-4;

/// Fatal configuration problems, reported at session start
#[derive(Debug, Error)]
pub enum TuningError {
    #[error("bonus distribution is empty")]
    EmptyDistribution,
    #[error("bonus weight for {kind:?} is invalid: {weight}")]
    InvalidWeight { kind: BonusType, weight: f32 },
    #[error("bonus weights sum to {0}, expected 1")]
    WeightSum(f32),
    #[error("{name} must be positive and finite, got {value}")]
    NonPositive { name: &'static str, value: f32 },
    #[error("damping must be in (0, 1], got {0}")]
    Damping(f32),
    #[error("spawn interval coefficient must be in (0, 1), got {0}")]
    Coefficient(f32),
    #[error("minimum spawn interval {min} exceeds the default {default}")]
    IntervalFloor { min: f32, default: f32 },
    #[error("{0} must be at least 1")]
    ZeroCount(&'static str),
    #[error("invalid tuning json: {0}")]
    Json(#[from] serde_json::Error),
}

/// Physics world and arena
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldTuning {
    pub fps: f32,
    pub game_speed: f32,
    pub gravity: Vec2,
    /// Fraction of velocity kept per simulated second
    pub damping: f32,
    pub solver_iterations: u32,
    pub width: f32,
    pub height: f32,
}

impl Default for WorldTuning {
    fn default() -> Self {
        Self {
            fps: FPS,
            game_speed: GAME_SPEED,
            gravity: Vec2::new(0.0, GRAVITY),
            damping: DAMPING,
            solver_iterations: SOLVER_ITERATIONS,
            width: ARENA_WIDTH,
            height: ARENA_HEIGHT,
        }
    }
}

/// Player hammer: flying body, pivoting sword, cursor spring
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HammerTuning {
    pub armor: f32,
    pub aim_mass: f32,
    pub body_mass: f32,
    pub body_size: Vec2,
    pub sword_mass: f32,
    pub sword_size: Vec2,
    /// Sword center below the body center
    pub sword_offset: f32,
    /// Pivot below the body center (keeps the body self-righting)
    pub pivot_offset: f32,
    pub spring_rest_length: f32,
    pub spring_stiffness: f32,
    pub spring_damping: f32,
    pub angle_limit: f32,
    pub body_angular_velocity_limit: f32,
    pub sword_angular_velocity_limit: f32,
    /// Height of the propeller above the body center
    pub propeller_height: f32,
    pub elasticity: f32,
    pub friction: f32,
}

impl Default for HammerTuning {
    fn default() -> Self {
        Self {
            armor: PLAYER_ARMOR,
            aim_mass: 1.0,
            body_mass: 6.0,
            body_size: Vec2::new(34.0, 45.0),
            sword_mass: 15.0,
            sword_size: Vec2::new(8.0, 120.0),
            sword_offset: 60.0,
            pivot_offset: 1.0,
            spring_rest_length: 1.0,
            spring_stiffness: 4000.0,
            spring_damping: 1.0,
            angle_limit: PI / 4.0,
            body_angular_velocity_limit: PI / 4.0,
            sword_angular_velocity_limit: 1.8 * PI,
            propeller_height: 21.0,
            elasticity: 0.9,
            friction: 0.8,
        }
    }
}

/// Pursuing enemies
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EnemyTuning {
    pub armor: f32,
    pub damaged_armor: f32,
    pub mass: f32,
    pub aim_mass: f32,
    pub radius: f32,
    pub spring_rest_length: f32,
    pub spring_stiffness: f32,
    pub spring_damping: f32,
    /// Pursuit aggression: how far past the hammer the enemy aims
    pub pursuit_k: f32,
    /// Within this distance an extra impulse pushes the enemy into the hammer
    pub proximity_radius: f32,
    /// Opacity multiplier applied every tick once dead
    pub fade: f32,
    pub elasticity: f32,
    pub friction: f32,
}

impl Default for EnemyTuning {
    fn default() -> Self {
        Self {
            armor: ENEMY_ARMOR,
            damaged_armor: ENEMY_DAMAGED_ARMOR,
            mass: 3.0,
            aim_mass: 1.0,
            radius: 15.0,
            spring_rest_length: 1.0,
            spring_stiffness: 600.0,
            spring_damping: 100.0,
            pursuit_k: 1.5,
            proximity_radius: 100.0,
            fade: 0.91,
            elasticity: 0.9,
            friction: 0.8,
        }
    }
}

/// Spawn timer, difficulty ramp and bonus draw
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SpawnTuning {
    pub max_enemies: usize,
    pub default_interval: f32,
    pub min_interval: f32,
    pub interval_coefficient: f32,
    pub kills_per_ramp: u64,
    pub removal_grace_delay: f32,
    /// Horizontal margin for spawn positions
    pub margin_x: f32,
    /// Spawn height above the top edge; enemies below `-margin_y` are culled
    pub margin_y: f32,
    /// Draw weights in enumeration order, must sum to 1
    pub bonus_weights: Vec<(BonusType, f32)>,
}

impl Default for SpawnTuning {
    fn default() -> Self {
        Self {
            max_enemies: MAX_ENEMIES,
            default_interval: DEFAULT_SPAWN_INTERVAL,
            min_interval: MIN_SPAWN_INTERVAL,
            interval_coefficient: SPAWN_INTERVAL_COEFFICIENT,
            kills_per_ramp: KILL_LIMIT_SPAWN_INTERVAL_CHANGE,
            removal_grace_delay: REMOVAL_GRACE_DELAY,
            margin_x: 30.0,
            margin_y: 50.0,
            bonus_weights: vec![
                (BonusType::None, NO_BONUS_WEIGHT),
                (BonusType::HealthBonus, HEALTH_BONUS_WEIGHT),
                (BonusType::KillAllBonus, KILLALL_BONUS_WEIGHT),
            ],
        }
    }
}

/// Complete tuning for one session
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuning {
    pub world: WorldTuning,
    pub hammer: HammerTuning,
    pub enemy: EnemyTuning,
    pub spawn: SpawnTuning,
}

fn positive(name: &'static str, value: f32) -> Result<(), TuningError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(TuningError::NonPositive { name, value })
    }
}

/// Check a discrete distribution: non-empty, non-negative, summing to 1
pub fn validate_weights(weights: &[(BonusType, f32)]) -> Result<(), TuningError> {
    if weights.is_empty() {
        return Err(TuningError::EmptyDistribution);
    }
    for &(kind, weight) in weights {
        if !weight.is_finite() || weight < 0.0 {
            return Err(TuningError::InvalidWeight { kind, weight });
        }
    }
    let sum: f32 = weights.iter().map(|(_, w)| w).sum();
    if (sum - 1.0).abs() > WEIGHT_TOLERANCE {
        return Err(TuningError::WeightSum(sum));
    }
    Ok(())
}

impl Tuning {
    /// Parse tuning from JSON (missing fields keep their defaults) and validate it
    pub fn from_json(json: &str) -> Result<Self, TuningError> {
        let tuning: Self = serde_json::from_str(json)?;
        tuning.validate()?;
        Ok(tuning)
    }

    pub fn to_json(&self) -> Result<String, TuningError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Fixed simulation step in seconds
    pub fn dt(&self) -> f32 {
        self.world.game_speed / self.world.fps
    }

    /// Convert simulated seconds to ticks at this tuning's step
    pub fn ticks(&self, seconds: f32) -> u64 {
        crate::seconds_to_ticks(seconds, self.dt())
    }

    pub fn validate(&self) -> Result<(), TuningError> {
        let w = &self.world;
        positive("fps", w.fps)?;
        positive("game_speed", w.game_speed)?;
        if !(w.damping > 0.0 && w.damping <= 1.0) {
            return Err(TuningError::Damping(w.damping));
        }
        positive("width", w.width)?;
        positive("height", w.height)?;
        if w.solver_iterations == 0 {
            return Err(TuningError::ZeroCount("solver_iterations"));
        }

        let h = &self.hammer;
        positive("hammer.armor", h.armor)?;
        positive("hammer.aim_mass", h.aim_mass)?;
        positive("hammer.body_mass", h.body_mass)?;
        positive("hammer.sword_mass", h.sword_mass)?;
        positive("hammer.body_size.x", h.body_size.x)?;
        positive("hammer.body_size.y", h.body_size.y)?;
        positive("hammer.sword_size.x", h.sword_size.x)?;
        positive("hammer.sword_size.y", h.sword_size.y)?;
        positive("hammer.spring_stiffness", h.spring_stiffness)?;
        positive("hammer.angle_limit", h.angle_limit)?;

        let e = &self.enemy;
        positive("enemy.armor", e.armor)?;
        positive("enemy.mass", e.mass)?;
        positive("enemy.aim_mass", e.aim_mass)?;
        positive("enemy.radius", e.radius)?;
        positive("enemy.spring_stiffness", e.spring_stiffness)?;
        positive("enemy.fade", e.fade)?;

        let s = &self.spawn;
        positive("spawn.default_interval", s.default_interval)?;
        positive("spawn.min_interval", s.min_interval)?;
        positive("spawn.removal_grace_delay", s.removal_grace_delay)?;
        if !(s.interval_coefficient > 0.0 && s.interval_coefficient < 1.0) {
            return Err(TuningError::Coefficient(s.interval_coefficient));
        }
        if s.min_interval > s.default_interval {
            return Err(TuningError::IntervalFloor {
                min: s.min_interval,
                default: s.default_interval,
            });
        }
        if s.kills_per_ramp == 0 {
            return Err(TuningError::ZeroCount("spawn.kills_per_ramp"));
        }
        if s.max_enemies == 0 {
            return Err(TuningError::ZeroCount("spawn.max_enemies"));
        }
        validate_weights(&s.bonus_weights)
    }
}

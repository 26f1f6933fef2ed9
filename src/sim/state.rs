//! Session state and core simulation types
//!
//! A session owns the physics world, both kinds of actor, the scheduler and
//! the seeded RNG. Nothing here is global; callers pass the session around.

use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::combat::CollisionResolver;
use super::difficulty::DifficultyController;
use super::enemy::{BonusType, Enemy, EnemyId};
use super::hammer::Hammer;
use super::lifecycle::{EnemyRoster, Scheduler};
use super::physics::{PhysicsError, PhysicsWorld};
use crate::tuning::{Tuning, TuningError};

/// Current phase of gameplay
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GamePhase {
    Playing,
    Paused,
    /// Hammer destroyed; physics and spawning have stopped
    GameOver,
}

/// Notifications for the surrounding controller (HUD, sounds, score labels)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GameEvent {
    EnemySpawned { id: EnemyId },
    EnemyKilled { id: EnemyId, bonus: BonusType },
    HammerHit,
    HammerRepaired,
    SpawnIntervalChanged { interval: f32 },
    GameOver { score: u64 },
}

#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    Tuning(#[from] TuningError),
    #[error("failed to build actor: {0}")]
    Physics(#[from] PhysicsError),
}

pub struct Session {
    pub tuning: Tuning,
    /// Run seed for reproducibility
    pub seed: u64,
    pub rng: Pcg32,
    pub world: PhysicsWorld,
    pub hammer: Hammer,
    pub enemies: EnemyRoster,
    pub scheduler: Scheduler,
    pub difficulty: DifficultyController,
    pub resolver: CollisionResolver,
    pub phase: GamePhase,
    /// Simulation tick counter
    pub time_ticks: u64,
    /// Last aim target received from input
    pub target: Vec2,
    /// Kills recorded during the current step, settled after it
    pub pending_kills: Vec<EnemyId>,
    pub events: Vec<GameEvent>,
    /// Fixed step in seconds
    dt: f32,
}

impl Session {
    /// Validate the tuning, build the world and the hammer, start the spawn timer
    pub fn new(tuning: Tuning, seed: u64) -> Result<Self, SessionError> {
        tuning.validate()?;
        let w = &tuning.world;
        let mut world = PhysicsWorld::new(w.gravity, w.damping, w.solver_iterations);
        let center = Vec2::new(w.width / 2.0, w.height / 2.0);
        let hammer = Hammer::spawn(&mut world, center, &tuning.hammer)?;
        let difficulty = DifficultyController::new(&tuning.spawn)?;

        let mut scheduler = Scheduler::new();
        scheduler.start_spawn_timer(tuning.ticks(difficulty.spawn_interval()));

        log::info!(
            "session started (seed {seed}, {}x{}, dt {:.4}s)",
            w.width,
            w.height,
            tuning.dt()
        );
        Ok(Self {
            dt: tuning.dt(),
            rng: Pcg32::seed_from_u64(seed),
            seed,
            world,
            hammer,
            enemies: EnemyRoster::new(),
            scheduler,
            difficulty,
            resolver: CollisionResolver::standard(),
            phase: GamePhase::Playing,
            time_ticks: 0,
            target: center,
            pending_kills: Vec::new(),
            events: Vec::new(),
            tuning,
        })
    }

    pub fn dt(&self) -> f32 {
        self.dt
    }

    pub fn score(&self) -> u64 {
        self.difficulty.state().score
    }

    pub fn is_over(&self) -> bool {
        self.phase == GamePhase::GameOver
    }

    /// Spawn one enemy above the arena, unless the field is full or the run
    /// has ended. Returns the new enemy's id.
    pub fn spawn_enemy(&mut self) -> Result<Option<EnemyId>, PhysicsError> {
        if self.is_over() || self.enemies.len() >= self.tuning.spawn.max_enemies {
            return Ok(None);
        }
        let bonus = self.difficulty.draw_bonus(&mut self.rng);
        let (width, height) = (self.tuning.world.width, self.tuning.world.height);
        let margin = self.tuning.spawn.margin_x;
        let x = if width - margin > margin {
            self.rng.random_range(margin..=width - margin)
        } else {
            width / 2.0
        };
        let position = Vec2::new(x, height + self.tuning.spawn.margin_y);

        let id = self.enemies.next_id();
        let enemy = Enemy::spawn(&mut self.world, id, position, bonus, &self.tuning.enemy)?;
        self.enemies.insert(enemy);
        self.events.push(GameEvent::EnemySpawned { id });
        log::debug!("enemy {} spawned at ({x:.0}, {:.0}) with {bonus:?}", id.0, position.y);
        Ok(Some(id))
    }

    /// Stop the run: no more physics steps and no more spawns
    pub fn end_game(&mut self) {
        if self.is_over() {
            return;
        }
        self.phase = GamePhase::GameOver;
        self.scheduler.cancel_spawn_timer();
        let score = self.score();
        self.events.push(GameEvent::GameOver { score });
        log::info!("game over: score {score}, {} kills", self.difficulty.state().kills);
    }

    /// Take the events accumulated since the last call
    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    /// Remove every actor from the world. Actions still queued afterwards are
    /// harmless no-ops.
    pub fn teardown(&mut self) {
        self.end_game();
        self.enemies.clear(&mut self.world);
        self.world.clear();
        self.pending_kills.clear();
        log::info!("session torn down");
    }
}

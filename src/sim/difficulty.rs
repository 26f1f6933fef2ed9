//! Score, spawn-rate ramp and bonus draws

use std::collections::VecDeque;

use rand::Rng;
use serde::{Deserialize, Serialize};

use super::enemy::{BonusType, EnemyId};
use super::hammer::Hammer;
use super::lifecycle::{Action, EnemyRoster, Scheduler};
use super::state::GameEvent;
use crate::seconds_to_ticks;
use crate::tuning::{SpawnTuning, TuningError, validate_weights};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoreState {
    pub score: u64,
    pub kills: u64,
    /// Seconds between spawns
    pub spawn_interval: f32,
}

/// Weighted discrete distribution over bonus types
#[derive(Debug, Clone)]
pub struct BonusTable {
    weights: Vec<(BonusType, f32)>,
}

impl BonusTable {
    pub fn new(weights: Vec<(BonusType, f32)>) -> Result<Self, TuningError> {
        validate_weights(&weights)?;
        Ok(Self { weights })
    }

    /// Inverse CDF: first category whose cumulative weight reaches `r`
    pub fn sample(&self, r: f32) -> BonusType {
        let mut cumulative = 0.0;
        for &(kind, weight) in &self.weights {
            cumulative += weight;
            if cumulative >= r {
                return kind;
            }
        }
        // Rounding left the sum a hair under r
        self.weights.last().map_or(BonusType::None, |(kind, _)| *kind)
    }

    pub fn draw<R: Rng + ?Sized>(&self, rng: &mut R) -> BonusType {
        self.sample(rng.random::<f32>())
    }
}

/// Everything a kill can touch once the physics step is over
pub struct KillContext<'a> {
    pub hammer: &'a mut Hammer,
    pub enemies: &'a mut EnemyRoster,
    pub scheduler: &'a mut Scheduler,
    pub events: &'a mut Vec<GameEvent>,
    /// Death grace delay, in ticks
    pub grace_ticks: u64,
    pub dt: f32,
}

#[derive(Debug, Clone)]
pub struct DifficultyController {
    state: ScoreState,
    min_interval: f32,
    coefficient: f32,
    kills_per_ramp: u64,
    bonuses: BonusTable,
}

impl DifficultyController {
    pub fn new(tuning: &SpawnTuning) -> Result<Self, TuningError> {
        Ok(Self {
            state: ScoreState {
                score: 0,
                kills: 0,
                spawn_interval: tuning.default_interval,
            },
            min_interval: tuning.min_interval,
            coefficient: tuning.interval_coefficient,
            kills_per_ramp: tuning.kills_per_ramp.max(1),
            bonuses: BonusTable::new(tuning.bonus_weights.clone())?,
        })
    }

    pub fn state(&self) -> &ScoreState {
        &self.state
    }

    pub fn spawn_interval(&self) -> f32 {
        self.state.spawn_interval
    }

    pub fn draw_bonus<R: Rng + ?Sized>(&self, rng: &mut R) -> BonusType {
        self.bonuses.draw(rng)
    }

    /// Count one kill. Every `kills_per_ramp` kills the spawn interval shrinks
    /// toward the floor; returns the new interval when it changed.
    pub fn record_kill(&mut self) -> Option<f32> {
        self.state.score += 1;
        self.state.kills += 1;
        if self.state.kills % self.kills_per_ramp != 0 {
            return None;
        }
        let next = (self.state.spawn_interval * self.coefficient).max(self.min_interval);
        if next < self.state.spawn_interval {
            self.state.spawn_interval = next;
            Some(next)
        } else {
            None
        }
    }

    /// Apply the effects of queued kills in order. A kill-all bonus suicides
    /// every other live enemy, and those deaths are queued behind it; an enemy
    /// can only die once, so the cascade terminates.
    pub fn settle_kills(&mut self, kills: &mut Vec<EnemyId>, ctx: KillContext<'_>) {
        let mut queue: VecDeque<EnemyId> = kills.drain(..).collect();
        while let Some(id) = queue.pop_front() {
            let Some(bonus) = ctx.enemies.get(id).map(|e| e.bonus) else {
                continue;
            };
            ctx.events.push(GameEvent::EnemyKilled { id, bonus });
            ctx.scheduler.schedule_in(ctx.grace_ticks, Action::RemoveEnemy(id));

            if let Some(interval) = self.record_kill() {
                log::info!("spawn interval now {interval:.2}s");
                ctx.scheduler.start_spawn_timer(seconds_to_ticks(interval, ctx.dt));
                ctx.events.push(GameEvent::SpawnIntervalChanged { interval });
            }

            match bonus {
                BonusType::None => {}
                BonusType::HealthBonus => {
                    if ctx.hammer.is_alive() {
                        ctx.hammer.repair();
                        ctx.events.push(GameEvent::HammerRepaired);
                        log::info!("health bonus: hammer repaired");
                    }
                }
                BonusType::KillAllBonus => {
                    let before = queue.len();
                    for other in ctx.enemies.iter_mut() {
                        if other.id != id && other.suicide() {
                            queue.push_back(other.id);
                        }
                    }
                    log::info!("kill-all bonus: {} enemies destroyed", queue.len() - before);
                }
            }
        }
    }
}

//! Fixed timestep simulation tick
//!
//! One tick: physics step with combat callbacks, actor updates, kill
//! settlement, then deferred lifecycle actions. Ticks never overlap and all
//! structural world changes happen outside the physics step.

use glam::Vec2;

use super::combat::{CombatContext, CombatListener};
use super::difficulty::KillContext;
use super::lifecycle::Action;
use super::state::{GamePhase, Session};

/// Input commands for a single tick (deterministic)
#[derive(Debug, Clone, Default)]
pub struct TickInput {
    /// Aim target (pointer position); `None` keeps the previous target
    pub target: Option<Vec2>,
    /// Pause toggle
    pub pause: bool,
    /// Demo mode - the hammer hunts enemies on its own
    pub autopilot: bool,
}

/// Advance the session by one fixed timestep
pub fn tick(session: &mut Session, input: &TickInput) {
    if input.pause {
        match session.phase {
            GamePhase::Playing => {
                session.phase = GamePhase::Paused;
                return;
            }
            GamePhase::Paused => session.phase = GamePhase::Playing,
            GamePhase::GameOver => {}
        }
    }
    if session.phase == GamePhase::Paused {
        return;
    }

    session.time_ticks += 1;
    session.scheduler.advance();

    if session.phase == GamePhase::Playing {
        if input.autopilot {
            session.target = autopilot_target(session);
        } else if let Some(target) = input.target {
            session.target = target;
        }
        step_physics(session);
        update_actors(session);
        settle_kills(session);
        if !session.hammer.is_alive() {
            session.end_game();
        }
    }

    run_due_actions(session);
    cull_fallen(session);
}

fn step_physics(session: &mut Session) {
    let dt = session.dt();
    let mut listener = CombatListener {
        resolver: &session.resolver,
        ctx: CombatContext {
            hammer: &mut session.hammer,
            enemies: &mut session.enemies,
            kills: &mut session.pending_kills,
            events: &mut session.events,
        },
    };
    session.world.step(dt, &mut listener);
}

fn update_actors(session: &mut Session) {
    let world = &mut session.world;
    session.hammer.move_to(world, session.target);
    session.hammer.update(world);

    let Some(hammer) = session.hammer.position(world) else {
        return;
    };
    let tuning = &session.tuning.enemy;
    for enemy in session.enemies.iter_mut() {
        enemy.pursue(world, hammer, tuning.pursuit_k, tuning.proximity_radius);
        enemy.update(world);
    }
}

fn settle_kills(session: &mut Session) {
    if session.pending_kills.is_empty() {
        return;
    }
    let grace_ticks = session.tuning.ticks(session.tuning.spawn.removal_grace_delay);
    let dt = session.dt();
    session.difficulty.settle_kills(
        &mut session.pending_kills,
        KillContext {
            hammer: &mut session.hammer,
            enemies: &mut session.enemies,
            scheduler: &mut session.scheduler,
            events: &mut session.events,
            grace_ticks,
            dt,
        },
    );
}

fn run_due_actions(session: &mut Session) {
    while let Some(action) = session.scheduler.pop_due() {
        match action {
            Action::RemoveEnemy(id) => {
                session.enemies.remove(&mut session.world, id);
            }
            Action::Spawn { .. } => {
                if let Err(err) = session.spawn_enemy() {
                    log::error!("enemy spawn failed: {err}");
                }
            }
        }
    }
}

/// Enemies that dropped off the bottom of the arena leave immediately
fn cull_fallen(session: &mut Session) {
    let floor = -session.tuning.spawn.margin_y;
    let fallen: Vec<_> = session
        .enemies
        .iter()
        .filter(|e| e.position(&session.world).is_some_and(|p| p.y < floor))
        .map(|e| e.id)
        .collect();
    for id in fallen {
        session.enemies.remove(&mut session.world, id);
    }
}

/// Park the sword at the nearest live enemy's height and sweep across it
fn autopilot_target(session: &Session) -> Vec2 {
    let world = &session.world;
    let Some(hammer) = session.hammer.position(world) else {
        return session.target;
    };
    let nearest = session
        .enemies
        .iter()
        .filter(|e| e.is_alive())
        .filter_map(|e| e.position(world))
        .min_by(|a, b| {
            a.distance_squared(hammer)
                .partial_cmp(&b.distance_squared(hammer))
                .unwrap_or(std::cmp::Ordering::Equal)
        });
    let center = Vec2::new(session.tuning.world.width, session.tuning.world.height) / 2.0;
    match nearest {
        Some(enemy) => {
            let sweep = (session.time_ticks as f32 * 0.15).sin() * 80.0;
            enemy + Vec2::new(sweep, session.tuning.hammer.sword_offset)
        }
        None => center,
    }
}

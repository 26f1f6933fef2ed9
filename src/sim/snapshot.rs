//! Read-only view of a session for the rendering and HUD layer

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::enemy::{BonusType, EnemyId};
use super::hammer::HammerTransform;
use super::state::{GamePhase, Session};
use crate::sprite_rotation;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnemySprite {
    pub id: EnemyId,
    pub position: Vec2,
    /// Degrees, clockwise
    pub rotation: f32,
    pub opacity: f32,
    pub alive: bool,
    pub damaged: bool,
    pub bonus: BonusType,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderSnapshot {
    pub tick: u64,
    pub phase: GamePhase,
    pub score: u64,
    pub armor: f32,
    pub max_armor: f32,
    pub hammer_alive: bool,
    pub hammer: HammerTransform,
    pub enemies: Vec<EnemySprite>,
}

impl RenderSnapshot {
    pub fn capture(session: &Session) -> Self {
        let world = &session.world;
        let enemies = session
            .enemies
            .iter()
            .filter_map(|enemy| {
                Some(EnemySprite {
                    id: enemy.id,
                    position: world.position(enemy.body())?,
                    rotation: sprite_rotation(world.angle(enemy.body())?),
                    opacity: enemy.opacity(),
                    alive: enemy.is_alive(),
                    damaged: enemy.is_damaged(),
                    bonus: enemy.bonus,
                })
            })
            .collect();
        Self {
            tick: session.time_ticks,
            phase: session.phase,
            score: session.score(),
            armor: session.hammer.armor(),
            max_armor: session.hammer.max_armor(),
            hammer_alive: session.hammer.is_alive(),
            hammer: *session.hammer.transform(),
            enemies,
        }
    }
}

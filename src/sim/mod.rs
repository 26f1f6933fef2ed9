//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Fixed timestep only
//! - Seeded RNG only
//! - Stable iteration order (by handle or entity ID)
//! - No rendering or platform dependencies

pub mod combat;
pub mod difficulty;
pub mod enemy;
pub mod hammer;
pub mod lifecycle;
pub mod physics;
pub mod snapshot;
pub mod state;
pub mod tick;

pub use combat::{CollisionResolver, CombatContext, CombatListener, Handler, Hit};
pub use difficulty::{BonusTable, DifficultyController, KillContext, ScoreState};
pub use enemy::{BonusType, Enemy, EnemyId};
pub use hammer::{Hammer, HammerTransform};
pub use lifecycle::{Action, EnemyRoster, Scheduler};
pub use physics::{PhysicsError, PhysicsWorld};
pub use snapshot::{EnemySprite, RenderSnapshot};
pub use state::{GameEvent, GamePhase, Session, SessionError};
pub use tick::{TickInput, tick};

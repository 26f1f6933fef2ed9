//! Collision-to-damage resolution
//!
//! Contacts are dispatched on the pair of collision types through a lookup
//! table. Damage equals the impulse the solver applied to the pair this step,
//! so a fast direct hit hurts more than a slow glancing one.

use std::collections::BTreeMap;

use super::enemy::EnemyId;
use super::hammer::Hammer;
use super::lifecycle::EnemyRoster;
use super::physics::{Arbiter, CollisionType, ContactListener, ShapeHandle};
use super::state::GameEvent;

/// A solved contact, ordered to match the handler's registered pair
#[derive(Debug, Clone, Copy)]
pub struct Hit {
    pub first: ShapeHandle,
    pub second: ShapeHandle,
    pub impulse: f32,
}

/// Actor state a handler may touch while the physics step is running.
/// Handlers never add or remove bodies; deaths are queued in `kills`.
pub struct CombatContext<'a> {
    pub hammer: &'a mut Hammer,
    pub enemies: &'a mut EnemyRoster,
    pub kills: &'a mut Vec<EnemyId>,
    pub events: &'a mut Vec<GameEvent>,
}

/// Returns whether the pair keeps colliding
pub type Handler = fn(&mut CombatContext<'_>, &Hit) -> bool;

#[derive(Clone, Default)]
pub struct CollisionResolver {
    handlers: BTreeMap<(CollisionType, CollisionType), Handler>,
}

impl std::fmt::Debug for CollisionResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CollisionResolver")
            .field("pairs", &self.handlers.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl CollisionResolver {
    /// Empty table: every contact gets the plain physical response
    pub fn new() -> Self {
        Self::default()
    }

    /// The game's two combat rules
    pub fn standard() -> Self {
        let mut resolver = Self::new();
        resolver.register(CollisionType::Enemy, CollisionType::HammerBody, enemy_hits_hammer);
        resolver.register(CollisionType::Sword, CollisionType::Enemy, sword_hits_enemy);
        resolver
    }

    pub fn register(&mut self, first: CollisionType, second: CollisionType, handler: Handler) {
        self.handlers.insert((first, second), handler);
    }

    /// Run the handler for this pair in either order; unknown pairs keep colliding
    pub fn resolve(&self, ctx: &mut CombatContext<'_>, arbiter: &Arbiter) -> bool {
        let impulse = arbiter.impulse_magnitude();
        if let Some(handler) = self.handlers.get(&(arbiter.type_a, arbiter.type_b)) {
            let hit = Hit {
                first: arbiter.shape_a,
                second: arbiter.shape_b,
                impulse,
            };
            return handler(ctx, &hit);
        }
        if let Some(handler) = self.handlers.get(&(arbiter.type_b, arbiter.type_a)) {
            let hit = Hit {
                first: arbiter.shape_b,
                second: arbiter.shape_a,
                impulse,
            };
            return handler(ctx, &hit);
        }
        true
    }
}

/// Binds a resolver to the session state for one physics step
pub struct CombatListener<'r, 'a> {
    pub resolver: &'r CollisionResolver,
    pub ctx: CombatContext<'a>,
}

impl ContactListener for CombatListener<'_, '_> {
    fn post_solve(&mut self, arbiter: &Arbiter) -> bool {
        self.resolver.resolve(&mut self.ctx, arbiter)
    }
}

/// Live enemies ram the hammer; dead ones fall through it
fn enemy_hits_hammer(ctx: &mut CombatContext<'_>, hit: &Hit) -> bool {
    let Some(id) = ctx.enemies.find_by_shape(hit.first) else {
        log::warn!("hammer hit by unregistered enemy shape {:?}", hit.first);
        return true;
    };
    let Some(enemy) = ctx.enemies.get(id) else {
        return true;
    };
    let enemy_alive = enemy.is_alive();
    if enemy_alive && ctx.hammer.is_alive() {
        ctx.hammer.take_damage(hit.impulse);
        ctx.events.push(GameEvent::HammerHit);
    }
    enemy_alive
}

/// The sword damages whatever it touches and keeps pushing through
fn sword_hits_enemy(ctx: &mut CombatContext<'_>, hit: &Hit) -> bool {
    let Some(id) = ctx.enemies.find_by_shape(hit.second) else {
        log::warn!("sword hit unregistered enemy shape {:?}", hit.second);
        return true;
    };
    if let Some(enemy) = ctx.enemies.get_mut(id) {
        if enemy.take_damage(hit.impulse) {
            log::debug!("enemy {} killed by the sword", id.0);
            ctx.kills.push(id);
        }
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::enemy::{BonusType, Enemy};
    use crate::sim::physics::PhysicsWorld;
    use crate::tuning::{EnemyTuning, HammerTuning};
    use glam::Vec2;

    struct Fixture {
        world: PhysicsWorld,
        hammer: Hammer,
        enemies: EnemyRoster,
        kills: Vec<EnemyId>,
        events: Vec<GameEvent>,
        enemy: EnemyId,
    }

    fn fixture(hammer_armor: f32, enemy_armor: f32) -> Fixture {
        let mut world = PhysicsWorld::new(Vec2::new(0.0, -900.0), 0.3, 10);
        let hammer_tuning = HammerTuning {
            armor: hammer_armor,
            ..HammerTuning::default()
        };
        let hammer = Hammer::spawn(&mut world, Vec2::new(500.0, 400.0), &hammer_tuning).unwrap();
        let enemy_tuning = EnemyTuning {
            armor: enemy_armor,
            ..EnemyTuning::default()
        };
        let mut enemies = EnemyRoster::new();
        let id = enemies.next_id();
        let enemy =
            Enemy::spawn(&mut world, id, Vec2::new(100.0, 100.0), BonusType::None, &enemy_tuning)
                .unwrap();
        enemies.insert(enemy);
        Fixture {
            world,
            hammer,
            enemies,
            kills: Vec::new(),
            events: Vec::new(),
            enemy: id,
        }
    }

    impl Fixture {
        fn arbiter(&self, first: CollisionType, second: CollisionType, impulse: f32) -> Arbiter {
            let enemy_shape = self.enemies.get(self.enemy).unwrap().shape();
            let other = self.hammer.bundle().shapes[1];
            let (shape_a, shape_b) = if first == CollisionType::Enemy {
                (enemy_shape, other)
            } else {
                (other, enemy_shape)
            };
            Arbiter {
                shape_a,
                shape_b,
                type_a: first,
                type_b: second,
                normal: Vec2::X,
                total_impulse: Vec2::new(impulse, 0.0),
            }
        }

        fn resolve(&mut self, arbiter: &Arbiter) -> bool {
            let resolver = CollisionResolver::standard();
            let mut ctx = CombatContext {
                hammer: &mut self.hammer,
                enemies: &mut self.enemies,
                kills: &mut self.kills,
                events: &mut self.events,
            };
            resolver.resolve(&mut ctx, arbiter)
        }
    }

    /// Records every ram the world reports before the combat rules see it
    struct Tap<'r, 'a> {
        inner: CombatListener<'r, 'a>,
        rams: Vec<f32>,
    }

    impl ContactListener for Tap<'_, '_> {
        fn post_solve(&mut self, arbiter: &Arbiter) -> bool {
            let types = (arbiter.type_a, arbiter.type_b);
            if types == (CollisionType::HammerBody, CollisionType::Enemy)
                || types == (CollisionType::Enemy, CollisionType::HammerBody)
            {
                self.rams.push(arbiter.impulse_magnitude());
            }
            self.inner.post_solve(arbiter)
        }
    }

    #[test]
    fn test_launched_enemy_costs_hammer_the_solver_impulse() {
        let mut f = fixture(1_000_000.0, 1_000_000.0);
        let tuning = EnemyTuning {
            armor: 1_000_000.0,
            ..EnemyTuning::default()
        };
        let id = f.enemies.next_id();
        // Level with the hammer body, clear of the sword, and hauled by its
        // spring toward an aim on the far side so it rams and keeps pressing
        let enemy =
            Enemy::spawn(&mut f.world, id, Vec2::new(440.0, 415.0), BonusType::None, &tuning)
                .unwrap();
        enemy.move_to(&mut f.world, Vec2::new(560.0, 415.0));
        f.enemies.insert(enemy);

        let resolver = CollisionResolver::standard();
        let mut rams = Vec::new();
        for _ in 0..30 {
            let hits_before = f.events.len();
            let mut tap = Tap {
                inner: CombatListener {
                    resolver: &resolver,
                    ctx: CombatContext {
                        hammer: &mut f.hammer,
                        enemies: &mut f.enemies,
                        kills: &mut f.kills,
                        events: &mut f.events,
                    },
                },
                rams: Vec::new(),
            };
            f.world.step(1.0 / 60.0, &mut tap);
            let step_rams = tap.rams;
            // One report per touching pair per step, one HammerHit per report
            assert!(step_rams.len() <= 1);
            assert_eq!(f.events.len() - hits_before, step_rams.len());
            rams.extend(step_rams);
        }

        assert!(!rams.is_empty(), "enemy never reached the hammer");
        let total: f32 = rams.iter().sum();
        assert!(total > 0.0);
        let lost = 1_000_000.0 - f.hammer.armor();
        assert!((lost - total).abs() < 1.0, "lost {lost}, solver reported {total}");
        assert!(f.events.iter().all(|e| *e == GameEvent::HammerHit));
        assert!(f.kills.is_empty());
    }

    #[test]
    fn test_enemy_ram_damages_hammer_by_impulse() {
        let mut f = fixture(100.0, 3000.0);
        let arbiter = f.arbiter(CollisionType::Enemy, CollisionType::HammerBody, 30.0);
        assert!(f.resolve(&arbiter));
        assert_eq!(f.hammer.armor(), 70.0);
        assert!(f.resolve(&arbiter));
        assert_eq!(f.hammer.armor(), 40.0);
        assert!(f.hammer.is_alive());
        assert_eq!(f.events, vec![GameEvent::HammerHit, GameEvent::HammerHit]);
    }

    #[test]
    fn test_pair_matches_in_either_order() {
        let mut f = fixture(100.0, 3000.0);
        let arbiter = f.arbiter(CollisionType::HammerBody, CollisionType::Enemy, 30.0);
        f.resolve(&arbiter);
        assert_eq!(f.hammer.armor(), 70.0);
    }

    #[test]
    fn test_dead_enemy_passes_through_hammer() {
        let mut f = fixture(100.0, 3000.0);
        f.enemies.get_mut(f.enemy).unwrap().suicide();
        let arbiter = f.arbiter(CollisionType::Enemy, CollisionType::HammerBody, 30.0);
        assert!(!f.resolve(&arbiter));
        assert_eq!(f.hammer.armor(), 100.0);
        assert!(f.events.is_empty());
    }

    #[test]
    fn test_sword_kill_queued_exactly_once() {
        let mut f = fixture(100.0, 50.0);
        let arbiter = f.arbiter(CollisionType::Sword, CollisionType::Enemy, 60.0);
        // Two contacts against the same enemy in one step
        assert!(f.resolve(&arbiter));
        assert!(f.resolve(&arbiter));
        assert_eq!(f.kills, vec![f.enemy]);
        let enemy = f.enemies.get(f.enemy).unwrap();
        assert!(!enemy.is_alive());
        assert_eq!(enemy.armor(), 0.0);
        // Still in the world until the grace delay runs out
        assert!(f.world.contains_body(enemy.body()));
    }

    #[test]
    fn test_unregistered_pair_is_plain_contact() {
        let mut f = fixture(100.0, 3000.0);
        let arbiter = f.arbiter(CollisionType::Enemy, CollisionType::Enemy, 500.0);
        assert!(f.resolve(&arbiter));
        assert_eq!(f.enemies.get(f.enemy).unwrap().armor(), 3000.0);
        assert!(f.events.is_empty());
    }

    #[test]
    fn test_empty_resolver_ignores_combat_pairs() {
        let mut f = fixture(100.0, 3000.0);
        let arbiter = f.arbiter(CollisionType::Enemy, CollisionType::HammerBody, 30.0);
        let resolver = CollisionResolver::new();
        let mut ctx = CombatContext {
            hammer: &mut f.hammer,
            enemies: &mut f.enemies,
            kills: &mut f.kills,
            events: &mut f.events,
        };
        assert!(resolver.resolve(&mut ctx, &arbiter));
        assert_eq!(f.hammer.armor(), 100.0);
    }
}

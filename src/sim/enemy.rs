//! Pursuing enemies
//!
//! An enemy is a dynamic circle hung on a soft spring from an invisible aim
//! point. The game loop moves the aim; the body lags behind it.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::physics::{
    Assembly, BodyDesc, BodyHandle, Bundle, CollisionType, ConstraintHandle, Geometry, Layers,
    PhysicsError, PhysicsWorld, ShapeHandle, moment_for_circle,
};
use crate::tuning::EnemyTuning;

/// Stable enemy identifier, unique within a session
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EnemyId(pub u32);

/// Bonus carried by an enemy, granted when it is killed
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub enum BonusType {
    #[default]
    None,
    /// Fully repairs the hammer
    HealthBonus,
    /// Kills every other enemy on the field
    KillAllBonus,
}

#[derive(Debug, Clone)]
pub struct Enemy {
    pub id: EnemyId,
    pub bonus: BonusType,
    armor: f32,
    alive: bool,
    /// Switches the sprite to its damaged look
    damaged: bool,
    opacity: f32,
    /// Spring and counter-gravity dropped after death
    released: bool,
    damaged_armor: f32,
    fade: f32,
    bundle: Bundle,
    body: BodyHandle,
    aim: BodyHandle,
    shape: ShapeHandle,
    spring: ConstraintHandle,
}

impl Enemy {
    /// Build the enemy body, aim point and spring and add them to the world
    pub fn spawn(
        world: &mut PhysicsWorld,
        id: EnemyId,
        position: Vec2,
        bonus: BonusType,
        tuning: &EnemyTuning,
    ) -> Result<Self, PhysicsError> {
        let moment = moment_for_circle(tuning.mass, 0.0, tuning.radius, Vec2::ZERO);
        // Float instead of falling: carry the weight of the body and its aim
        let body = BodyDesc::dynamic(tuning.mass, moment)?
            .with_position(position)
            .with_force(-(tuning.mass + tuning.aim_mass) * world.gravity());

        let mut assembly = Assembly::new();
        let aim = assembly.body(BodyDesc::kinematic().with_position(position));
        let body = assembly.body(body);
        let shape = assembly.shape(
            body,
            Geometry::circle(tuning.radius, Vec2::ZERO)?,
            CollisionType::Enemy,
            Layers::ALL,
            tuning.elasticity,
            tuning.friction,
        );
        let spring = assembly.damped_spring(
            aim,
            body,
            tuning.spring_rest_length,
            tuning.spring_stiffness,
            tuning.spring_damping,
        );
        let bundle = world.insert(assembly)?;

        Ok(Self {
            id,
            bonus,
            armor: tuning.armor,
            alive: true,
            damaged: false,
            opacity: 1.0,
            released: false,
            damaged_armor: tuning.damaged_armor,
            fade: tuning.fade,
            body: bundle.body(body),
            aim: bundle.body(aim),
            shape: bundle.shape(shape),
            spring: bundle.constraint(spring),
            bundle,
        })
    }

    pub fn armor(&self) -> f32 {
        self.armor
    }

    pub fn is_alive(&self) -> bool {
        self.alive
    }

    pub fn is_damaged(&self) -> bool {
        self.damaged
    }

    pub fn opacity(&self) -> f32 {
        self.opacity
    }

    pub fn shape(&self) -> ShapeHandle {
        self.shape
    }

    pub fn body(&self) -> BodyHandle {
        self.body
    }

    /// Every part owned by this enemy
    pub fn bundle(&self) -> &Bundle {
        &self.bundle
    }

    pub fn position(&self, world: &PhysicsWorld) -> Option<Vec2> {
        world.position(self.body)
    }

    pub fn angle(&self, world: &PhysicsWorld) -> Option<f32> {
        world.angle(self.body)
    }

    /// Move the aim point; the body follows through the spring
    pub fn move_to(&self, world: &mut PhysicsWorld, target: Vec2) {
        world.set_position(self.aim, target);
    }

    /// Aim past the hammer along the enemy-to-hammer line, and shove the body
    /// into it once within `proximity_radius`
    pub fn pursue(&self, world: &mut PhysicsWorld, hammer: Vec2, k: f32, proximity_radius: f32) {
        if !self.alive {
            return;
        }
        let Some(position) = self.position(world) else {
            return;
        };
        self.move_to(world, (1.0 + k) * hammer - k * position);
        let to_hammer = hammer - position;
        if to_hammer.length() < proximity_radius {
            world.apply_impulse(self.body, to_hammer);
        }
    }

    /// Per-tick update: fade out once dead and let the body drop
    pub fn update(&mut self, world: &mut PhysicsWorld) {
        if self.alive {
            return;
        }
        self.opacity *= self.fade;
        if !self.released {
            self.released = true;
            world.set_force(self.body, Vec2::ZERO);
            world.remove_constraint(self.spring);
        }
    }

    /// Subtract armor. Returns true only on the alive-to-dead transition.
    pub fn take_damage(&mut self, amount: f32) -> bool {
        if !self.alive {
            return false;
        }
        let amount = if amount.is_finite() { amount.max(0.0) } else { 0.0 };
        self.armor -= amount;
        if self.armor <= 0.0 {
            self.armor = 0.0;
            self.alive = false;
            return true;
        }
        if self.armor < self.damaged_armor && self.bonus == BonusType::None {
            self.damaged = true;
        }
        false
    }

    /// Die without a combat interaction. Returns true if the enemy was alive.
    pub fn suicide(&mut self) -> bool {
        let was_alive = self.alive;
        self.armor = 0.0;
        self.alive = false;
        was_alive
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::physics::NoopListener;

    fn world() -> PhysicsWorld {
        PhysicsWorld::new(Vec2::new(0.0, -900.0), 0.3, 10)
    }

    fn spawn(world: &mut PhysicsWorld, bonus: BonusType, tuning: &EnemyTuning) -> Enemy {
        Enemy::spawn(world, EnemyId(1), Vec2::new(100.0, 100.0), bonus, tuning).unwrap()
    }

    #[test]
    fn test_spawn_adds_four_parts() {
        let mut world = world();
        let enemy = spawn(&mut world, BonusType::None, &EnemyTuning::default());
        assert_eq!(world.body_count(), 2);
        assert_eq!(world.shape_count(), 1);
        assert_eq!(world.constraint_count(), 1);
        assert_eq!(world.shape(enemy.shape()).unwrap().collision_type, CollisionType::Enemy);
        assert!(enemy.is_alive());
    }

    #[test]
    fn test_invalid_radius_adds_nothing() {
        let mut world = world();
        let tuning = EnemyTuning {
            radius: -1.0,
            ..EnemyTuning::default()
        };
        let result = Enemy::spawn(&mut world, EnemyId(1), Vec2::ZERO, BonusType::None, &tuning);
        assert!(result.is_err());
        assert!(world.is_empty());
    }

    #[test]
    fn test_lethal_hit_floors_armor_and_fires_once() {
        let mut world = world();
        let tuning = EnemyTuning {
            armor: 50.0,
            ..EnemyTuning::default()
        };
        let mut enemy = spawn(&mut world, BonusType::None, &tuning);
        assert!(enemy.take_damage(60.0));
        assert_eq!(enemy.armor(), 0.0);
        assert!(!enemy.is_alive());
        assert!(!enemy.take_damage(60.0));
        assert!(!enemy.suicide());
    }

    #[test]
    fn test_damaged_look_only_without_bonus() {
        let mut world = world();
        let tuning = EnemyTuning::default();
        let mut plain = spawn(&mut world, BonusType::None, &tuning);
        let mut bonus = spawn(&mut world, BonusType::HealthBonus, &tuning);
        plain.take_damage(2000.0);
        bonus.take_damage(2000.0);
        assert!(plain.is_damaged());
        assert!(!bonus.is_damaged());
        assert!(plain.is_alive());
    }

    #[test]
    fn test_negative_damage_ignored() {
        let mut world = world();
        let mut enemy = spawn(&mut world, BonusType::None, &EnemyTuning::default());
        enemy.take_damage(-500.0);
        enemy.take_damage(f32::NAN);
        assert_eq!(enemy.armor(), EnemyTuning::default().armor);
    }

    #[test]
    fn test_suicide_kills_without_damage() {
        let mut world = world();
        let mut enemy = spawn(&mut world, BonusType::None, &EnemyTuning::default());
        assert!(enemy.suicide());
        assert!(!enemy.is_alive());
        assert_eq!(enemy.armor(), 0.0);
        assert!(!enemy.is_damaged());
    }

    #[test]
    fn test_pursuit_overshoots_hammer() {
        let mut world = world();
        let enemy = spawn(&mut world, BonusType::None, &EnemyTuning::default());
        enemy.pursue(&mut world, Vec2::new(300.0, 100.0), 1.5, 100.0);
        let aim = world.position(enemy.aim).unwrap();
        // 1.5 hammer-lengths past the hammer
        assert!((aim - Vec2::new(600.0, 100.0)).length() < 1e-3);
        assert_eq!(world.velocity(enemy.body()).unwrap(), Vec2::ZERO);
    }

    #[test]
    fn test_close_pursuit_shoves_toward_hammer() {
        let mut world = world();
        let enemy = spawn(&mut world, BonusType::None, &EnemyTuning::default());
        enemy.pursue(&mut world, Vec2::new(150.0, 100.0), 1.5, 100.0);
        let velocity = world.velocity(enemy.body()).unwrap();
        assert!(velocity.x > 0.0);
        assert!(velocity.y.abs() < 1e-4);
    }

    #[test]
    fn test_enemy_floats_while_alive() {
        let mut world = world();
        let enemy = spawn(&mut world, BonusType::None, &EnemyTuning::default());
        for _ in 0..120 {
            world.step(1.0 / 60.0, &mut NoopListener);
        }
        let y = enemy.position(&world).unwrap().y;
        assert!((y - 100.0).abs() < 5.0, "drifted to {y}");
    }

    #[test]
    fn test_dead_enemy_fades_and_falls() {
        let mut world = world();
        let mut enemy = spawn(&mut world, BonusType::None, &EnemyTuning::default());
        enemy.suicide();
        for _ in 0..60 {
            enemy.update(&mut world);
            world.step(1.0 / 60.0, &mut NoopListener);
        }
        assert!(enemy.opacity() < 0.01);
        // Spring is gone once the body is let go
        assert_eq!(world.constraint_count(), 0);
        assert!(enemy.position(&world).unwrap().y < 0.0);
    }
}

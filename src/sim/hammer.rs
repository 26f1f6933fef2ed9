//! The player's flying hammer
//!
//! A box body carried by a stiff spring from the cursor aim point, with a
//! sword hanging from a pivot just below the body's center of mass. The
//! low pivot makes the body self-right like a pendulum.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::physics::{
    Assembly, BodyDesc, BodyHandle, Bundle, CollisionType, Geometry, Layers, PhysicsError,
    PhysicsWorld, moment_for_box,
};
use crate::tuning::HammerTuning;
use crate::{rotate, sprite_rotation};

/// Layer of the hammer body; the sword sits on its own layer so the two never touch
pub const BODY_LAYER: Layers = Layers(0b001);
pub const SWORD_LAYER: Layers = Layers(0b010);

/// Sprite placement derived from the physics state after each update
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct HammerTransform {
    pub body_position: Vec2,
    /// Degrees, clockwise
    pub body_rotation: f32,
    pub propeller_position: Vec2,
    pub sword_position: Vec2,
    pub sword_rotation: f32,
}

#[derive(Debug, Clone)]
pub struct Hammer {
    armor: f32,
    max_armor: f32,
    alive: bool,
    angle_limit: f32,
    propeller_height: f32,
    bundle: Bundle,
    aim: BodyHandle,
    body: BodyHandle,
    sword: BodyHandle,
    transform: HammerTransform,
}

impl Hammer {
    pub fn spawn(
        world: &mut PhysicsWorld,
        position: Vec2,
        tuning: &HammerTuning,
    ) -> Result<Self, PhysicsError> {
        let size = tuning.body_size;
        let moment = moment_for_box(tuning.body_mass, size.x, size.y);
        // Sustained flight: the main body carries the whole assembly's weight
        let weight = tuning.aim_mass + tuning.body_mass + tuning.sword_mass;
        let body = BodyDesc::dynamic(tuning.body_mass, moment)?
            .with_position(position)
            .with_force(-weight * world.gravity())
            .with_angular_velocity_limit(tuning.body_angular_velocity_limit);

        let sword_size = tuning.sword_size;
        let sword = BodyDesc::dynamic(
            tuning.sword_mass,
            moment_for_box(tuning.sword_mass, sword_size.x, sword_size.y),
        )?
        .with_position(position - Vec2::new(0.0, tuning.sword_offset))
        .with_angular_velocity_limit(tuning.sword_angular_velocity_limit);

        let mut assembly = Assembly::new();
        let aim = assembly.body(BodyDesc::kinematic().with_position(position));
        let body = assembly.body(body);
        let sword = assembly.body(sword);
        assembly.shape(
            aim,
            Geometry::circle(1.0, Vec2::ZERO)?,
            CollisionType::Default,
            Layers::NONE,
            0.0,
            0.0,
        );
        assembly.shape(
            body,
            Geometry::rect(size.x, size.y)?,
            CollisionType::HammerBody,
            BODY_LAYER,
            tuning.elasticity,
            tuning.friction,
        );
        assembly.shape(
            sword,
            Geometry::rect(sword_size.x, sword_size.y)?,
            CollisionType::Sword,
            SWORD_LAYER,
            tuning.elasticity,
            tuning.friction,
        );
        assembly.damped_spring(
            aim,
            body,
            tuning.spring_rest_length,
            tuning.spring_stiffness,
            tuning.spring_damping,
        );
        assembly.pivot(body, sword, position - Vec2::new(0.0, tuning.pivot_offset));
        let bundle = world.insert(assembly)?;

        let mut hammer = Self {
            armor: tuning.armor,
            max_armor: tuning.armor,
            alive: true,
            angle_limit: tuning.angle_limit,
            propeller_height: tuning.propeller_height,
            aim: bundle.body(aim),
            body: bundle.body(body),
            sword: bundle.body(sword),
            bundle,
            transform: HammerTransform::default(),
        };
        hammer.update(world);
        Ok(hammer)
    }

    pub fn armor(&self) -> f32 {
        self.armor
    }

    pub fn max_armor(&self) -> f32 {
        self.max_armor
    }

    pub fn is_alive(&self) -> bool {
        self.alive
    }

    pub fn transform(&self) -> &HammerTransform {
        &self.transform
    }

    pub fn bundle(&self) -> &Bundle {
        &self.bundle
    }

    pub fn body(&self) -> BodyHandle {
        self.body
    }

    pub fn position(&self, world: &PhysicsWorld) -> Option<Vec2> {
        world.position(self.body)
    }

    /// Reposition the aim point. Input never touches the body directly.
    pub fn move_to(&self, world: &mut PhysicsWorld, target: Vec2) {
        world.set_position(self.aim, target);
    }

    /// Clamp the body angle and refresh the sprite transform
    pub fn update(&mut self, world: &mut PhysicsWorld) {
        let (Some(position), Some(angle)) = (world.position(self.body), world.angle(self.body))
        else {
            return;
        };
        let angle = angle.clamp(-self.angle_limit, self.angle_limit);
        world.set_angle(self.body, angle);
        self.transform.body_position = position;
        self.transform.body_rotation = sprite_rotation(angle);
        self.transform.propeller_position =
            position + rotate(Vec2::new(0.0, self.propeller_height), angle);

        if let (Some(position), Some(angle)) = (world.position(self.sword), world.angle(self.sword)) {
            self.transform.sword_position = position;
            self.transform.sword_rotation = sprite_rotation(angle);
        }
    }

    /// Subtract armor, flooring at zero. Returns true when this hit was fatal.
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
        false
    }

    /// Restore full armor
    pub fn repair(&mut self) {
        self.armor = self.max_armor;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::physics::NoopListener;
    use proptest::prelude::*;

    const DT: f32 = 1.0 / 60.0;

    fn world() -> PhysicsWorld {
        PhysicsWorld::new(Vec2::new(0.0, -900.0), 0.3, 10)
    }

    fn hammer_with_armor(world: &mut PhysicsWorld, armor: f32) -> Hammer {
        let tuning = HammerTuning {
            armor,
            ..HammerTuning::default()
        };
        Hammer::spawn(world, Vec2::new(512.0, 384.0), &tuning).unwrap()
    }

    #[test]
    fn test_two_hits_of_thirty() {
        let mut world = world();
        let mut hammer = hammer_with_armor(&mut world, 100.0);
        assert!(!hammer.take_damage(30.0));
        assert_eq!(hammer.armor(), 70.0);
        assert!(hammer.is_alive());
        hammer.take_damage(30.0);
        assert_eq!(hammer.armor(), 40.0);
    }

    #[test]
    fn test_lethal_hit_floors_at_zero() {
        let mut world = world();
        let mut hammer = hammer_with_armor(&mut world, 100.0);
        assert!(hammer.take_damage(250.0));
        assert_eq!(hammer.armor(), 0.0);
        assert!(!hammer.is_alive());
        assert!(!hammer.take_damage(10.0));
    }

    #[test]
    fn test_repair_restores_full_armor() {
        let mut world = world();
        let mut hammer = hammer_with_armor(&mut world, 100.0);
        hammer.take_damage(90.0);
        hammer.repair();
        assert_eq!(hammer.armor(), 100.0);
    }

    #[test]
    fn test_spawn_parts_and_layers() {
        let mut world = world();
        let hammer = hammer_with_armor(&mut world, 100.0);
        assert_eq!(world.body_count(), 3);
        assert_eq!(world.shape_count(), 3);
        assert_eq!(world.constraint_count(), 2);
        let aim_shape = world.shape(hammer.bundle().shapes[0]).unwrap();
        assert_eq!(aim_shape.layers, Layers::NONE);
        let body_shape = world.shape(hammer.bundle().shapes[1]).unwrap();
        let sword_shape = world.shape(hammer.bundle().shapes[2]).unwrap();
        assert!(!body_shape.layers.intersects(sword_shape.layers));
        assert_eq!(sword_shape.collision_type, CollisionType::Sword);
    }

    #[test]
    fn test_move_to_moves_only_the_aim() {
        let mut world = world();
        let hammer = hammer_with_armor(&mut world, 100.0);
        hammer.move_to(&mut world, Vec2::new(700.0, 384.0));
        assert_eq!(hammer.position(&world).unwrap(), Vec2::new(512.0, 384.0));
        for _ in 0..30 {
            world.step(DT, &mut NoopListener);
        }
        assert!(hammer.position(&world).unwrap().x > 512.0);
    }

    #[test]
    fn test_hammer_hovers_and_stays_upright() {
        let mut world = world();
        let mut hammer = hammer_with_armor(&mut world, 100.0);
        for _ in 0..180 {
            world.step(DT, &mut NoopListener);
            hammer.update(&mut world);
        }
        let position = hammer.position(&world).unwrap();
        assert!((position - Vec2::new(512.0, 384.0)).length() < 10.0, "drifted to {position:?}");
        let transform = hammer.transform();
        assert!(transform.body_rotation.abs() <= 45.0 + 1e-3);
        // Sword hangs below the body
        assert!(transform.sword_position.y < transform.body_position.y);
        assert!(transform.propeller_position.y > transform.body_position.y);
    }

    proptest! {
        #[test]
        fn prop_armor_never_negative_and_never_rises(
            hits in proptest::collection::vec(0.0f32..5_000.0, 1..40)
        ) {
            let mut world = world();
            let mut hammer = hammer_with_armor(&mut world, 10_000.0);
            let mut last = hammer.armor();
            for hit in hits {
                hammer.take_damage(hit);
                prop_assert!(hammer.armor() >= 0.0);
                prop_assert!(hammer.armor() <= last);
                last = hammer.armor();
            }
        }
    }
}

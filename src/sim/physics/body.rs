//! Rigid body descriptions

use glam::Vec2;
use rapier2d::prelude::{MassProperties, RigidBody, RigidBodyBuilder, point};
use serde::{Deserialize, Serialize};

use super::{PhysicsError, to_na};

/// Stable body identifier. Never reused within a world.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct BodyHandle(pub(crate) u32);

/// How a body takes part in the simulation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BodyKind {
    /// Integrated under gravity, forces and impulses
    Dynamic,
    /// Moved only by setting its position; infinite mass to the solver
    Kinematic,
}

/// A body waiting to be inserted into a world
#[derive(Debug, Clone)]
pub struct BodyDesc {
    pub kind: BodyKind,
    mass: f32,
    moment: f32,
    pub position: Vec2,
    pub angle: f32,
    /// Persistent force, applied every step until changed
    pub force: Vec2,
    /// Angular speed is clamped to this after every step
    pub angular_velocity_limit: Option<f32>,
}

impl BodyDesc {
    /// A dynamic body with the given mass and moment of inertia
    pub fn dynamic(mass: f32, moment: f32) -> Result<Self, PhysicsError> {
        if !(mass.is_finite() && mass > 0.0) {
            return Err(PhysicsError::InvalidMass(mass));
        }
        if !(moment.is_finite() && moment > 0.0) {
            return Err(PhysicsError::InvalidMoment(moment));
        }
        Ok(Self {
            kind: BodyKind::Dynamic,
            mass,
            moment,
            position: Vec2::ZERO,
            angle: 0.0,
            force: Vec2::ZERO,
            angular_velocity_limit: None,
        })
    }

    /// A kinematic anchor body (used for aim points)
    pub fn kinematic() -> Self {
        Self {
            kind: BodyKind::Kinematic,
            mass: f32::INFINITY,
            moment: f32::INFINITY,
            position: Vec2::ZERO,
            angle: 0.0,
            force: Vec2::ZERO,
            angular_velocity_limit: None,
        }
    }

    pub fn with_position(mut self, position: Vec2) -> Self {
        self.position = position;
        self
    }

    pub fn with_force(mut self, force: Vec2) -> Self {
        self.force = force;
        self
    }

    pub fn with_angular_velocity_limit(mut self, limit: f32) -> Self {
        self.angular_velocity_limit = Some(limit);
        self
    }

    pub fn mass(&self) -> f32 {
        self.mass
    }

    pub fn moment(&self) -> f32 {
        self.moment
    }

    pub fn is_dynamic(&self) -> bool {
        self.kind == BodyKind::Dynamic
    }

    /// Build the rapier body. `damping` is the fraction of velocity kept per
    /// second; colliders carry no density, so mass comes from here alone.
    pub(crate) fn build(&self, damping: f32) -> RigidBody {
        let builder = match self.kind {
            BodyKind::Dynamic => {
                let decay = -damping.ln();
                RigidBodyBuilder::dynamic()
                    .additional_mass_properties(MassProperties::new(
                        point![0.0, 0.0],
                        self.mass,
                        self.moment,
                    ))
                    .linear_damping(decay)
                    .angular_damping(decay)
                    .can_sleep(false)
            }
            BodyKind::Kinematic => RigidBodyBuilder::kinematic_position_based(),
        };
        let mut body = builder
            .translation(to_na(self.position))
            .rotation(self.angle)
            .build();
        if self.force != Vec2::ZERO {
            body.add_force(to_na(self.force), false);
        }
        body
    }
}

/// Moment of inertia for a (hollow) circle
pub fn moment_for_circle(mass: f32, inner_radius: f32, outer_radius: f32, offset: Vec2) -> f32 {
    mass * (inner_radius * inner_radius + outer_radius * outer_radius) / 2.0
        + mass * offset.length_squared()
}

/// Moment of inertia for a solid box centered on the body
pub fn moment_for_box(mass: f32, width: f32, height: f32) -> f32 {
    mass * (width * width + height * height) / 12.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_mass_rejected() {
        assert_eq!(BodyDesc::dynamic(0.0, 1.0).unwrap_err(), PhysicsError::InvalidMass(0.0));
        assert!(BodyDesc::dynamic(f32::NAN, 1.0).is_err());
        assert_eq!(BodyDesc::dynamic(1.0, -2.0).unwrap_err(), PhysicsError::InvalidMoment(-2.0));
    }

    #[test]
    fn test_box_moment() {
        assert!((moment_for_box(12.0, 1.0, 1.0) - 2.0).abs() < 1e-6);
        assert!((moment_for_circle(2.0, 0.0, 1.0, Vec2::ZERO) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_built_body_keeps_position_and_kind() {
        let desc = BodyDesc::dynamic(2.0, 1.0)
            .unwrap()
            .with_position(Vec2::new(3.0, 4.0))
            .with_force(Vec2::new(0.0, 1800.0));
        let body = desc.build(0.3);
        assert!(body.is_dynamic());
        assert_eq!(body.translation().x, 3.0);
        assert!(body.linear_damping() > 0.0);

        let aim = BodyDesc::kinematic().build(0.3);
        assert!(aim.is_kinematic());
    }
}

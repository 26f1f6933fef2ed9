//! Springs and pivots between two bodies

use glam::Vec2;
use rapier2d::prelude::{
    GenericJoint, ImpulseJointHandle, MotorModel, RevoluteJointBuilder, SpringJointBuilder,
};
use serde::{Deserialize, Serialize};

use super::body::{BodyDesc, BodyHandle};
use super::to_point;
use crate::rotate;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ConstraintHandle(pub(crate) u32);

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum ConstraintKind {
    /// Force proportional to stretch past `rest_length`, damped on the
    /// relative velocity along the spring. Anchored at both centers.
    DampedSpring {
        rest_length: f32,
        stiffness: f32,
        damping: f32,
    },
    /// Both bodies share this world point, each free to rotate about it
    Pivot { pivot: Vec2 },
}

#[derive(Debug, Clone)]
pub struct Constraint {
    pub a: BodyHandle,
    pub b: BodyHandle,
    pub kind: ConstraintKind,
    pub(crate) joint: ImpulseJointHandle,
}

/// Joint data for two bodies that have not been simulated yet
pub(crate) fn joint_for(kind: &ConstraintKind, a: &BodyDesc, b: &BodyDesc) -> GenericJoint {
    match *kind {
        ConstraintKind::DampedSpring {
            rest_length,
            stiffness,
            damping,
        } => SpringJointBuilder::new(rest_length, stiffness, damping)
            .spring_model(MotorModel::ForceBased)
            .build()
            .into(),
        ConstraintKind::Pivot { pivot } => RevoluteJointBuilder::new()
            .local_anchor1(to_point(rotate(pivot - a.position, -a.angle)))
            .local_anchor2(to_point(rotate(pivot - b.position, -b.angle)))
            .contacts_enabled(false)
            .build()
            .into(),
    }
}

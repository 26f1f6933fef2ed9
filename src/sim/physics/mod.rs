//! Rigid-body world on top of rapier2d
//!
//! The game only needs a small slice of the engine:
//! - Dynamic bodies plus kinematic aim points
//! - Circle and convex polygon colliders with layer masks and collision tags
//! - Damped springs and pivot joints
//! - Contact reports keyed by collision tag, with pass-through veto
//!
//! Game code talks in glam types and crate-owned handles. Handles live in
//! ID-ordered maps so every step walks the world in the same order for the
//! same history. rapier2d is built with `enhanced-determinism`.

pub mod body;
pub mod constraint;
pub mod contact;
pub mod shape;
pub mod world;

pub use body::{BodyDesc, BodyHandle, BodyKind, moment_for_box, moment_for_circle};
pub use constraint::{Constraint, ConstraintHandle, ConstraintKind};
pub use contact::{Arbiter, ContactListener, NoopListener};
pub use shape::{CollisionType, Geometry, Layers, Shape, ShapeHandle};
pub use world::{Assembly, Bundle, PartRef, PhysicsWorld, ShapeRef};

use glam::Vec2;
use rapier2d::prelude::{Point, Real, Vector, point, vector};
use thiserror::Error;

/// Construction failures. Nothing is added to the world when one is returned.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PhysicsError {
    #[error("mass must be positive and finite, got {0}")]
    InvalidMass(f32),
    #[error("moment of inertia must be positive and finite, got {0}")]
    InvalidMoment(f32),
    #[error("circle radius must be positive and finite, got {0}")]
    InvalidRadius(f32),
    #[error("polygon needs at least 3 vertices, got {0}")]
    TooFewVertices(usize),
    #[error("polygon has zero area")]
    ZeroArea,
    #[error("polygon is not convex")]
    NotConvex,
    #[error("assembly part {0} does not exist")]
    UnknownPart(usize),
    #[error("constraint connects a body to itself")]
    SelfConstraint,
}

#[inline]
fn to_na(v: Vec2) -> Vector<Real> {
    vector![v.x, v.y]
}

#[inline]
fn to_point(v: Vec2) -> Point<Real> {
    point![v.x, v.y]
}

#[inline]
fn from_na(v: &Vector<Real>) -> Vec2 {
    Vec2::new(v.x, v.y)
}

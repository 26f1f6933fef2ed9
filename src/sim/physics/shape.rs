//! Collision shapes, layers and collision tags

use glam::Vec2;
use rapier2d::prelude::{
    ActiveEvents, ActiveHooks, ColliderBuilder, ColliderHandle, CoefficientCombineRule, Group,
    InteractionGroups,
};
use serde::{Deserialize, Serialize};

use super::body::BodyHandle;
use super::{PhysicsError, to_na, to_point};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ShapeHandle(pub(crate) u32);

/// Gameplay classification of a shape, used to pick a contact handler
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub enum CollisionType {
    #[default]
    Default,
    HammerBody,
    Sword,
    Enemy,
}

impl CollisionType {
    fn tag(self) -> u128 {
        match self {
            CollisionType::Default => 0,
            CollisionType::HammerBody => 1,
            CollisionType::Sword => 2,
            CollisionType::Enemy => 3,
        }
    }

    fn from_tag(tag: u128) -> Self {
        match tag {
            1 => CollisionType::HammerBody,
            2 => CollisionType::Sword,
            3 => CollisionType::Enemy,
            _ => CollisionType::Default,
        }
    }
}

/// Collider `user_data`: shape id in the low 32 bits, collision tag above it
pub(crate) fn encode_user_data(handle: ShapeHandle, collision_type: CollisionType) -> u128 {
    (collision_type.tag() << 32) | handle.0 as u128
}

pub(crate) fn decode_user_data(data: u128) -> (ShapeHandle, CollisionType) {
    (ShapeHandle(data as u32), CollisionType::from_tag(data >> 32))
}

/// Layer bitmask. Two shapes can touch only if their masks share a bit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Layers(pub u32);

impl Layers {
    /// Collides with nothing
    pub const NONE: Layers = Layers(0);
    pub const ALL: Layers = Layers(u32::MAX);

    #[inline]
    pub fn intersects(self, other: Layers) -> bool {
        self.0 & other.0 != 0
    }

    /// Membership and filter are both the mask, so the rapier test
    /// reduces to a shared bit
    pub(crate) fn groups(self) -> InteractionGroups {
        let bits = Group::from_bits_truncate(self.0);
        InteractionGroups::new(bits, bits)
    }
}

impl Default for Layers {
    fn default() -> Self {
        Layers::ALL
    }
}

/// Shape geometry in body-local coordinates
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Geometry {
    Circle { radius: f32, offset: Vec2 },
    /// Convex, counter-clockwise
    Polygon { vertices: Vec<Vec2> },
}

impl Geometry {
    pub fn circle(radius: f32, offset: Vec2) -> Result<Self, PhysicsError> {
        if !(radius.is_finite() && radius > 0.0) {
            return Err(PhysicsError::InvalidRadius(radius));
        }
        Ok(Geometry::Circle { radius, offset })
    }

    /// Convex polygon; clockwise input is rewound counter-clockwise
    pub fn polygon(mut vertices: Vec<Vec2>) -> Result<Self, PhysicsError> {
        if vertices.len() < 3 {
            return Err(PhysicsError::TooFewVertices(vertices.len()));
        }
        let area = signed_area(&vertices);
        if !area.is_finite() || area.abs() < 1e-6 {
            return Err(PhysicsError::ZeroArea);
        }
        if area < 0.0 {
            vertices.reverse();
        }
        let n = vertices.len();
        for i in 0..n {
            let a = vertices[i];
            let b = vertices[(i + 1) % n];
            let c = vertices[(i + 2) % n];
            if (b - a).perp_dot(c - b) < -1e-6 {
                return Err(PhysicsError::NotConvex);
            }
        }
        Ok(Geometry::Polygon { vertices })
    }

    /// Axis-aligned box centered on the body
    pub fn rect(width: f32, height: f32) -> Result<Self, PhysicsError> {
        let (hw, hh) = (width / 2.0, height / 2.0);
        Self::polygon(vec![
            Vec2::new(-hw, -hh),
            Vec2::new(hw, -hh),
            Vec2::new(hw, hh),
            Vec2::new(-hw, hh),
        ])
    }

    fn collider(&self) -> Result<ColliderBuilder, PhysicsError> {
        match self {
            Geometry::Circle { radius, offset } => {
                Ok(ColliderBuilder::ball(*radius).translation(to_na(*offset)))
            }
            Geometry::Polygon { vertices } => {
                ColliderBuilder::convex_polyline(vertices.iter().map(|v| to_point(*v)).collect())
                    .ok_or(PhysicsError::ZeroArea)
            }
        }
    }
}

fn signed_area(vertices: &[Vec2]) -> f32 {
    let n = vertices.len();
    (0..n)
        .map(|i| vertices[i].perp_dot(vertices[(i + 1) % n]))
        .sum::<f32>()
        / 2.0
}

/// A collider attached to a body, as the game sees it
#[derive(Debug, Clone)]
pub struct Shape {
    pub body: BodyHandle,
    pub geometry: Geometry,
    pub elasticity: f32,
    pub friction: f32,
    pub collision_type: CollisionType,
    pub layers: Layers,
    pub(crate) collider: ColliderHandle,
}

/// Massless collider tagged with the shape's id. Coefficients multiply
/// across a pair and every collider goes through the pass-through filter.
pub(crate) fn collider_builder(
    handle: ShapeHandle,
    geometry: &Geometry,
    collision_type: CollisionType,
    layers: Layers,
    elasticity: f32,
    friction: f32,
) -> Result<ColliderBuilder, PhysicsError> {
    Ok(geometry
        .collider()?
        .density(0.0)
        .restitution(elasticity)
        .friction(friction)
        .restitution_combine_rule(CoefficientCombineRule::Multiply)
        .friction_combine_rule(CoefficientCombineRule::Multiply)
        .collision_groups(layers.groups())
        .active_hooks(ActiveHooks::FILTER_CONTACT_PAIRS)
        .active_events(ActiveEvents::empty())
        .user_data(encode_user_data(handle, collision_type)))
}

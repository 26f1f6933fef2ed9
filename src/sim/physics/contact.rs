//! Contact reports and the pass-through filter

use std::collections::BTreeSet;

use glam::Vec2;
use rapier2d::prelude::{ColliderSet, ContactPair, PairFilterContext, PhysicsHooks, SolverFlags};

use super::from_na;
use super::shape::{CollisionType, ShapeHandle, decode_user_data};

/// One touching shape pair after the solver ran
#[derive(Debug, Clone, PartialEq)]
pub struct Arbiter {
    /// Lower handle of the pair
    pub shape_a: ShapeHandle,
    pub shape_b: ShapeHandle,
    pub type_a: CollisionType,
    pub type_b: CollisionType,
    /// From `shape_a` toward `shape_b`
    pub normal: Vec2,
    /// Normal impulse the solver applied to the pair this step
    pub total_impulse: Vec2,
}

impl Arbiter {
    pub fn impulse_magnitude(&self) -> f32 {
        self.total_impulse.length()
    }

    /// Read a narrow-phase pair back into crate terms, lower handle first
    pub(crate) fn from_pair(pair: &ContactPair, colliders: &ColliderSet) -> Option<Self> {
        let (shape_1, type_1) = decode_user_data(colliders.get(pair.collider1)?.user_data);
        let (shape_2, type_2) = decode_user_data(colliders.get(pair.collider2)?.user_data);

        let mut normal = Vec2::ZERO;
        let mut total_impulse = Vec2::ZERO;
        for manifold in &pair.manifolds {
            let n = from_na(&manifold.data.normal);
            let impulse: f32 = manifold.points.iter().map(|p| p.data.impulse).sum();
            total_impulse += n * impulse;
            if normal == Vec2::ZERO {
                normal = n;
            }
        }

        let arbiter = Arbiter {
            shape_a: shape_1,
            shape_b: shape_2,
            type_a: type_1,
            type_b: type_2,
            normal,
            total_impulse,
        };
        Some(if shape_1 <= shape_2 { arbiter } else { arbiter.flipped() })
    }

    fn flipped(self) -> Self {
        Arbiter {
            shape_a: self.shape_b,
            shape_b: self.shape_a,
            type_a: self.type_b,
            type_b: self.type_a,
            normal: -self.normal,
            total_impulse: -self.total_impulse,
        }
    }
}

/// Receives every touching pair once the step is over. Returning `false` lets
/// the pair pass through each other from the next step until they separate.
pub trait ContactListener {
    fn post_solve(&mut self, arbiter: &Arbiter) -> bool;
}

/// Plain elastic response, no side effects
pub struct NoopListener;

impl ContactListener for NoopListener {
    fn post_solve(&mut self, _arbiter: &Arbiter) -> bool {
        true
    }
}

#[inline]
pub(crate) fn ordered(a: ShapeHandle, b: ShapeHandle) -> (ShapeHandle, ShapeHandle) {
    if a <= b { (a, b) } else { (b, a) }
}

/// Drops solver contacts for vetoed pairs
pub(crate) struct PassThrough<'a> {
    pub ignored: &'a BTreeSet<(ShapeHandle, ShapeHandle)>,
}

impl PhysicsHooks for PassThrough<'_> {
    fn filter_contact_pair(&self, context: &PairFilterContext) -> Option<SolverFlags> {
        let shape = |handle| {
            context
                .colliders
                .get(handle)
                .map(|c| decode_user_data(c.user_data).0)
        };
        if let (Some(a), Some(b)) = (shape(context.collider1), shape(context.collider2)) {
            if self.ignored.contains(&ordered(a, b)) {
                return None;
            }
        }
        Some(SolverFlags::COMPUTE_IMPULSES)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flipped_arbiter_swaps_sides() {
        let arbiter = Arbiter {
            shape_a: ShapeHandle(9),
            shape_b: ShapeHandle(2),
            type_a: CollisionType::Sword,
            type_b: CollisionType::Enemy,
            normal: Vec2::X,
            total_impulse: Vec2::new(40.0, 0.0),
        }
        .flipped();
        assert_eq!(arbiter.shape_a, ShapeHandle(2));
        assert_eq!(arbiter.type_a, CollisionType::Enemy);
        assert_eq!(arbiter.normal, -Vec2::X);
        assert_eq!(arbiter.impulse_magnitude(), 40.0);
    }

    #[test]
    fn test_pair_key_is_order_free() {
        assert_eq!(ordered(ShapeHandle(5), ShapeHandle(3)), ordered(ShapeHandle(3), ShapeHandle(5)));
    }
}

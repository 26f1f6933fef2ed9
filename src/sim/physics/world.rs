//! Physics world: storage, fixed step, contact dispatch

use std::collections::{BTreeMap, BTreeSet};
use std::num::NonZeroUsize;

use glam::Vec2;
use rapier2d::na::UnitComplex;
use rapier2d::prelude::{
    CCDSolver, ColliderSet, DefaultBroadPhase, ImpulseJointSet, IntegrationParameters,
    IslandManager, MultibodyJointSet, NarrowPhase, PhysicsPipeline, RigidBodyHandle, RigidBodySet,
};

use super::body::{BodyDesc, BodyHandle};
use super::constraint::{Constraint, ConstraintHandle, ConstraintKind, joint_for};
use super::contact::{Arbiter, ContactListener, PassThrough, ordered};
use super::shape::{CollisionType, Geometry, Layers, Shape, ShapeHandle, collider_builder};
use super::{PhysicsError, from_na, to_na};

/// Index of a part inside an [`Assembly`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PartRef(usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShapeRef(usize);

#[derive(Debug, Clone)]
struct PendingShape {
    body: PartRef,
    geometry: Geometry,
    collision_type: CollisionType,
    layers: Layers,
    elasticity: f32,
    friction: f32,
}

/// A group of bodies, shapes and constraints inserted into the world as one unit.
///
/// Geometry is validated while the assembly is built; [`PhysicsWorld::insert`]
/// checks the part references and builds every collider before touching the
/// world, so an actor is either fully added or not added at all.
#[derive(Debug, Clone, Default)]
pub struct Assembly {
    bodies: Vec<BodyDesc>,
    shapes: Vec<PendingShape>,
    constraints: Vec<(PartRef, PartRef, ConstraintKind)>,
}

impl Assembly {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn body(&mut self, body: BodyDesc) -> PartRef {
        self.bodies.push(body);
        PartRef(self.bodies.len() - 1)
    }

    pub fn shape(
        &mut self,
        body: PartRef,
        geometry: Geometry,
        collision_type: CollisionType,
        layers: Layers,
        elasticity: f32,
        friction: f32,
    ) -> ShapeRef {
        self.shapes.push(PendingShape {
            body,
            geometry,
            collision_type,
            layers,
            elasticity,
            friction,
        });
        ShapeRef(self.shapes.len() - 1)
    }

    /// Damped spring between the centers of two parts
    pub fn damped_spring(
        &mut self,
        a: PartRef,
        b: PartRef,
        rest_length: f32,
        stiffness: f32,
        damping: f32,
    ) -> usize {
        let kind = ConstraintKind::DampedSpring {
            rest_length,
            stiffness,
            damping,
        };
        self.constraints.push((a, b, kind));
        self.constraints.len() - 1
    }

    /// Pivot joint at a world point
    pub fn pivot(&mut self, a: PartRef, b: PartRef, pivot: Vec2) -> usize {
        self.constraints.push((a, b, ConstraintKind::Pivot { pivot }));
        self.constraints.len() - 1
    }

    fn check(&self) -> Result<(), PhysicsError> {
        let valid = |p: PartRef| {
            if p.0 < self.bodies.len() {
                Ok(())
            } else {
                Err(PhysicsError::UnknownPart(p.0))
            }
        };
        for shape in &self.shapes {
            valid(shape.body)?;
        }
        for (a, b, _) in &self.constraints {
            valid(*a)?;
            valid(*b)?;
            if a == b {
                return Err(PhysicsError::SelfConstraint);
            }
        }
        Ok(())
    }
}

/// Handles of an inserted [`Assembly`], in the order the parts were declared
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Bundle {
    pub bodies: Vec<BodyHandle>,
    pub shapes: Vec<ShapeHandle>,
    pub constraints: Vec<ConstraintHandle>,
}

impl Bundle {
    pub fn body(&self, part: PartRef) -> BodyHandle {
        self.bodies[part.0]
    }

    pub fn shape(&self, shape: ShapeRef) -> ShapeHandle {
        self.shapes[shape.0]
    }

    pub fn constraint(&self, index: usize) -> ConstraintHandle {
        self.constraints[index]
    }
}

#[derive(Debug, Clone, Copy)]
struct BodyEntry {
    handle: RigidBodyHandle,
    angular_velocity_limit: Option<f32>,
}

pub struct PhysicsWorld {
    gravity: Vec2,
    /// Fraction of velocity kept per second
    damping: f32,
    integration: IntegrationParameters,
    pipeline: PhysicsPipeline,
    islands: IslandManager,
    broad_phase: DefaultBroadPhase,
    narrow_phase: NarrowPhase,
    rigid_bodies: RigidBodySet,
    colliders: ColliderSet,
    impulse_joints: ImpulseJointSet,
    multibody_joints: MultibodyJointSet,
    ccd_solver: CCDSolver,
    bodies: BTreeMap<BodyHandle, BodyEntry>,
    shapes: BTreeMap<ShapeHandle, Shape>,
    constraints: BTreeMap<ConstraintHandle, Constraint>,
    /// Pairs a listener vetoed; skipped until they stop overlapping
    ignored: BTreeSet<(ShapeHandle, ShapeHandle)>,
    next_id: u32,
}

impl PhysicsWorld {
    pub fn new(gravity: Vec2, damping: f32, iterations: u32) -> Self {
        let mut integration = IntegrationParameters::default();
        integration.num_solver_iterations =
            NonZeroUsize::new(iterations as usize).unwrap_or(NonZeroUsize::MIN);
        Self {
            gravity,
            damping,
            integration,
            pipeline: PhysicsPipeline::new(),
            islands: IslandManager::new(),
            broad_phase: DefaultBroadPhase::new(),
            narrow_phase: NarrowPhase::new(),
            rigid_bodies: RigidBodySet::new(),
            colliders: ColliderSet::new(),
            impulse_joints: ImpulseJointSet::new(),
            multibody_joints: MultibodyJointSet::new(),
            ccd_solver: CCDSolver::new(),
            bodies: BTreeMap::new(),
            shapes: BTreeMap::new(),
            constraints: BTreeMap::new(),
            ignored: BTreeSet::new(),
            next_id: 1,
        }
    }

    pub fn gravity(&self) -> Vec2 {
        self.gravity
    }

    fn next_id(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    /// Insert every part of an assembly, or nothing if any part is invalid
    pub fn insert(&mut self, assembly: Assembly) -> Result<Bundle, PhysicsError> {
        assembly.check()?;
        let Assembly {
            bodies,
            shapes,
            constraints,
        } = assembly;

        // Ids are reserved up front so colliders can carry them in user data
        let first_shape = self.next_id + bodies.len() as u32;
        let colliders = shapes
            .iter()
            .enumerate()
            .map(|(i, s)| {
                let handle = ShapeHandle(first_shape + i as u32);
                collider_builder(
                    handle,
                    &s.geometry,
                    s.collision_type,
                    s.layers,
                    s.elasticity,
                    s.friction,
                )
            })
            .collect::<Result<Vec<_>, _>>()?;

        let mut bundle = Bundle::default();
        let mut rigid = Vec::with_capacity(bodies.len());
        for desc in &bodies {
            let handle = BodyHandle(self.next_id());
            let rb = self.rigid_bodies.insert(desc.build(self.damping));
            self.bodies.insert(
                handle,
                BodyEntry {
                    handle: rb,
                    angular_velocity_limit: desc.angular_velocity_limit,
                },
            );
            bundle.bodies.push(handle);
            rigid.push(rb);
        }

        for (pending, builder) in shapes.into_iter().zip(colliders) {
            let handle = ShapeHandle(self.next_id());
            let parent = rigid[pending.body.0];
            let collider =
                self.colliders
                    .insert_with_parent(builder, parent, &mut self.rigid_bodies);
            self.shapes.insert(
                handle,
                Shape {
                    body: bundle.body(pending.body),
                    geometry: pending.geometry,
                    elasticity: pending.elasticity,
                    friction: pending.friction,
                    collision_type: pending.collision_type,
                    layers: pending.layers,
                    collider,
                },
            );
            bundle.shapes.push(handle);
        }

        // Mass comes from the body description; refresh it now so impulses
        // applied before the first step already see it
        for rb in &rigid {
            if let Some(body) = self.rigid_bodies.get_mut(*rb) {
                body.recompute_mass_properties_from_colliders(&self.colliders);
            }
        }

        for (a, b, kind) in constraints {
            let handle = ConstraintHandle(self.next_id());
            let data = joint_for(&kind, &bodies[a.0], &bodies[b.0]);
            let joint = self.impulse_joints.insert(rigid[a.0], rigid[b.0], data, true);
            self.constraints.insert(
                handle,
                Constraint {
                    a: bundle.body(a),
                    b: bundle.body(b),
                    kind,
                    joint,
                },
            );
            bundle.constraints.push(handle);
        }
        Ok(bundle)
    }

    /// Remove every part of a bundle. Returns false if nothing was left to remove.
    pub fn remove_bundle(&mut self, bundle: &Bundle) -> bool {
        let mut removed = false;
        for handle in &bundle.constraints {
            removed |= self.remove_constraint(*handle);
        }
        for handle in &bundle.shapes {
            removed |= self.remove_shape(*handle);
        }
        for handle in &bundle.bodies {
            removed |= self.remove_body(*handle);
        }
        removed
    }

    /// Remove a body together with the shapes and constraints attached to it
    pub fn remove_body(&mut self, handle: BodyHandle) -> bool {
        let Some(entry) = self.bodies.remove(&handle) else {
            return false;
        };
        let attached: Vec<ShapeHandle> = self
            .shapes
            .iter()
            .filter(|(_, s)| s.body == handle)
            .map(|(h, _)| *h)
            .collect();
        for shape in attached {
            self.remove_shape(shape);
        }
        self.constraints.retain(|_, c| c.a != handle && c.b != handle);
        self.rigid_bodies.remove(
            entry.handle,
            &mut self.islands,
            &mut self.colliders,
            &mut self.impulse_joints,
            &mut self.multibody_joints,
            true,
        );
        true
    }

    pub fn remove_shape(&mut self, handle: ShapeHandle) -> bool {
        let Some(shape) = self.shapes.remove(&handle) else {
            return false;
        };
        self.ignored.retain(|(a, b)| *a != handle && *b != handle);
        self.colliders.remove(
            shape.collider,
            &mut self.islands,
            &mut self.rigid_bodies,
            true,
        );
        true
    }

    pub fn remove_constraint(&mut self, handle: ConstraintHandle) -> bool {
        let Some(constraint) = self.constraints.remove(&handle) else {
            return false;
        };
        self.impulse_joints.remove(constraint.joint, true);
        true
    }

    pub fn shape(&self, handle: ShapeHandle) -> Option<&Shape> {
        self.shapes.get(&handle)
    }

    pub fn constraint(&self, handle: ConstraintHandle) -> Option<&Constraint> {
        self.constraints.get(&handle)
    }

    pub fn contains_body(&self, handle: BodyHandle) -> bool {
        self.bodies.contains_key(&handle)
    }

    fn rigid(&self, handle: BodyHandle) -> Option<&rapier2d::prelude::RigidBody> {
        self.rigid_bodies.get(self.bodies.get(&handle)?.handle)
    }

    fn rigid_mut(&mut self, handle: BodyHandle) -> Option<&mut rapier2d::prelude::RigidBody> {
        self.rigid_bodies.get_mut(self.bodies.get(&handle)?.handle)
    }

    pub fn position(&self, handle: BodyHandle) -> Option<Vec2> {
        self.rigid(handle).map(|rb| from_na(rb.translation()))
    }

    pub fn angle(&self, handle: BodyHandle) -> Option<f32> {
        self.rigid(handle).map(|rb| rb.rotation().angle())
    }

    pub fn velocity(&self, handle: BodyHandle) -> Option<Vec2> {
        self.rigid(handle).map(|rb| from_na(rb.linvel()))
    }

    pub fn angular_velocity(&self, handle: BodyHandle) -> Option<f32> {
        self.rigid(handle).map(|rb| rb.angvel())
    }

    /// Teleport a body. Kinematic aim points are moved only this way.
    pub fn set_position(&mut self, handle: BodyHandle, position: Vec2) {
        if let Some(rb) = self.rigid_mut(handle) {
            rb.set_translation(to_na(position), true);
        }
    }

    pub fn set_angle(&mut self, handle: BodyHandle, angle: f32) {
        if let Some(rb) = self.rigid_mut(handle) {
            rb.set_rotation(UnitComplex::new(angle), true);
        }
    }

    pub fn set_velocity(&mut self, handle: BodyHandle, velocity: Vec2) {
        if let Some(rb) = self.rigid_mut(handle) {
            rb.set_linvel(to_na(velocity), true);
        }
    }

    /// Instant impulse through the center of mass
    pub fn apply_impulse(&mut self, handle: BodyHandle, impulse: Vec2) {
        if let Some(rb) = self.rigid_mut(handle) {
            rb.apply_impulse(to_na(impulse), true);
        }
    }

    /// Replace the persistent force, applied every step until changed
    pub fn set_force(&mut self, handle: BodyHandle, force: Vec2) {
        if let Some(rb) = self.rigid_mut(handle) {
            rb.reset_forces(true);
            rb.add_force(to_na(force), true);
        }
    }

    pub fn body_count(&self) -> usize {
        self.bodies.len()
    }

    pub fn shape_count(&self) -> usize {
        self.shapes.len()
    }

    pub fn constraint_count(&self) -> usize {
        self.constraints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bodies.is_empty() && self.shapes.is_empty() && self.constraints.is_empty()
    }

    /// Drop everything (session teardown). Handles are still never reused.
    pub fn clear(&mut self) {
        let next_id = self.next_id;
        let iterations = self.integration.num_solver_iterations.get() as u32;
        *self = Self::new(self.gravity, self.damping, iterations);
        self.next_id = next_id;
    }

    /// Advance the simulation by exactly `dt` seconds.
    ///
    /// The listener runs after the solver, once per touching pair in handle
    /// order, and may only veto future interaction; structural changes wait
    /// until `step` returns.
    pub fn step(&mut self, dt: f32, listener: &mut dyn ContactListener) {
        self.integration.dt = dt;
        let hooks = PassThrough {
            ignored: &self.ignored,
        };
        self.pipeline.step(
            &to_na(self.gravity),
            &self.integration,
            &mut self.islands,
            &mut self.broad_phase,
            &mut self.narrow_phase,
            &mut self.rigid_bodies,
            &mut self.colliders,
            &mut self.impulse_joints,
            &mut self.multibody_joints,
            &mut self.ccd_solver,
            None,
            &hooks,
            &(),
        );

        self.limit_angular_velocities();
        self.release_separated();

        for arbiter in self.arbiters() {
            if !listener.post_solve(&arbiter) {
                self.ignored.insert((arbiter.shape_a, arbiter.shape_b));
            }
        }
    }

    fn limit_angular_velocities(&mut self) {
        for entry in self.bodies.values() {
            let Some(limit) = entry.angular_velocity_limit else {
                continue;
            };
            if let Some(rb) = self.rigid_bodies.get_mut(entry.handle) {
                let spin = rb.angvel();
                if spin.abs() > limit {
                    rb.set_angvel(spin.clamp(-limit, limit), true);
                }
            }
        }
    }

    /// Forget vetoes for pairs the broad phase no longer considers close
    fn release_separated(&mut self) {
        let separated: Vec<_> = self
            .ignored
            .iter()
            .copied()
            .filter(|(a, b)| {
                let (Some(sa), Some(sb)) = (self.shapes.get(a), self.shapes.get(b)) else {
                    return true;
                };
                self.narrow_phase
                    .contact_pair(sa.collider, sb.collider)
                    .is_none()
            })
            .collect();
        for key in separated {
            self.ignored.remove(&key);
        }
    }

    /// Touching pairs in handle order, vetoed pairs left out
    fn arbiters(&self) -> Vec<Arbiter> {
        let mut arbiters: Vec<Arbiter> = self
            .narrow_phase
            .contact_pairs()
            .filter(|pair| pair.has_any_active_contact)
            .filter_map(|pair| Arbiter::from_pair(pair, &self.colliders))
            .filter(|a| !self.ignored.contains(&ordered(a.shape_a, a.shape_b)))
            .collect();
        arbiters.sort_by_key(|a| (a.shape_a, a.shape_b));
        arbiters
    }
}

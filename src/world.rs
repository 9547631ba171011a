//! Physics World — Body Arena and Simulation Orchestrator
//!
//! The world owns every soft body (through a generational arena) and every
//! joint, plus the global gravity vector and solver configuration. One
//! `step(dt)` call runs the full XPBD cycle:
//!
//! ```text
//! sub_dt = dt / substeps
//! repeat substeps times:
//!     integrate all bodies (semi-implicit Euler)
//!     reset every constraint and joint lambda
//!     repeat iterations times:
//!         per body: drivers, distance, volume, angle, pin, shape matching
//!         distance joints, then motor joints
//!     detect all pairwise contacts (both orderings)
//!     repeat iterations times: solve each contact
//!     derive velocities from position deltas
//! ```
//!
//! Ordering is deterministic everywhere: bodies iterate in slot order,
//! constraints and joints in insertion order. Identical inputs replay
//! bit-identically.
//!
//! Bodies are addressed by [`BodyHandle`] (slot index plus generation
//! counter). Removing a body bumps the slot generation, so stale handles
//! held by joints or contacts resolve to `None` and the referencing
//! constraint skips its solve instead of touching a recycled body.

use crate::body::SoftBody;
use crate::collision::{detect_soft_soft_collisions, solve_contact_constraint, ContactConstraint};
use crate::constraint::{
    solve_acceleration_constraints, solve_angle_constraints,
    solve_angular_acceleration_constraints, solve_angular_force_constraints,
    solve_angular_velocity_constraints, solve_distance_constraints, solve_force_constraints,
    solve_pin_constraints, solve_shape_matching_constraints, solve_velocity_constraints,
    solve_volume_constraints,
};
use crate::error::PhysicsError;
use crate::joint::{solve_distance_joints, solve_motor_joints, DistanceJoint, MotorJoint};
use crate::math::{Fix128, Vec2Fix};

#[cfg(not(feature = "std"))]
use alloc::vec::Vec;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

// ============================================================================
// BodyHandle & BodyArena
// ============================================================================

/// Stable, non-owning reference to a body in a [`BodyArena`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct BodyHandle {
    /// Slot index in the arena
    pub index: u32,
    /// Generation the slot had when this handle was issued
    pub generation: u32,
}

impl BodyHandle {
    /// Handle that never resolves to a body.
    pub const INVALID: Self = Self {
        index: u32::MAX,
        generation: u32::MAX,
    };
}

#[derive(Clone, Debug, Default)]
struct BodySlot {
    generation: u32,
    body: Option<SoftBody>,
}

/// Generational arena of soft bodies.
///
/// Slots are recycled, but each recycling bumps the slot's generation, so
/// handles issued before a removal can never alias the replacement body.
#[derive(Clone, Debug, Default)]
pub struct BodyArena {
    slots: Vec<BodySlot>,
    free: Vec<u32>,
}

impl BodyArena {
    /// Create an empty arena.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live bodies.
    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.len() - self.free.len()
    }

    /// Returns `true` if the arena holds no live bodies.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Insert a body, returning its handle.
    pub fn insert(&mut self, body: SoftBody) -> BodyHandle {
        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index as usize];
            slot.body = Some(body);
            BodyHandle {
                index,
                generation: slot.generation,
            }
        } else {
            let index = self.slots.len() as u32;
            self.slots.push(BodySlot {
                generation: 0,
                body: Some(body),
            });
            BodyHandle {
                index,
                generation: 0,
            }
        }
    }

    /// Remove a body. Returns it if the handle was live.
    pub fn remove(&mut self, handle: BodyHandle) -> Option<SoftBody> {
        let slot = self.slots.get_mut(handle.index as usize)?;
        if slot.generation != handle.generation || slot.body.is_none() {
            return None;
        }
        let body = slot.body.take();
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(handle.index);
        body
    }

    /// Validated lookup. A stale or unknown handle yields `None`.
    #[must_use]
    pub fn get(&self, handle: BodyHandle) -> Option<&SoftBody> {
        let slot = self.slots.get(handle.index as usize)?;
        if slot.generation != handle.generation {
            return None;
        }
        slot.body.as_ref()
    }

    /// Validated mutable lookup.
    #[must_use]
    pub fn get_mut(&mut self, handle: BodyHandle) -> Option<&mut SoftBody> {
        let slot = self.slots.get_mut(handle.index as usize)?;
        if slot.generation != handle.generation {
            return None;
        }
        slot.body.as_mut()
    }

    /// Returns `true` if the handle resolves to a live body.
    #[must_use]
    pub fn contains(&self, handle: BodyHandle) -> bool {
        self.get(handle).is_some()
    }

    /// Disjoint mutable lookup of two distinct bodies.
    ///
    /// Returns `None` when either handle is dead or both point at the same
    /// slot.
    #[must_use]
    pub fn get_pair_mut(
        &mut self,
        a: BodyHandle,
        b: BodyHandle,
    ) -> Option<(&mut SoftBody, &mut SoftBody)> {
        if a.index == b.index {
            return None;
        }
        if !self.contains(a) || !self.contains(b) {
            return None;
        }

        let ia = a.index as usize;
        let ib = b.index as usize;
        let (lo, hi) = if ia < ib { (ia, ib) } else { (ib, ia) };
        let (left, right) = self.slots.split_at_mut(hi);
        let body_lo = left[lo].body.as_mut()?;
        let body_hi = right[0].body.as_mut()?;

        if ia < ib {
            Some((body_lo, body_hi))
        } else {
            Some((body_hi, body_lo))
        }
    }

    /// Handles of all live bodies, in slot order.
    #[must_use]
    pub fn handles(&self) -> Vec<BodyHandle> {
        self.slots
            .iter()
            .enumerate()
            .filter(|(_, s)| s.body.is_some())
            .map(|(i, s)| BodyHandle {
                index: i as u32,
                generation: s.generation,
            })
            .collect()
    }

    /// Iterate live bodies in slot order.
    pub fn iter(&self) -> impl Iterator<Item = (BodyHandle, &SoftBody)> {
        self.slots.iter().enumerate().filter_map(|(i, s)| {
            s.body.as_ref().map(|b| {
                (
                    BodyHandle {
                        index: i as u32,
                        generation: s.generation,
                    },
                    b,
                )
            })
        })
    }

    /// Apply `f` to every live body.
    ///
    /// Bodies are disjoint, so with the `parallel` feature this fans out
    /// over Rayon; the result is identical to the sequential order because
    /// `f` only touches the body it is handed.
    pub fn for_each_mut<F>(&mut self, f: F)
    where
        F: Fn(&mut SoftBody) + Send + Sync,
    {
        #[cfg(feature = "parallel")]
        {
            self.slots
                .par_iter_mut()
                .for_each(|slot| {
                    if let Some(body) = slot.body.as_mut() {
                        f(body);
                    }
                });
        }
        #[cfg(not(feature = "parallel"))]
        {
            for slot in &mut self.slots {
                if let Some(body) = slot.body.as_mut() {
                    f(body);
                }
            }
        }
    }

    /// Remove every body, invalidating all outstanding handles.
    pub fn clear(&mut self) {
        for (i, slot) in self.slots.iter_mut().enumerate() {
            if slot.body.is_some() {
                slot.body = None;
                slot.generation = slot.generation.wrapping_add(1);
                self.free.push(i as u32);
            }
        }
    }
}

// ============================================================================
// PhysicsConfig
// ============================================================================

/// Solver configuration.
#[derive(Clone, Debug)]
pub struct PhysicsConfig {
    /// Number of substeps per `step()` call
    pub substeps: usize,
    /// Constraint solver iterations per substep
    pub iterations: usize,
    /// Compliance of generated contacts (near zero = effectively rigid)
    pub contact_compliance: Fix128,
    /// Static friction coefficient for generated contacts
    pub static_friction: Fix128,
    /// Kinetic friction coefficient carried on generated contacts
    pub kinetic_friction: Fix128,
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        Self {
            substeps: 4,
            iterations: 8,
            contact_compliance: Fix128::from_ratio(1, 10_000),
            static_friction: Fix128::ONE,
            kinetic_friction: Fix128::from_ratio(3, 10),
        }
    }
}

impl PhysicsConfig {
    /// Reject configurations the solver cannot run with.
    pub fn validate(&self) -> Result<(), PhysicsError> {
        if self.substeps == 0 {
            return Err(PhysicsError::InvalidConfiguration {
                reason: "substeps must be non-zero",
            });
        }
        if self.iterations == 0 {
            return Err(PhysicsError::InvalidConfiguration {
                reason: "iterations must be non-zero",
            });
        }
        if self.contact_compliance.is_negative() {
            return Err(PhysicsError::InvalidConfiguration {
                reason: "contact compliance must be non-negative",
            });
        }
        if self.static_friction.is_negative() || self.kinetic_friction.is_negative() {
            return Err(PhysicsError::InvalidConfiguration {
                reason: "friction coefficients must be non-negative",
            });
        }
        Ok(())
    }
}

// ============================================================================
// PhysicsWorld
// ============================================================================

/// The scene: all bodies, all joints, gravity, and the solver entry point.
#[derive(Clone, Debug, Default)]
pub struct PhysicsWorld {
    /// Body storage
    pub bodies: BodyArena,
    /// Cross-body distance joints
    pub distance_joints: Vec<DistanceJoint>,
    /// Cross-body motor joints
    pub motor_joints: Vec<MotorJoint>,
    /// Global gravity
    pub gravity: Vec2Fix,
    /// Solver configuration
    pub config: PhysicsConfig,
}

impl PhysicsWorld {
    /// Create an empty world with the given configuration.
    #[must_use]
    pub fn new(config: PhysicsConfig) -> Self {
        Self {
            bodies: BodyArena::new(),
            distance_joints: Vec::new(),
            motor_joints: Vec::new(),
            gravity: Vec2Fix::ZERO,
            config,
        }
    }

    /// Add a body. Returns its handle.
    pub fn add_body(&mut self, body: SoftBody) -> BodyHandle {
        self.bodies.insert(body)
    }

    /// Remove a body. Joints referencing it become dead and skip silently.
    pub fn remove_body(&mut self, handle: BodyHandle) -> Option<SoftBody> {
        self.bodies.remove(handle)
    }

    /// Validated body lookup.
    #[must_use]
    pub fn body(&self, handle: BodyHandle) -> Option<&SoftBody> {
        self.bodies.get(handle)
    }

    /// Validated mutable body lookup.
    #[must_use]
    pub fn body_mut(&mut self, handle: BodyHandle) -> Option<&mut SoftBody> {
        self.bodies.get_mut(handle)
    }

    /// Add a distance joint.
    pub fn add_distance_joint(&mut self, joint: DistanceJoint) {
        self.distance_joints.push(joint);
    }

    /// Add a motor joint.
    pub fn add_motor_joint(&mut self, joint: MotorJoint) {
        self.motor_joints.push(joint);
    }

    /// Release all bodies and joints.
    pub fn clear(&mut self) {
        self.bodies.clear();
        self.distance_joints.clear();
        self.motor_joints.clear();
    }

    /// Advance the scene by `dt` using the configured substep and
    /// iteration counts.
    pub fn step(&mut self, dt: Fix128) {
        let substeps = self.config.substeps;
        let iterations = self.config.iterations;
        self.simulate(dt, substeps, iterations);
    }

    /// Advance the scene by `dt` with explicit counts.
    pub fn simulate(&mut self, dt: Fix128, substeps: usize, iterations: usize) {
        if substeps == 0 || iterations == 0 || dt.is_zero() {
            return;
        }
        let sub_dt = dt / Fix128::from_int(substeps as i64);
        for _ in 0..substeps {
            self.substep(sub_dt, iterations);
        }
    }

    /// One substep of the XPBD cycle.
    fn substep(&mut self, sub_dt: Fix128, iterations: usize) {
        let gravity = self.gravity;

        // 1. Integrate
        self.bodies
            .for_each_mut(|body| body.particles.integrate(sub_dt, gravity));

        // 2. Reset multipliers
        self.bodies.for_each_mut(SoftBody::reset_lambdas);
        for j in &mut self.distance_joints {
            j.lambda = Fix128::ZERO;
        }
        for j in &mut self.motor_joints {
            j.lambda = Fix128::ZERO;
        }

        // 3. Internal constraints and joints, Gauss-Seidel
        for _ in 0..iterations {
            self.bodies
                .for_each_mut(|body| solve_internal_constraints(body, sub_dt));
            solve_distance_joints(&mut self.distance_joints, &mut self.bodies, sub_dt);
            solve_motor_joints(&mut self.motor_joints, &mut self.bodies, sub_dt);
        }

        // 4. Detect contacts once per substep, both orderings of each pair
        let mut contacts = self.detect_contacts();

        // 5. Solve the detected set `iterations` times
        for _ in 0..iterations {
            for contact in &mut contacts {
                let Some((body_a, body_b)) =
                    self.bodies.get_pair_mut(contact.body_a, contact.body_b)
                else {
                    continue;
                };
                solve_contact_constraint(contact, body_a, body_b, sub_dt);
            }
        }

        // 6. Velocity update
        self.bodies
            .for_each_mut(|body| body.particles.update_velocities(sub_dt));
    }

    /// Brute-force pairwise contact detection.
    fn detect_contacts(&self) -> Vec<ContactConstraint> {
        let mut contacts = Vec::new();
        let handles = self.bodies.handles();
        let n = handles.len();

        for i in 0..n {
            for k in (i + 1)..n {
                let ha = handles[i];
                let hb = handles[k];
                // Both live by construction of `handles()`
                let (Some(body_a), Some(body_b)) = (self.bodies.get(ha), self.bodies.get(hb))
                else {
                    continue;
                };
                detect_soft_soft_collisions(
                    body_a,
                    ha,
                    body_b,
                    hb,
                    self.config.contact_compliance,
                    self.config.static_friction,
                    self.config.kinetic_friction,
                    &mut contacts,
                );
                detect_soft_soft_collisions(
                    body_b,
                    hb,
                    body_a,
                    ha,
                    self.config.contact_compliance,
                    self.config.static_friction,
                    self.config.kinetic_friction,
                    &mut contacts,
                );
            }
        }

        contacts
    }
}

/// Run every internal-constraint solve of one body, in the fixed order:
/// drivers first (so injected motion is corrected by structure in the same
/// pass), then distance, volume, angle, pin, shape matching.
fn solve_internal_constraints(body: &mut SoftBody, dt: Fix128) {
    solve_acceleration_constraints(&mut body.particles, &body.acceleration_constraints, dt);
    solve_force_constraints(&mut body.particles, &body.force_constraints, dt);
    solve_velocity_constraints(&mut body.particles, &body.velocity_constraints, dt);
    solve_angular_acceleration_constraints(
        &mut body.particles,
        &body.angular_acceleration_constraints,
        dt,
    );
    solve_angular_force_constraints(&mut body.particles, &body.angular_force_constraints, dt);
    solve_angular_velocity_constraints(
        &mut body.particles,
        &body.angular_velocity_constraints,
        dt,
    );

    solve_distance_constraints(&mut body.particles, &mut body.distance_constraints, dt);
    solve_volume_constraints(&mut body.particles, &mut body.volume_constraints, dt);
    solve_angle_constraints(&mut body.particles, &mut body.angle_constraints, dt);
    solve_pin_constraints(&mut body.particles, &mut body.pin_constraints, dt);
    solve_shape_matching_constraints(
        &mut body.particles,
        &mut body.shape_matching_constraints,
        dt,
    );
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(all(test, feature = "std"))]
mod tests {
    use super::*;

    fn single_particle_body(x: i64, y: i64, mass: Fix128) -> SoftBody {
        let mut body = SoftBody::new();
        body.particles.push(Vec2Fix::from_int(x, y), mass);
        body
    }

    // ---- Arena ----

    #[test]
    fn test_arena_insert_get_remove() {
        let mut arena = BodyArena::new();
        let h = arena.insert(single_particle_body(1, 2, Fix128::ONE));
        assert_eq!(arena.len(), 1);
        assert!(arena.contains(h));

        let removed = arena.remove(h).unwrap();
        assert_eq!(removed.particles.positions[0], Vec2Fix::from_int(1, 2));
        assert!(arena.is_empty());
        assert!(arena.get(h).is_none());
    }

    #[test]
    fn test_arena_stale_handle_after_recycle() {
        let mut arena = BodyArena::new();
        let h1 = arena.insert(single_particle_body(1, 1, Fix128::ONE));
        arena.remove(h1);
        let h2 = arena.insert(single_particle_body(2, 2, Fix128::ONE));

        // Slot is recycled, generation is not
        assert_eq!(h1.index, h2.index);
        assert_ne!(h1.generation, h2.generation);
        assert!(arena.get(h1).is_none());
        assert!(arena.get(h2).is_some());
        // Removing through the stale handle must not disturb the new body
        assert!(arena.remove(h1).is_none());
        assert!(arena.contains(h2));
    }

    #[test]
    fn test_arena_pair_mut() {
        let mut arena = BodyArena::new();
        let h1 = arena.insert(single_particle_body(0, 0, Fix128::ONE));
        let h2 = arena.insert(single_particle_body(5, 0, Fix128::ONE));

        let (a, b) = arena.get_pair_mut(h1, h2).unwrap();
        assert_eq!(a.particles.positions[0].x, Fix128::ZERO);
        assert_eq!(b.particles.positions[0].x, Fix128::from_int(5));

        // Reversed order preserves the argument mapping
        let (b2, a2) = arena.get_pair_mut(h2, h1).unwrap();
        assert_eq!(b2.particles.positions[0].x, Fix128::from_int(5));
        assert_eq!(a2.particles.positions[0].x, Fix128::ZERO);

        // Same slot or dead handle yields None
        assert!(arena.get_pair_mut(h1, h1).is_none());
        arena.remove(h2);
        assert!(arena.get_pair_mut(h1, h2).is_none());
    }

    #[test]
    fn test_arena_clear_invalidates_handles() {
        let mut arena = BodyArena::new();
        let h1 = arena.insert(single_particle_body(0, 0, Fix128::ONE));
        let h2 = arena.insert(single_particle_body(1, 0, Fix128::ONE));
        arena.clear();
        assert!(arena.is_empty());
        assert!(arena.get(h1).is_none());
        assert!(arena.get(h2).is_none());
    }

    #[test]
    fn test_arena_handles_in_slot_order() {
        let mut arena = BodyArena::new();
        let h1 = arena.insert(single_particle_body(0, 0, Fix128::ONE));
        let h2 = arena.insert(single_particle_body(1, 0, Fix128::ONE));
        let h3 = arena.insert(single_particle_body(2, 0, Fix128::ONE));
        arena.remove(h2);
        assert_eq!(arena.handles(), vec![h1, h3]);
    }

    // ---- Config ----

    #[test]
    fn test_config_validation() {
        assert!(PhysicsConfig::default().validate().is_ok());

        let mut config = PhysicsConfig::default();
        config.substeps = 0;
        assert!(config.validate().is_err());

        let mut config = PhysicsConfig::default();
        config.static_friction = Fix128::NEG_ONE;
        assert!(config.validate().is_err());
    }

    // ---- Stepping ----

    #[test]
    fn test_free_fall_displacement() {
        let mut world = PhysicsWorld::new(PhysicsConfig::default());
        world.gravity = Vec2Fix::new(Fix128::ZERO, Fix128::from_int(-10));
        let h = world.add_body(single_particle_body(0, 100, Fix128::ONE));

        let dt = Fix128::from_ratio(1, 60);
        for _ in 0..60 {
            world.step(dt);
        }

        let y = world.body(h).unwrap().particles.positions[0].y;
        // Semi-implicit Euler after 1s at g=-10 lands a little below the
        // analytic -5 displacement
        assert!(y < Fix128::from_int(96));
        assert!(y > Fix128::from_int(94));
    }

    #[test]
    fn test_fixed_particle_never_moves() {
        let mut world = PhysicsWorld::new(PhysicsConfig::default());
        world.gravity = Vec2Fix::new(Fix128::ZERO, Fix128::from_int(-10));

        let mut body = single_particle_body(3, 7, Fix128::ZERO);
        body.particles.push(Vec2Fix::from_int(3, 0), Fix128::ONE);
        body.add_distance_constraint(0, 1, Fix128::ZERO).unwrap();
        let h = world.add_body(body);

        for _ in 0..30 {
            world.step(Fix128::from_ratio(1, 60));
        }

        let anchor = world.body(h).unwrap().particles.positions[0];
        assert_eq!(anchor, Vec2Fix::from_int(3, 7));
    }

    #[test]
    fn test_zero_substeps_is_noop() {
        let mut world = PhysicsWorld::new(PhysicsConfig::default());
        world.gravity = Vec2Fix::new(Fix128::ZERO, Fix128::from_int(-10));
        let h = world.add_body(single_particle_body(0, 100, Fix128::ONE));

        world.simulate(Fix128::from_ratio(1, 60), 0, 8);

        let y = world.body(h).unwrap().particles.positions[0].y;
        assert_eq!(y, Fix128::from_int(100));
    }

    #[test]
    fn test_step_with_dead_joint_does_not_panic() {
        let mut world = PhysicsWorld::new(PhysicsConfig::default());
        world.gravity = Vec2Fix::new(Fix128::ZERO, Fix128::from_int(-10));

        let h1 = world.add_body(single_particle_body(0, 0, Fix128::ONE));
        let h2 = world.add_body(single_particle_body(5, 0, Fix128::ONE));
        world.add_distance_joint(DistanceJoint::new(
            h1,
            0,
            h2,
            0,
            Fix128::from_int(5),
            Fix128::ZERO,
        ));

        world.remove_body(h2);
        world.step(Fix128::from_ratio(1, 60));

        // The surviving body free-falls unaffected by the dead joint
        let p = world.body(h1).unwrap().particles.positions[0];
        assert_eq!(p.x, Fix128::ZERO);
        assert!(p.y < Fix128::ZERO);
    }

    #[test]
    fn test_clear_releases_everything() {
        let mut world = PhysicsWorld::new(PhysicsConfig::default());
        let h1 = world.add_body(single_particle_body(0, 0, Fix128::ONE));
        let h2 = world.add_body(single_particle_body(5, 0, Fix128::ONE));
        world.add_distance_joint(DistanceJoint::new(
            h1,
            0,
            h2,
            0,
            Fix128::from_int(5),
            Fix128::ZERO,
        ));

        world.clear();

        assert!(world.bodies.is_empty());
        assert!(world.distance_joints.is_empty());
        assert!(world.body(h1).is_none());
    }
}

//! Soft Body — Particles plus Constraint Collections
//!
//! A soft body owns one [`ParticleSet`] and its internal constraint
//! collections, plus the two index lists the collision subsystem works
//! with: `collision_points` (particles tested against other bodies) and
//! `collision_shape` (ordered closed polygon loop used for containment and
//! edge projection).
//!
//! Index validation happens here, when constraints are added; the solve
//! routines assume validated records and never bounds-check beyond the
//! language's own guarantees.

use crate::constraint::{
    polygon_area, AccelerationConstraint, AngleConstraint, AngularAccelerationConstraint,
    AngularForceConstraint, AngularVelocityConstraint, DistanceConstraint, ForceConstraint,
    PinConstraint, ShapeMatchingConstraint, VelocityConstraint, VolumeConstraint,
};
use crate::error::PhysicsError;
use crate::math::Fix128;
use crate::particle::ParticleSet;

#[cfg(not(feature = "std"))]
use alloc::vec::Vec;

/// One deformable body: point masses, internal constraints, collision data.
///
/// Bodies are created fully formed by a generator (see `shape_gen`) or by
/// hand, then mutated in place every substep by the solver.
#[derive(Clone, Debug, Default)]
pub struct SoftBody {
    /// Point-mass storage
    pub particles: ParticleSet,

    /// Distance (stretch) constraints
    pub distance_constraints: Vec<DistanceConstraint>,
    /// Signed-area constraints
    pub volume_constraints: Vec<VolumeConstraint>,
    /// Angle (bending) constraints
    pub angle_constraints: Vec<AngleConstraint>,
    /// Shape-matching constraints
    pub shape_matching_constraints: Vec<ShapeMatchingConstraint>,
    /// Pin constraints
    pub pin_constraints: Vec<PinConstraint>,

    /// Linear acceleration drivers
    pub acceleration_constraints: Vec<AccelerationConstraint>,
    /// Linear force drivers
    pub force_constraints: Vec<ForceConstraint>,
    /// Linear velocity drivers
    pub velocity_constraints: Vec<VelocityConstraint>,
    /// Angular acceleration drivers
    pub angular_acceleration_constraints: Vec<AngularAccelerationConstraint>,
    /// Angular force drivers
    pub angular_force_constraints: Vec<AngularForceConstraint>,
    /// Angular velocity drivers
    pub angular_velocity_constraints: Vec<AngularVelocityConstraint>,

    /// Particle indices tested for containment in other bodies
    pub collision_points: Vec<u32>,
    /// Ordered closed polygon loop (particle indices, consistent winding)
    pub collision_shape: Vec<u32>,
}

impl SoftBody {
    /// Create an empty body.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a body around an existing particle set.
    #[must_use]
    pub fn from_particles(particles: ParticleSet) -> Self {
        Self {
            particles,
            ..Self::default()
        }
    }

    fn check_indices(&self, indices: &[u32]) -> Result<(), PhysicsError> {
        let count = self.particles.len();
        for &i in indices {
            if i as usize >= count {
                return Err(PhysicsError::InvalidParticleIndex {
                    index: i as usize,
                    count,
                });
            }
        }
        Ok(())
    }

    /// Add a distance constraint, measuring the rest length from current
    /// positions.
    pub fn add_distance_constraint(
        &mut self,
        i1: u32,
        i2: u32,
        compliance: Fix128,
    ) -> Result<usize, PhysicsError> {
        let c = DistanceConstraint::between(&self.particles, i1, i2, compliance)?;
        self.distance_constraints.push(c);
        Ok(self.distance_constraints.len() - 1)
    }

    /// Add a distance constraint with an explicit rest length.
    pub fn add_distance_constraint_with_rest(
        &mut self,
        i1: u32,
        i2: u32,
        rest_distance: Fix128,
        compliance: Fix128,
    ) -> Result<usize, PhysicsError> {
        let mut c = DistanceConstraint::between(&self.particles, i1, i2, compliance)?;
        c.rest_distance = rest_distance;
        self.distance_constraints.push(c);
        Ok(self.distance_constraints.len() - 1)
    }

    /// Add a volume constraint over an ordered loop, measuring the rest
    /// area from current positions.
    pub fn add_volume_constraint(
        &mut self,
        indices: Vec<u32>,
        compliance: Fix128,
    ) -> Result<usize, PhysicsError> {
        let c = VolumeConstraint::from_loop(&self.particles, indices, compliance)?;
        self.volume_constraints.push(c);
        Ok(self.volume_constraints.len() - 1)
    }

    /// Add an angle constraint at `i2`, measuring the rest angle from
    /// current positions.
    pub fn add_angle_constraint(
        &mut self,
        i1: u32,
        i2: u32,
        i3: u32,
        compliance: Fix128,
    ) -> Result<usize, PhysicsError> {
        let c = AngleConstraint::between(&self.particles, i1, i2, i3, compliance)?;
        self.angle_constraints.push(c);
        Ok(self.angle_constraints.len() - 1)
    }

    /// Add a shape-matching constraint snapshotting current positions as
    /// the rest shape.
    pub fn add_shape_matching_constraint(
        &mut self,
        indices: Vec<u32>,
        compliance: Fix128,
    ) -> Result<usize, PhysicsError> {
        let c = ShapeMatchingConstraint::snapshot(&self.particles, indices, compliance)?;
        self.shape_matching_constraints.push(c);
        Ok(self.shape_matching_constraints.len() - 1)
    }

    /// Add a pin constraint anchoring `index` toward a world point.
    pub fn add_pin_constraint(
        &mut self,
        constraint: PinConstraint,
    ) -> Result<usize, PhysicsError> {
        self.check_indices(&[constraint.index])?;
        if constraint.compliance.is_negative() {
            return Err(PhysicsError::InvalidConstraint {
                reason: "compliance must be non-negative",
            });
        }
        self.pin_constraints.push(constraint);
        Ok(self.pin_constraints.len() - 1)
    }

    /// Add a linear acceleration driver.
    pub fn add_acceleration_constraint(
        &mut self,
        constraint: AccelerationConstraint,
    ) -> Result<usize, PhysicsError> {
        self.check_indices(&constraint.indices)?;
        self.acceleration_constraints.push(constraint);
        Ok(self.acceleration_constraints.len() - 1)
    }

    /// Add a linear force driver.
    pub fn add_force_constraint(
        &mut self,
        constraint: ForceConstraint,
    ) -> Result<usize, PhysicsError> {
        self.check_indices(&constraint.indices)?;
        self.force_constraints.push(constraint);
        Ok(self.force_constraints.len() - 1)
    }

    /// Add a linear velocity driver.
    pub fn add_velocity_constraint(
        &mut self,
        constraint: VelocityConstraint,
    ) -> Result<usize, PhysicsError> {
        self.check_indices(&constraint.indices)?;
        self.velocity_constraints.push(constraint);
        Ok(self.velocity_constraints.len() - 1)
    }

    /// Add an angular acceleration driver.
    pub fn add_angular_acceleration_constraint(
        &mut self,
        constraint: AngularAccelerationConstraint,
    ) -> Result<usize, PhysicsError> {
        self.check_indices(&constraint.indices)?;
        self.angular_acceleration_constraints.push(constraint);
        Ok(self.angular_acceleration_constraints.len() - 1)
    }

    /// Add an angular force driver.
    pub fn add_angular_force_constraint(
        &mut self,
        constraint: AngularForceConstraint,
    ) -> Result<usize, PhysicsError> {
        self.check_indices(&constraint.indices)?;
        self.angular_force_constraints.push(constraint);
        Ok(self.angular_force_constraints.len() - 1)
    }

    /// Add an angular velocity driver.
    pub fn add_angular_velocity_constraint(
        &mut self,
        constraint: AngularVelocityConstraint,
    ) -> Result<usize, PhysicsError> {
        self.check_indices(&constraint.indices)?;
        self.angular_velocity_constraints.push(constraint);
        Ok(self.angular_velocity_constraints.len() - 1)
    }

    /// Set the particle indices tested against other bodies.
    pub fn set_collision_points(&mut self, indices: Vec<u32>) -> Result<(), PhysicsError> {
        self.check_indices(&indices)?;
        self.collision_points = indices;
        Ok(())
    }

    /// Set the closed polygon loop used for containment tests and edge
    /// projection. Needs at least three points.
    pub fn set_collision_shape(&mut self, indices: Vec<u32>) -> Result<(), PhysicsError> {
        self.check_indices(&indices)?;
        if !indices.is_empty() && indices.len() < 3 {
            return Err(PhysicsError::InvalidConstraint {
                reason: "collision shape needs at least 3 points",
            });
        }
        self.collision_shape = indices;
        Ok(())
    }

    /// Signed area of the body's collision shape loop.
    #[must_use]
    pub fn collision_shape_area(&self) -> Fix128 {
        if self.collision_shape.len() < 3 {
            return Fix128::ZERO;
        }
        polygon_area(&self.particles.positions, &self.collision_shape)
    }

    /// Reset every internal constraint's Lagrange multiplier. Called once
    /// per substep by the orchestrator, before the iteration loop.
    pub fn reset_lambdas(&mut self) {
        for c in &mut self.distance_constraints {
            c.lambda = Fix128::ZERO;
        }
        for c in &mut self.volume_constraints {
            c.lambda = Fix128::ZERO;
        }
        for c in &mut self.angle_constraints {
            c.lambda = Fix128::ZERO;
        }
        for c in &mut self.shape_matching_constraints {
            c.lambda = Fix128::ZERO;
        }
        for c in &mut self.pin_constraints {
            c.lambda = Fix128::ZERO;
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

//! Internal Constraints — XPBD Projection Routines
//!
//! One record type and one dedicated projection function per constraint
//! kind: distance, volume (2D signed area), angle, shape matching, and pin,
//! plus the six kinematic driver constraints (linear and angular
//! acceleration / force / velocity injections).
//!
//! # Algorithm
//!
//! Every compliant kind follows the same XPBD pattern:
//!
//! 1. Evaluate the scalar constraint function `C` and its per-particle
//!    gradients from current positions.
//! 2. `alpha_tilde = compliance / dt²`
//! 3. `delta_lambda = (-C - alpha_tilde * lambda) / (sum w_i |grad_i|² + alpha_tilde)`
//! 4. `position_i += w_i * delta_lambda * grad_i`, `lambda += delta_lambda`
//!
//! Degenerate geometry (short edges, vanishing denominators) skips the
//! constraint for the current iteration. `lambda` accumulators are shared
//! across iterations within one substep and reset at substep boundaries,
//! giving Gauss-Seidel relaxation toward the joint solution.
//!
//! Driver constraints are not projected: they add the position offset
//! equivalent to applying their drive over one substep, skipping fixed
//! particles.

use crate::error::PhysicsError;
use crate::math::{Fix128, Mat2Fix, Vec2Fix};
use crate::particle::ParticleSet;

#[cfg(not(feature = "std"))]
use alloc::vec::Vec;

// ============================================================================
// Constraint Records
// ============================================================================

/// Keeps two particles at a fixed rest distance.
#[derive(Clone, Debug)]
pub struct DistanceConstraint {
    /// First particle index
    pub i1: u32,
    /// Second particle index
    pub i2: u32,
    /// Target separation
    pub rest_distance: Fix128,
    /// Inverse stiffness; zero is perfectly rigid
    pub compliance: Fix128,
    /// Accumulated Lagrange multiplier (reset every substep)
    pub lambda: Fix128,
}

/// Keeps the signed shoelace area of an ordered particle loop at its rest
/// value. Winding order must be consistent with the body's collision shape;
/// the sign of the area encodes orientation.
#[derive(Clone, Debug)]
pub struct VolumeConstraint {
    /// Ordered loop of particle indices
    pub indices: Vec<u32>,
    /// Target signed area
    pub rest_volume: Fix128,
    /// Inverse stiffness; zero is perfectly rigid
    pub compliance: Fix128,
    /// Accumulated Lagrange multiplier (reset every substep)
    pub lambda: Fix128,
}

/// Keeps the angle at `i2` (between the rays to `i1` and `i3`) at its rest
/// value.
#[derive(Clone, Debug)]
pub struct AngleConstraint {
    /// First ray endpoint
    pub i1: u32,
    /// Joint vertex
    pub i2: u32,
    /// Second ray endpoint
    pub i3: u32,
    /// Target angle in radians, in `[0, π]`
    pub rest_angle: Fix128,
    /// Inverse stiffness; zero is perfectly rigid
    pub compliance: Fix128,
    /// Accumulated Lagrange multiplier (reset every substep)
    pub lambda: Fix128,
}

/// Pulls a group of particles toward a rotated copy of their rest shape.
#[derive(Clone, Debug)]
pub struct ShapeMatchingConstraint {
    /// Particle indices in the group
    pub indices: Vec<u32>,
    /// Rest positions, parallel to `indices`
    pub start_positions: Vec<Vec2Fix>,
    /// Mass center of the rest configuration
    pub start_center_mass: Vec2Fix,
    /// Inverse stiffness; zero is perfectly rigid
    pub compliance: Fix128,
    /// Accumulated Lagrange multiplier (reset every substep)
    pub lambda: Fix128,
}

/// Anchors one particle toward a fixed world point.
#[derive(Clone, Debug)]
pub struct PinConstraint {
    /// Pinned particle index
    pub index: u32,
    /// World-space anchor point
    pub target_position: Vec2Fix,
    /// Inverse stiffness; zero is perfectly rigid
    pub compliance: Fix128,
    /// Accumulated Lagrange multiplier (reset every substep)
    pub lambda: Fix128,
}

// ---- Driver constraints (direct kinematic injections) ----

/// Adds `acceleration * dt²` to the targeted particles each iteration.
#[derive(Clone, Debug)]
pub struct AccelerationConstraint {
    /// Targeted particle indices
    pub indices: Vec<u32>,
    /// Acceleration to inject
    pub acceleration: Vec2Fix,
}

/// Adds `force * inv_mass * dt²` to the targeted particles each iteration.
#[derive(Clone, Debug)]
pub struct ForceConstraint {
    /// Targeted particle indices
    pub indices: Vec<u32>,
    /// Force to inject
    pub force: Vec2Fix,
}

/// Adds `velocity * dt` to the targeted particles each iteration.
#[derive(Clone, Debug)]
pub struct VelocityConstraint {
    /// Targeted particle indices
    pub indices: Vec<u32>,
    /// Velocity to inject
    pub velocity: Vec2Fix,
}

/// Rotates the targeted particles about a pivot by `acceleration * dt²`
/// radians each iteration.
#[derive(Clone, Debug)]
pub struct AngularAccelerationConstraint {
    /// Targeted particle indices
    pub indices: Vec<u32>,
    /// Angular acceleration (radians per second squared, positive = CCW)
    pub acceleration: Fix128,
    /// Pivot point in world space
    pub position: Vec2Fix,
}

/// Rotates the targeted particles about a pivot by `force * inv_mass * dt²`
/// radians each iteration.
#[derive(Clone, Debug)]
pub struct AngularForceConstraint {
    /// Targeted particle indices
    pub indices: Vec<u32>,
    /// Torque-like drive value
    pub force: Fix128,
    /// Pivot point in world space
    pub position: Vec2Fix,
}

/// Rotates the targeted particles about a pivot by `velocity * dt` radians
/// each iteration.
#[derive(Clone, Debug)]
pub struct AngularVelocityConstraint {
    /// Targeted particle indices
    pub indices: Vec<u32>,
    /// Angular rate (radians per second, positive = CCW)
    pub velocity: Fix128,
    /// Pivot point in world space
    pub position: Vec2Fix,
}

// ============================================================================
// Construction helpers
// ============================================================================

fn check_index(index: u32, count: usize) -> Result<(), PhysicsError> {
    if (index as usize) < count {
        Ok(())
    } else {
        Err(PhysicsError::InvalidParticleIndex {
            index: index as usize,
            count,
        })
    }
}

fn check_compliance(compliance: Fix128) -> Result<(), PhysicsError> {
    if compliance.is_negative() {
        Err(PhysicsError::InvalidConstraint {
            reason: "compliance must be non-negative",
        })
    } else {
        Ok(())
    }
}

impl DistanceConstraint {
    /// Build a constraint whose rest distance is measured from the current
    /// particle positions.
    pub fn between(
        pm: &ParticleSet,
        i1: u32,
        i2: u32,
        compliance: Fix128,
    ) -> Result<Self, PhysicsError> {
        check_index(i1, pm.len())?;
        check_index(i2, pm.len())?;
        check_compliance(compliance)?;
        if i1 == i2 {
            return Err(PhysicsError::InvalidConstraint {
                reason: "distance constraint endpoints must differ",
            });
        }
        let rest = pm.positions[i1 as usize].distance_to(pm.positions[i2 as usize]);
        Ok(Self {
            i1,
            i2,
            rest_distance: rest,
            compliance,
            lambda: Fix128::ZERO,
        })
    }

    /// Build a constraint with an explicit rest distance.
    pub fn with_rest(i1: u32, i2: u32, rest_distance: Fix128, compliance: Fix128) -> Self {
        Self {
            i1,
            i2,
            rest_distance,
            compliance,
            lambda: Fix128::ZERO,
        }
    }
}

impl VolumeConstraint {
    /// Build a constraint whose rest area is the loop's current shoelace
    /// area. The loop must contain at least three distinct indices.
    pub fn from_loop(
        pm: &ParticleSet,
        indices: Vec<u32>,
        compliance: Fix128,
    ) -> Result<Self, PhysicsError> {
        check_compliance(compliance)?;
        if indices.len() < 3 {
            return Err(PhysicsError::InvalidConstraint {
                reason: "volume loop needs at least 3 points",
            });
        }
        for &i in &indices {
            check_index(i, pm.len())?;
        }
        let rest = polygon_area(&pm.positions, &indices);
        Ok(Self {
            indices,
            rest_volume: rest,
            compliance,
            lambda: Fix128::ZERO,
        })
    }
}

impl AngleConstraint {
    /// Build a constraint whose rest angle is measured from the current
    /// particle positions.
    pub fn between(
        pm: &ParticleSet,
        i1: u32,
        i2: u32,
        i3: u32,
        compliance: Fix128,
    ) -> Result<Self, PhysicsError> {
        check_index(i1, pm.len())?;
        check_index(i2, pm.len())?;
        check_index(i3, pm.len())?;
        check_compliance(compliance)?;
        let rest = angle_between(
            pm.positions[i1 as usize],
            pm.positions[i2 as usize],
            pm.positions[i3 as usize],
        );
        Ok(Self {
            i1,
            i2,
            i3,
            rest_angle: rest,
            compliance,
            lambda: Fix128::ZERO,
        })
    }
}

impl ShapeMatchingConstraint {
    /// Snapshot the current positions of `indices` as the rest shape.
    pub fn snapshot(
        pm: &ParticleSet,
        indices: Vec<u32>,
        compliance: Fix128,
    ) -> Result<Self, PhysicsError> {
        check_compliance(compliance)?;
        if indices.is_empty() {
            return Err(PhysicsError::InvalidConstraint {
                reason: "shape matching needs at least one particle",
            });
        }
        for &i in &indices {
            check_index(i, pm.len())?;
        }

        let start_positions: Vec<Vec2Fix> = indices
            .iter()
            .map(|&i| pm.positions[i as usize])
            .collect();
        let start_center_mass = subset_mass_center(pm, &indices);

        Ok(Self {
            indices,
            start_positions,
            start_center_mass,
            compliance,
            lambda: Fix128::ZERO,
        })
    }
}

impl PinConstraint {
    /// Pin `index` toward a world-space target.
    pub fn new(index: u32, target_position: Vec2Fix, compliance: Fix128) -> Self {
        Self {
            index,
            target_position,
            compliance,
            lambda: Fix128::ZERO,
        }
    }
}

// ============================================================================
// Geometry helpers
// ============================================================================

/// Signed shoelace area of the ordered loop `indices` over `positions`.
///
/// Positive for counter-clockwise winding.
#[must_use]
pub fn polygon_area(positions: &[Vec2Fix], indices: &[u32]) -> Fix128 {
    let n = indices.len();
    let mut area = Fix128::ZERO;
    for i in 0..n {
        let p0 = positions[indices[i] as usize];
        let p1 = positions[indices[(i + 1) % n] as usize];
        area = area + p0.cross_scalar(p1);
    }
    area.half()
}

/// Angle at `p2` between the rays toward `p1` and `p3`, in `[0, π]`.
#[must_use]
pub fn angle_between(p1: Vec2Fix, p2: Vec2Fix, p3: Vec2Fix) -> Fix128 {
    let d1 = (p1 - p2).normalize();
    let d2 = (p3 - p2).normalize();
    d1.dot(d2).acos()
}

/// Area gradient for loop vertex `i`: half the perpendicular of the segment
/// joining its loop neighbours.
#[inline]
fn loop_gradient(positions: &[Vec2Fix], indices: &[u32], i: usize) -> Vec2Fix {
    let n = indices.len();
    let prev = positions[indices[(i + n - 1) % n] as usize];
    let next = positions[indices[(i + 1) % n] as usize];
    (prev - next).perpendicular().scale(Fix128::from_ratio(1, 2))
}

/// Best-fit rotation from the mass-weighted Gram matrix `A` by Gram-Schmidt
/// orthonormalization of its columns. Falls back to identity when `A` is
/// degenerate (non-positive determinant or a vanishing column).
#[must_use]
pub fn optimal_rotation(a: Mat2Fix) -> Mat2Fix {
    if a.determinant() <= Fix128::ZERO {
        return Mat2Fix::IDENTITY;
    }

    let u = a.col0.normalize();
    if u == Vec2Fix::ZERO {
        return Mat2Fix::IDENTITY;
    }
    let v = (a.col1 - u * a.col1.dot(u)).normalize();
    if v == Vec2Fix::ZERO {
        return Mat2Fix::IDENTITY;
    }

    Mat2Fix::from_cols(u, v)
}

/// Mass-weighted center of a subset of particles; fixed particles carry no
/// weight, and a subset with zero total mass falls back to its unweighted
/// centroid.
fn subset_mass_center(pm: &ParticleSet, indices: &[u32]) -> Vec2Fix {
    let mut center = Vec2Fix::ZERO;
    let mut total_mass = Fix128::ZERO;
    for &i in indices {
        let w = pm.inv_masses[i as usize];
        if w.is_zero() {
            continue;
        }
        let m = Fix128::ONE / w;
        center = center + pm.positions[i as usize] * m;
        total_mass = total_mass + m;
    }
    if total_mass.is_zero() {
        let mut sum = Vec2Fix::ZERO;
        for &i in indices {
            sum = sum + pm.positions[i as usize];
        }
        return sum / Fix128::from_int(indices.len() as i64);
    }
    center / total_mass
}

// ============================================================================
// XPBD Projections
// ============================================================================

/// Project all distance constraints once.
pub fn solve_distance_constraints(
    pm: &mut ParticleSet,
    constraints: &mut [DistanceConstraint],
    dt: Fix128,
) {
    let dt2 = dt * dt;
    for c in constraints {
        let w1 = pm.inv_masses[c.i1 as usize];
        let w2 = pm.inv_masses[c.i2 as usize];

        let delta = pm.positions[c.i1 as usize] - pm.positions[c.i2 as usize];
        let len = delta.length();
        if len < Fix128::EPSILON {
            continue;
        }

        let constraint_value = len - c.rest_distance;
        let grad = delta / len;

        let alpha_tilde = c.compliance / dt2;
        let denom = w1 + w2 + alpha_tilde;
        if denom < Fix128::EPSILON {
            continue;
        }

        let delta_lambda = (-constraint_value - alpha_tilde * c.lambda) / denom;
        c.lambda = c.lambda + delta_lambda;

        let corr = grad * delta_lambda;
        pm.positions[c.i1 as usize] = pm.positions[c.i1 as usize] + corr * w1;
        pm.positions[c.i2 as usize] = pm.positions[c.i2 as usize] - corr * w2;
    }
}

/// Project all volume (signed area) constraints once.
pub fn solve_volume_constraints(
    pm: &mut ParticleSet,
    constraints: &mut [VolumeConstraint],
    dt: Fix128,
) {
    let dt2 = dt * dt;
    for c in constraints {
        let n = c.indices.len();
        let volume = polygon_area(&pm.positions, &c.indices);
        let constraint_value = volume - c.rest_volume;

        let alpha_tilde = c.compliance / dt2;
        let mut denom = alpha_tilde;
        for i in 0..n {
            let grad = loop_gradient(&pm.positions, &c.indices, i);
            denom = denom + pm.inv_masses[c.indices[i] as usize] * grad.dot(grad);
        }
        if denom < Fix128::EPSILON {
            continue;
        }

        let delta_lambda = (-constraint_value - alpha_tilde * c.lambda) / denom;
        c.lambda = c.lambda + delta_lambda;

        for i in 0..n {
            let idx = c.indices[i] as usize;
            let w = pm.inv_masses[idx];
            if w.is_zero() {
                continue;
            }
            let grad = loop_gradient(&pm.positions, &c.indices, i);
            pm.positions[idx] = pm.positions[idx] + grad * (w * delta_lambda);
        }
    }
}

/// Project all angle constraints once.
pub fn solve_angle_constraints(
    pm: &mut ParticleSet,
    constraints: &mut [AngleConstraint],
    dt: Fix128,
) {
    let dt2 = dt * dt;
    for c in constraints {
        let p1 = pm.positions[c.i1 as usize];
        let p2 = pm.positions[c.i2 as usize];
        let p3 = pm.positions[c.i3 as usize];

        let e1 = p1 - p2;
        let e3 = p3 - p2;
        let len1 = e1.length();
        let len3 = e3.length();
        if len1 < Fix128::EPSILON || len3 < Fix128::EPSILON {
            continue;
        }
        let d1 = e1 / len1;
        let d2 = e3 / len3;

        let cos_angle = d1.dot(d2).clamp(Fix128::NEG_ONE, Fix128::ONE);
        let angle = cos_angle.acos();
        let constraint_value = angle - c.rest_angle;

        // Collinear rays leave the bending direction undefined
        let sin_angle = (Fix128::ONE - cos_angle * cos_angle).sqrt();
        if sin_angle < Fix128::EPSILON {
            continue;
        }

        // Two-edge bending gradients of acos(d1·d2); the joint vertex takes
        // the negated sum so the correction is torque-balanced.
        let grad1 = -(d2 - d1 * cos_angle) / (len1 * sin_angle);
        let grad3 = -(d1 - d2 * cos_angle) / (len3 * sin_angle);
        let grad2 = -(grad1 + grad3);

        let w1 = pm.inv_masses[c.i1 as usize];
        let w2 = pm.inv_masses[c.i2 as usize];
        let w3 = pm.inv_masses[c.i3 as usize];

        let alpha_tilde = c.compliance / dt2;
        let denom =
            w1 * grad1.dot(grad1) + w2 * grad2.dot(grad2) + w3 * grad3.dot(grad3) + alpha_tilde;
        if denom < Fix128::EPSILON {
            continue;
        }

        let delta_lambda = (-constraint_value - alpha_tilde * c.lambda) / denom;
        c.lambda = c.lambda + delta_lambda;

        pm.positions[c.i1 as usize] = pm.positions[c.i1 as usize] + grad1 * (w1 * delta_lambda);
        pm.positions[c.i2 as usize] = pm.positions[c.i2 as usize] + grad2 * (w2 * delta_lambda);
        pm.positions[c.i3 as usize] = pm.positions[c.i3 as usize] + grad3 * (w3 * delta_lambda);
    }
}

/// Project all pin constraints once.
pub fn solve_pin_constraints(pm: &mut ParticleSet, constraints: &mut [PinConstraint], dt: Fix128) {
    let dt2 = dt * dt;
    for c in constraints {
        let idx = c.index as usize;
        let w = pm.inv_masses[idx];
        if w.is_zero() {
            continue;
        }

        let to_target = c.target_position - pm.positions[idx];
        let constraint_value = to_target.length();
        if constraint_value < Fix128::EPSILON {
            continue;
        }
        // Gradient of |target - x| with respect to x points away from the
        // target; delta_lambda comes out negative, moving x toward it.
        let grad = -(to_target / constraint_value);

        let alpha_tilde = c.compliance / dt2;
        let denom = w + alpha_tilde;
        if denom < Fix128::EPSILON {
            continue;
        }

        let delta_lambda = (-constraint_value - alpha_tilde * c.lambda) / denom;
        c.lambda = c.lambda + delta_lambda;

        pm.positions[idx] = pm.positions[idx] + grad * (w * delta_lambda);
    }
}

/// Project all shape-matching constraints once.
pub fn solve_shape_matching_constraints(
    pm: &mut ParticleSet,
    constraints: &mut [ShapeMatchingConstraint],
    dt: Fix128,
) {
    let dt2 = dt * dt;
    for c in constraints {
        // Current mass center of the group
        let mut curr_center = Vec2Fix::ZERO;
        let mut total_mass = Fix128::ZERO;
        for &i in &c.indices {
            let w = pm.inv_masses[i as usize];
            if w.is_zero() {
                continue;
            }
            let m = Fix128::ONE / w;
            curr_center = curr_center + pm.positions[i as usize] * m;
            total_mass = total_mass + m;
        }
        if total_mass.is_zero() {
            continue;
        }
        curr_center = curr_center / total_mass;

        // Mass-weighted Gram matrix A = sum m * (p - c) ⊗ (q - c0)
        let mut a = Mat2Fix::ZERO;
        for (k, &i) in c.indices.iter().enumerate() {
            let w = pm.inv_masses[i as usize];
            if w.is_zero() {
                continue;
            }
            let m = Fix128::ONE / w;
            let qi = c.start_positions[k] - c.start_center_mass;
            let pi = pm.positions[i as usize] - curr_center;
            a = a + Mat2Fix::outer(pi, qi).scale(m);
        }

        let rotation = optimal_rotation(a);
        let alpha_tilde = c.compliance / dt2;

        // Pull every particle toward its rotated goal position
        for (k, &i) in c.indices.iter().enumerate() {
            let idx = i as usize;
            let w = pm.inv_masses[idx];
            if w.is_zero() {
                continue;
            }

            let goal =
                rotation.mul_vec(c.start_positions[k] - c.start_center_mass) + curr_center;
            let to_goal = goal - pm.positions[idx];
            let constraint_value = to_goal.length();
            if constraint_value < Fix128::EPSILON {
                continue;
            }
            let grad = -(to_goal / constraint_value);

            let denom = w + alpha_tilde;
            if denom < Fix128::EPSILON {
                continue;
            }
            let delta_lambda = (-constraint_value - alpha_tilde * c.lambda) / denom;
            c.lambda = c.lambda + delta_lambda;

            pm.positions[idx] = pm.positions[idx] + grad * (w * delta_lambda);
        }
    }
}

// ============================================================================
// Driver Constraints
// ============================================================================

/// Inject linear acceleration drives.
pub fn solve_acceleration_constraints(
    pm: &mut ParticleSet,
    constraints: &[AccelerationConstraint],
    dt: Fix128,
) {
    let dt2 = dt * dt;
    for c in constraints {
        let offset = c.acceleration * dt2;
        for &i in &c.indices {
            let idx = i as usize;
            if pm.inv_masses[idx].is_zero() {
                continue;
            }
            pm.positions[idx] = pm.positions[idx] + offset;
        }
    }
}

/// Inject linear force drives.
pub fn solve_force_constraints(pm: &mut ParticleSet, constraints: &[ForceConstraint], dt: Fix128) {
    let dt2 = dt * dt;
    for c in constraints {
        for &i in &c.indices {
            let idx = i as usize;
            let w = pm.inv_masses[idx];
            if w.is_zero() {
                continue;
            }
            pm.positions[idx] = pm.positions[idx] + c.force * (w * dt2);
        }
    }
}

/// Inject linear velocity drives.
pub fn solve_velocity_constraints(
    pm: &mut ParticleSet,
    constraints: &[VelocityConstraint],
    dt: Fix128,
) {
    for c in constraints {
        let offset = c.velocity * dt;
        for &i in &c.indices {
            let idx = i as usize;
            if pm.inv_masses[idx].is_zero() {
                continue;
            }
            pm.positions[idx] = pm.positions[idx] + offset;
        }
    }
}

/// Rotate a particle about a pivot.
#[inline]
fn rotate_about(p: Vec2Fix, pivot: Vec2Fix, sin_cos: (Fix128, Fix128)) -> Vec2Fix {
    let r = p - pivot;
    let (s, c) = sin_cos;
    pivot
        + Vec2Fix::new(
            r.x * c - r.y * s,
            r.x * s + r.y * c,
        )
}

/// Inject angular acceleration drives.
pub fn solve_angular_acceleration_constraints(
    pm: &mut ParticleSet,
    constraints: &[AngularAccelerationConstraint],
    dt: Fix128,
) {
    let dt2 = dt * dt;
    for c in constraints {
        let sc = (c.acceleration * dt2).sin_cos();
        for &i in &c.indices {
            let idx = i as usize;
            if pm.inv_masses[idx].is_zero() {
                continue;
            }
            pm.positions[idx] = rotate_about(pm.positions[idx], c.position, sc);
        }
    }
}

/// Inject angular force (torque) drives. The rotation per particle scales
/// with its inverse mass.
pub fn solve_angular_force_constraints(
    pm: &mut ParticleSet,
    constraints: &[AngularForceConstraint],
    dt: Fix128,
) {
    let dt2 = dt * dt;
    for c in constraints {
        for &i in &c.indices {
            let idx = i as usize;
            let w = pm.inv_masses[idx];
            if w.is_zero() {
                continue;
            }
            let sc = (c.force * w * dt2).sin_cos();
            pm.positions[idx] = rotate_about(pm.positions[idx], c.position, sc);
        }
    }
}

/// Inject angular velocity drives.
pub fn solve_angular_velocity_constraints(
    pm: &mut ParticleSet,
    constraints: &[AngularVelocityConstraint],
    dt: Fix128,
) {
    for c in constraints {
        let sc = (c.velocity * dt).sin_cos();
        for &i in &c.indices {
            let idx = i as usize;
            if pm.inv_masses[idx].is_zero() {
                continue;
            }
            pm.positions[idx] = rotate_about(pm.positions[idx], c.position, sc);
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

//! Joint System — Cross-Body Constraints
//!
//! Joints couple particles belonging to two independently owned bodies.
//! They hold non-owning [`BodyHandle`]s into the world's body arena; a
//! handle whose body has been removed simply makes the joint skip its solve
//! for the step. That keeps teardown order irrelevant: bodies can be
//! removed while joints referencing them still exist.
//!
//! Two kinds:
//!
//! - [`DistanceJoint`] — the cross-body analog of the distance constraint,
//!   same XPBD projection.
//! - [`MotorJoint`] — drives the indexed particles of two bodies around an
//!   anchor point (the mean of an index set on an anchor body, plus an
//!   offset) at a target angular rate, as a compliance-damped tangential
//!   position correction.
//!
//! Joint `lambda` accumulators follow the same lifecycle as constraint
//! lambdas: reset at substep boundaries, shared across iterations.
//!
//! Author: Moroya Sakamoto

use crate::math::{Fix128, Vec2Fix};
use crate::world::{BodyArena, BodyHandle};

#[cfg(not(feature = "std"))]
use alloc::vec::Vec;

/// Compliant distance constraint between particles of two bodies.
#[derive(Clone, Debug)]
pub struct DistanceJoint {
    /// First body
    pub body1: BodyHandle,
    /// Particle index in the first body
    pub index1: u32,
    /// Second body
    pub body2: BodyHandle,
    /// Particle index in the second body
    pub index2: u32,
    /// Target separation
    pub rest_distance: Fix128,
    /// Inverse stiffness; zero is perfectly rigid
    pub compliance: Fix128,
    /// Accumulated Lagrange multiplier (reset every substep)
    pub lambda: Fix128,
}

impl DistanceJoint {
    /// Create a joint with an explicit rest distance.
    #[must_use]
    pub fn new(
        body1: BodyHandle,
        index1: u32,
        body2: BodyHandle,
        index2: u32,
        rest_distance: Fix128,
        compliance: Fix128,
    ) -> Self {
        Self {
            body1,
            index1,
            body2,
            index2,
            rest_distance,
            compliance,
            lambda: Fix128::ZERO,
        }
    }
}

/// Rotational driver approximating a motor.
///
/// The anchor point is the mean position of `anchor_indices` on the anchor
/// body plus `anchor_offset`. Each solver iteration nudges every driven
/// particle along the tangent of rotation about the anchor, proportional to
/// its radius and the target angular rate.
#[derive(Clone, Debug)]
pub struct MotorJoint {
    /// Body whose particles define the anchor point
    pub anchor_body: BodyHandle,
    /// Particle indices averaged into the anchor position
    pub anchor_indices: Vec<u32>,
    /// World-space offset added to the averaged anchor
    pub anchor_offset: Vec2Fix,
    /// First driven body
    pub body1: BodyHandle,
    /// Driven particle indices in the first body
    pub indices1: Vec<u32>,
    /// Second driven body
    pub body2: BodyHandle,
    /// Driven particle indices in the second body
    pub indices2: Vec<u32>,
    /// Target angular rate in radians per second (positive = CCW)
    pub target_angular_velocity: Fix128,
    /// Inverse stiffness of the drive
    pub compliance: Fix128,
    /// Accumulated Lagrange multiplier (reset every substep)
    pub lambda: Fix128,
}

/// Solve all distance joints once.
///
/// A joint is skipped when either handle is dead, or when both handles
/// resolve to the same body slot (a joint is a cross-body entity).
pub fn solve_distance_joints(joints: &mut [DistanceJoint], bodies: &mut BodyArena, dt: Fix128) {
    let dt2 = dt * dt;
    for j in joints {
        let Some((sb1, sb2)) = bodies.get_pair_mut(j.body1, j.body2) else {
            continue;
        };

        let i1 = j.index1 as usize;
        let i2 = j.index2 as usize;
        if i1 >= sb1.particles.len() || i2 >= sb2.particles.len() {
            continue;
        }

        let w1 = sb1.particles.inv_masses[i1];
        let w2 = sb2.particles.inv_masses[i2];

        let delta = sb1.particles.positions[i1] - sb2.particles.positions[i2];
        let len = delta.length();
        if len < Fix128::EPSILON {
            continue;
        }

        let constraint_value = len - j.rest_distance;
        let grad = delta / len;

        let alpha_tilde = j.compliance / dt2;
        let denom = w1 + w2 + alpha_tilde;
        if denom < Fix128::EPSILON {
            continue;
        }

        let delta_lambda = (-constraint_value - alpha_tilde * j.lambda) / denom;
        j.lambda = j.lambda + delta_lambda;

        let corr = grad * delta_lambda;
        sb1.particles.positions[i1] = sb1.particles.positions[i1] + corr * w1;
        sb2.particles.positions[i2] = sb2.particles.positions[i2] - corr * w2;
    }
}

/// Solve all motor joints once.
///
/// A joint is skipped entirely when the anchor body or either driven body
/// is dead.
pub fn solve_motor_joints(joints: &mut [MotorJoint], bodies: &mut BodyArena, dt: Fix128) {
    let dt2 = dt * dt;
    for j in joints {
        if j.anchor_indices.is_empty() {
            continue;
        }
        if bodies.get(j.body1).is_none() || bodies.get(j.body2).is_none() {
            continue;
        }

        // Anchor = mean of the anchor particles, plus the offset
        let anchor = {
            let Some(anchor_body) = bodies.get(j.anchor_body) else {
                continue;
            };
            let mut sum = Vec2Fix::ZERO;
            let mut valid = true;
            for &idx in &j.anchor_indices {
                if idx as usize >= anchor_body.particles.len() {
                    valid = false;
                    break;
                }
                sum = sum + anchor_body.particles.positions[idx as usize];
            }
            if !valid {
                continue;
            }
            sum / Fix128::from_int(j.anchor_indices.len() as i64) + j.anchor_offset
        };

        // Tangential displacement target per substep: ω · dt · |r|
        let angle_step = j.target_angular_velocity * dt;
        let alpha_tilde = j.compliance / dt2;

        for (handle, indices) in [(j.body1, &j.indices1), (j.body2, &j.indices2)] {
            let Some(body) = bodies.get_mut(handle) else {
                continue;
            };
            for &idx in indices {
                let i = idx as usize;
                if i >= body.particles.len() {
                    continue;
                }
                let w = body.particles.inv_masses[i];
                if w.is_zero() {
                    continue;
                }

                let r = body.particles.positions[i] - anchor;
                let r_len = r.length();
                if r_len < Fix128::EPSILON {
                    continue;
                }
                let tangent = r.perpendicular() / r_len;

                let target_disp = angle_step * r_len;
                let denom = w + alpha_tilde;
                if denom < Fix128::EPSILON {
                    continue;
                }

                let delta_lambda = (target_disp - alpha_tilde * j.lambda) / denom;
                j.lambda = j.lambda + delta_lambda;

                body.particles.positions[i] =
                    body.particles.positions[i] + tangent * (w * delta_lambda);
            }
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(all(test, feature = "std"))]
mod tests {
    use super::*;
    use crate::body::SoftBody;
    use crate::math::Fix128;

    fn single_particle_body(x: i64, y: i64) -> SoftBody {
        let mut body = SoftBody::new();
        body.particles.push(Vec2Fix::from_int(x, y), Fix128::ONE);
        body
    }

    fn dt() -> Fix128 {
        Fix128::from_ratio(1, 60)
    }

    #[test]
    fn test_distance_joint_converges() {
        let mut bodies = BodyArena::new();
        let h1 = bodies.insert(single_particle_body(0, 0));
        let h2 = bodies.insert(single_particle_body(8, 0));

        let mut joints = [DistanceJoint::new(
            h1,
            0,
            h2,
            0,
            Fix128::from_int(5),
            Fix128::ZERO,
        )];

        solve_distance_joints(&mut joints, &mut bodies, dt());

        let p1 = bodies.get(h1).unwrap().particles.positions[0];
        let p2 = bodies.get(h2).unwrap().particles.positions[0];
        let d = p1.distance_to(p2);
        assert!((d - Fix128::from_int(5)).abs() < Fix128::from_ratio(1, 1000));
    }

    #[test]
    fn test_distance_joint_dead_body_is_skipped() {
        let mut bodies = BodyArena::new();
        let h1 = bodies.insert(single_particle_body(0, 0));
        let h2 = bodies.insert(single_particle_body(8, 0));
        bodies.remove(h2);

        let mut joints = [DistanceJoint::new(
            h1,
            0,
            h2,
            0,
            Fix128::from_int(5),
            Fix128::ZERO,
        )];

        solve_distance_joints(&mut joints, &mut bodies, dt());

        // The surviving body is untouched
        let p1 = bodies.get(h1).unwrap().particles.positions[0];
        assert_eq!(p1, Vec2Fix::ZERO);
        assert!(joints[0].lambda.is_zero());
    }

    #[test]
    fn test_distance_joint_same_body_is_skipped() {
        let mut bodies = BodyArena::new();
        let h1 = bodies.insert(single_particle_body(0, 0));

        let mut joints = [DistanceJoint::new(
            h1,
            0,
            h1,
            0,
            Fix128::from_int(5),
            Fix128::ZERO,
        )];

        solve_distance_joints(&mut joints, &mut bodies, dt());
        assert!(joints[0].lambda.is_zero());
    }

    #[test]
    fn test_motor_joint_rotates_driven_particles() {
        let mut bodies = BodyArena::new();
        let anchor = bodies.insert(single_particle_body(0, 0));
        let driven = bodies.insert(single_particle_body(2, 0));

        let mut joints = [MotorJoint {
            anchor_body: anchor,
            anchor_indices: vec![0],
            anchor_offset: Vec2Fix::ZERO,
            body1: driven,
            indices1: vec![0],
            body2: anchor,
            indices2: vec![],
            target_angular_velocity: Fix128::from_int(6), // CCW
            compliance: Fix128::ZERO,
            lambda: Fix128::ZERO,
        }];

        solve_motor_joints(&mut joints, &mut bodies, dt());

        let p = bodies.get(driven).unwrap().particles.positions[0];
        // Tangent at (2,0) about the origin is +Y; the particle must have
        // been nudged CCW by ω·dt·|r| = 6/60·2 = 0.2
        assert!(p.y > Fix128::from_ratio(1, 10));
        assert!((p.y - Fix128::from_ratio(1, 5)).abs() < Fix128::from_ratio(1, 100));
        assert_eq!(p.x, Fix128::from_int(2));
    }

    #[test]
    fn test_motor_joint_dead_anchor_is_skipped() {
        let mut bodies = BodyArena::new();
        let anchor = bodies.insert(single_particle_body(0, 0));
        let driven = bodies.insert(single_particle_body(2, 0));
        bodies.remove(anchor);

        let mut joints = [MotorJoint {
            anchor_body: anchor,
            anchor_indices: vec![0],
            anchor_offset: Vec2Fix::ZERO,
            body1: driven,
            indices1: vec![0],
            body2: driven,
            indices2: vec![],
            target_angular_velocity: Fix128::from_int(6),
            compliance: Fix128::ZERO,
            lambda: Fix128::ZERO,
        }];

        solve_motor_joints(&mut joints, &mut bodies, dt());

        let p = bodies.get(driven).unwrap().particles.positions[0];
        assert_eq!(p, Vec2Fix::from_int(2, 0));
    }

    #[test]
    fn test_motor_joint_skips_fixed_particles() {
        let mut bodies = BodyArena::new();
        let anchor = bodies.insert(single_particle_body(0, 0));
        let mut wheel = SoftBody::new();
        wheel.particles.push(Vec2Fix::from_int(2, 0), Fix128::ZERO); // fixed
        let driven = bodies.insert(wheel);

        let mut joints = [MotorJoint {
            anchor_body: anchor,
            anchor_indices: vec![0],
            anchor_offset: Vec2Fix::ZERO,
            body1: driven,
            indices1: vec![0],
            body2: anchor,
            indices2: vec![],
            target_angular_velocity: Fix128::from_int(6),
            compliance: Fix128::ZERO,
            lambda: Fix128::ZERO,
        }];

        solve_motor_joints(&mut joints, &mut bodies, dt());

        let p = bodies.get(driven).unwrap().particles.positions[0];
        assert_eq!(p, Vec2Fix::from_int(2, 0));
    }
}

//! Soft-Soft Collision Detection and Resolution
//!
//! Brute-force point-vs-polygon contacts between body pairs:
//!
//! 1. **Detection** — for an ordered pair (A, B), every entry of A's
//!    `collision_points` is tested for containment in B's collision loop by
//!    ray parity. Each inside point is paired with its nearest loop edge
//!    (clamped segment projection) and emitted as a transient point-edge
//!    contact. Both orderings must be run so interpenetration from either
//!    side is caught.
//! 2. **Resolution** — each contact is an XPBD constraint on the distance
//!    from the point to the (re-projected) closest edge point, with the
//!    edge endpoints weighted by the interpolation parameter, followed by a
//!    position-level static-friction correction along the edge tangent.
//!
//! Contacts are regenerated every substep and never persisted on bodies.
//! The accumulated contact multiplier is clamped non-positive so a contact
//! can only push, never pull.

use crate::body::SoftBody;
use crate::math::{Fix128, Vec2Fix};
use crate::raycast::raycast_all_intersections;
use crate::world::BodyHandle;

#[cfg(not(feature = "std"))]
use alloc::vec::Vec;

/// Transient point-edge contact between two bodies.
///
/// Holds non-owning [`BodyHandle`]s; the orchestrator resolves them each
/// solve and skips the contact when either body is gone.
#[derive(Clone, Debug)]
pub struct ContactConstraint {
    /// Body owning the penetrating point
    pub body_a: BodyHandle,
    /// Body owning the edge
    pub body_b: BodyHandle,
    /// Penetrating particle index in body A
    pub point_index: u32,
    /// First edge endpoint index in body B
    pub edge_index0: u32,
    /// Second edge endpoint index in body B
    pub edge_index1: u32,
    /// Contact compliance (near zero = effectively rigid)
    pub compliance: Fix128,
    /// Accumulated Lagrange multiplier (non-positive)
    pub lambda: Fix128,
    /// Static friction coefficient
    pub friction_static: Fix128,
    /// Kinetic friction coefficient (carried for a velocity-level pass)
    pub friction_kinetic: Fix128,
}

/// Detect contacts for the ordered pair (A, B): points of A inside B.
///
/// Appends one contact per penetrating point to `out`.
pub fn detect_soft_soft_collisions(
    body_a: &SoftBody,
    handle_a: BodyHandle,
    body_b: &SoftBody,
    handle_b: BodyHandle,
    compliance: Fix128,
    friction_static: Fix128,
    friction_kinetic: Fix128,
    out: &mut Vec<ContactConstraint>,
) {
    let positions_a = &body_a.particles.positions;
    let positions_b = &body_b.particles.positions;
    let shape_b = &body_b.collision_shape;

    if shape_b.len() < 3 {
        return;
    }

    for &index in &body_a.collision_points {
        let point = positions_a[index as usize];

        let hits = raycast_all_intersections(point, Vec2Fix::UNIT_X, body_b);
        if hits.len() % 2 != 1 {
            continue;
        }

        // Inside B: find the nearest edge of B's loop
        let mut min_dist = Fix128::from_raw(i64::MAX, 0);
        let mut nearest_edge = 0usize;

        let n = shape_b.len();
        for i in 0..n {
            let e1 = positions_b[shape_b[i] as usize];
            let e2 = positions_b[shape_b[(i + 1) % n] as usize];

            let edge = e2 - e1;
            let len = edge.length();
            if len < Fix128::EPSILON {
                continue;
            }

            let dir = edge / len;
            let proj = (point - e1).dot(dir).clamp(Fix128::ZERO, len);
            let closest = e1 + dir * proj;
            let dist = point.distance_to(closest);

            if dist < min_dist {
                min_dist = dist;
                nearest_edge = i;
            }
        }

        out.push(ContactConstraint {
            body_a: handle_a,
            body_b: handle_b,
            point_index: index,
            edge_index0: shape_b[nearest_edge],
            edge_index1: shape_b[(nearest_edge + 1) % n],
            compliance,
            lambda: Fix128::ZERO,
            friction_static,
            friction_kinetic,
        });
    }
}

/// Solve one contact once: XPBD normal projection plus static friction.
///
/// `body_a` owns the point, `body_b` the edge; the caller has already
/// resolved the handles to live, distinct bodies.
pub fn solve_contact_constraint(
    constraint: &mut ContactConstraint,
    body_a: &mut SoftBody,
    body_b: &mut SoftBody,
    dt: Fix128,
) {
    let pi = constraint.point_index as usize;
    let i0 = constraint.edge_index0 as usize;
    let i1 = constraint.edge_index1 as usize;

    let p = body_a.particles.positions[pi];
    let p_w = body_a.particles.inv_masses[pi];

    let e0 = body_b.particles.positions[i0];
    let e1 = body_b.particles.positions[i1];
    let e0_w = body_b.particles.inv_masses[i0];
    let e1_w = body_b.particles.inv_masses[i1];

    // Re-project onto the (possibly moved) edge
    let edge = e1 - e0;
    let edge_len_sq = edge.dot(edge);
    if edge_len_sq < Fix128::EPSILON {
        return;
    }

    let t = ((p - e0).dot(edge) / edge_len_sq).clamp(Fix128::ZERO, Fix128::ONE);
    let one_minus_t = Fix128::ONE - t;
    let closest = e0 + edge * t;

    let to_point = p - closest;
    let constraint_value = to_point.length();
    if constraint_value < Fix128::EPSILON {
        return;
    }
    let normal = to_point / constraint_value;

    let grad_p = normal;
    let grad_e0 = -normal * one_minus_t;
    let grad_e1 = -normal * t;

    let w_sum = p_w + e0_w * one_minus_t * one_minus_t + e1_w * t * t;
    if w_sum < Fix128::EPSILON {
        return;
    }

    let alpha_tilde = constraint.compliance / (dt * dt);
    let delta_lambda =
        (-constraint_value - alpha_tilde * constraint.lambda) / (w_sum + alpha_tilde);

    // The contact impulse must stay repulsive: the multiplier accumulates
    // non-positive, so clamp at zero from above.
    let new_lambda = (constraint.lambda + delta_lambda).min(Fix128::ZERO);
    let delta_lambda = new_lambda - constraint.lambda;
    constraint.lambda = new_lambda;

    body_a.particles.positions[pi] = p + grad_p * (p_w * delta_lambda);
    body_b.particles.positions[i0] = e0 + grad_e0 * (e0_w * delta_lambda);
    body_b.particles.positions[i1] = e1 + grad_e1 * (e1_w * delta_lambda);

    // Static friction: cancel tangential relative displacement accumulated
    // since the previous positions, bounded by the normal impulse.
    let tangent = Vec2Fix::new(-normal.y, normal.x);

    let p_disp = body_a.particles.positions[pi] - body_a.particles.prev_positions[pi];
    let e0_disp = body_b.particles.positions[i0] - body_b.particles.prev_positions[i0];
    let e1_disp = body_b.particles.positions[i1] - body_b.particles.prev_positions[i1];

    let edge_disp = e0_disp * one_minus_t + e1_disp * t;
    let relative_disp = p_disp - edge_disp;
    let tangential_disp = relative_disp.dot(tangent);

    let max_static = constraint.friction_static * delta_lambda.abs();
    let correction = (-tangential_disp).clamp(-max_static, max_static);

    body_a.particles.positions[pi] =
        body_a.particles.positions[pi] + tangent * (p_w / w_sum * correction);
    body_b.particles.positions[i0] =
        body_b.particles.positions[i0] - tangent * (e0_w * one_minus_t / w_sum * correction);
    body_b.particles.positions[i1] =
        body_b.particles.positions[i1] - tangent * (e1_w * t / w_sum * correction);
}

// ============================================================================
// Tests
// ============================================================================

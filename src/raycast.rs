//! Ray Queries Against Collision Loops
//!
//! Deterministic ray-vs-edge-loop intersection used by the collision
//! subsystem: cast a ray from a point and collect every crossing of a
//! body's collision shape. An odd crossing count means the point lies
//! inside the loop (even-odd rule), which is the containment test the
//! soft-soft collision detector is built on.

use crate::body::SoftBody;
use crate::math::{Fix128, Vec2Fix};

#[cfg(not(feature = "std"))]
use alloc::vec::Vec;

/// A single ray-edge intersection.
#[derive(Clone, Copy, Debug)]
pub struct RayHit {
    /// World-space intersection point
    pub point: Vec2Fix,
    /// Distance from the ray origin, in units of the direction vector
    pub distance: Fix128,
    /// Index of the intersected edge in the loop (edge i joins loop[i] and
    /// loop[i+1 mod n])
    pub edge_index: usize,
}

/// Collect every intersection of a ray with the closed loop `shape` over
/// `positions`.
///
/// Edges parallel to the ray (within [`Fix128::EPSILON`]) are skipped.
#[must_use]
pub fn raycast_loop(
    origin: Vec2Fix,
    direction: Vec2Fix,
    positions: &[Vec2Fix],
    shape: &[u32],
) -> Vec<RayHit> {
    let mut hits = Vec::new();
    let n = shape.len();
    if n < 2 {
        return hits;
    }

    // Normal used to project out the ray direction when solving for the
    // edge parameter.
    let normal = Vec2Fix::new(-direction.y, direction.x);

    for i in 0..n {
        let p1 = positions[shape[i] as usize];
        let p2 = positions[shape[(i + 1) % n] as usize];
        let edge = p2 - p1;

        let denom = edge.dot(normal);
        if denom.abs() < Fix128::EPSILON {
            continue;
        }

        // origin + u*direction = p1 + t*edge
        let t = (origin - p1).dot(normal) / denom;
        let u = (p1 - origin).cross_scalar(edge) / direction.cross_scalar(edge);

        if !u.is_negative() && !t.is_negative() && t <= Fix128::ONE {
            hits.push(RayHit {
                point: origin + direction * u,
                distance: u,
                edge_index: i,
            });
        }
    }

    hits
}

/// Collect every intersection of a ray with a body's collision shape.
#[must_use]
pub fn raycast_all_intersections(
    origin: Vec2Fix,
    direction: Vec2Fix,
    body: &SoftBody,
) -> Vec<RayHit> {
    raycast_loop(
        origin,
        direction,
        &body.particles.positions,
        &body.collision_shape,
    )
}

/// Nearest intersection of a ray with a body's collision shape, if any.
#[must_use]
pub fn raycast_first_intersection(
    origin: Vec2Fix,
    direction: Vec2Fix,
    body: &SoftBody,
) -> Option<RayHit> {
    raycast_all_intersections(origin, direction, body)
        .into_iter()
        .min_by(|a, b| a.distance.cmp(&b.distance))
}

/// Even-odd containment test: `point` is inside the loop when a ray cast
/// along +X crosses the loop an odd number of times.
#[must_use]
pub fn point_in_loop(point: Vec2Fix, positions: &[Vec2Fix], shape: &[u32]) -> bool {
    raycast_loop(point, Vec2Fix::UNIT_X, positions, shape).len() % 2 == 1
}

/// Even-odd containment test against a body's collision shape.
#[must_use]
pub fn point_in_body(point: Vec2Fix, body: &SoftBody) -> bool {
    point_in_loop(point, &body.particles.positions, &body.collision_shape)
}

// ============================================================================
// Tests
// ============================================================================

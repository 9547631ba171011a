//! Procedural Body Generation
//!
//! Builders that produce ready-to-simulate soft bodies: regular polygon
//! rings and a two-ring wheel (rigid-ish disk plus pressurized tire).
//! These are conveniences over the validated `SoftBody` API; the solver
//! itself never depends on them.

use crate::body::SoftBody;
use crate::error::PhysicsError;
use crate::math::{Fix128, Vec2Fix};

#[cfg(not(feature = "std"))]
use alloc::vec::Vec;

/// Positions of a regular polygon, counter-clockwise, starting at angle 0.
///
/// `segments` is clamped to at least 3.
#[must_use]
pub fn polygon_positions(segments: usize, radius: Fix128, origin: Vec2Fix) -> Vec<Vec2Fix> {
    let segments = segments.max(3);
    let angle_step = Fix128::TWO_PI / Fix128::from_int(segments as i64);

    let mut positions = Vec::with_capacity(segments);
    for i in 0..segments {
        let (s, c) = (angle_step * Fix128::from_int(i as i64)).sin_cos();
        positions.push(origin + Vec2Fix::new(c, s) * radius);
    }
    positions
}

/// Chain every particle to its loop successor with distance constraints.
pub fn add_distance_loop(body: &mut SoftBody, compliance: Fix128) -> Result<(), PhysicsError> {
    let n = body.particles.len() as u32;
    for i in 0..n {
        body.add_distance_constraint(i, (i + 1) % n, compliance)?;
    }
    Ok(())
}

/// Add one volume constraint spanning every particle, rest area measured
/// from current positions.
pub fn add_volume_loop(body: &mut SoftBody, compliance: Fix128) -> Result<(), PhysicsError> {
    let indices: Vec<u32> = (0..body.particles.len() as u32).collect();
    body.add_volume_constraint(indices, compliance)?;
    Ok(())
}

/// Register every particle as a collision point.
pub fn add_collision_points_loop(body: &mut SoftBody) -> Result<(), PhysicsError> {
    let indices: Vec<u32> = (0..body.particles.len() as u32).collect();
    body.set_collision_points(indices)
}

/// Register the particle order as the collision shape loop.
pub fn add_collision_shape_loop(body: &mut SoftBody) -> Result<(), PhysicsError> {
    let indices: Vec<u32> = (0..body.particles.len() as u32).collect();
    body.set_collision_shape(indices)
}

/// Build a complete soft polygon: ring of point masses, edge distance
/// constraints, one volume constraint, and collision data over the loop.
pub fn soft_polygon(
    segments: usize,
    radius: Fix128,
    origin: Vec2Fix,
    point_mass: Fix128,
    distance_compliance: Fix128,
    volume_compliance: Fix128,
) -> Result<SoftBody, PhysicsError> {
    let mut body = SoftBody::new();
    for position in polygon_positions(segments, radius, origin) {
        body.particles.push(position, point_mass);
    }

    add_distance_loop(&mut body, distance_compliance)?;
    add_volume_loop(&mut body, volume_compliance)?;
    add_collision_points_loop(&mut body)?;
    add_collision_shape_loop(&mut body)?;

    Ok(body)
}

/// Wheel construction parameters: a stiff inner disk ring around a hub
/// particle, and an outer tire ring held out by a pressurized volume
/// constraint.
#[derive(Clone, Debug)]
pub struct WheelParams {
    /// Wheel center
    pub center: Vec2Fix,
    /// Outer (tire) radius
    pub radius: Fix128,
    /// Total mass of hub plus disk ring
    pub disk_mass: Fix128,
    /// Total mass of the tire ring
    pub tire_mass: Fix128,
    /// Tire thickness as a fraction of the radius, clamped to `[0.1, 0.7]`
    pub tire_ratio: Fix128,
    /// Compliance of hub-to-disk spokes
    pub disk_hub_compliance: Fix128,
    /// Compliance of the disk ring
    pub disk_rim_compliance: Fix128,
    /// Compliance of disk-to-tire links
    pub tire_body_compliance: Fix128,
    /// Compliance of the tire tread ring
    pub tire_tread_compliance: Fix128,
    /// Compliance of the tire pressure (volume) constraint
    pub tire_pressure_compliance: Fix128,
    /// Rest-volume multiplier for the tire (> 1 inflates)
    pub tire_pressure: Fix128,
    /// Number of radial segments, clamped to `[3, 30]`
    pub radial_segments: usize,
}

impl Default for WheelParams {
    fn default() -> Self {
        Self {
            center: Vec2Fix::ZERO,
            radius: Fix128::from_int(200),
            disk_mass: Fix128::from_int(20),
            tire_mass: Fix128::from_int(5),
            tire_ratio: Fix128::from_ratio(2, 5),
            disk_hub_compliance: Fix128::ZERO,
            disk_rim_compliance: Fix128::ZERO,
            tire_body_compliance: Fix128::from_ratio(1, 50),
            tire_tread_compliance: Fix128::from_ratio(1, 20),
            tire_pressure_compliance: Fix128::from_ratio(1, 100),
            tire_pressure: Fix128::ONE,
            radial_segments: 12,
        }
    }
}

/// Build a wheel body.
///
/// Layout: particle 0 is the hub; particles `1 + 2k` / `2 + 2k` alternate
/// disk and tire ring points. The tire points are offset by half a segment
/// so the disk-to-tire links triangulate. Collision data covers the tire
/// ring.
pub fn wheel(params: &WheelParams) -> Result<SoftBody, PhysicsError> {
    let segments = params.radial_segments.clamp(3, 30);
    let tire_ratio = params
        .tire_ratio
        .clamp(Fix128::from_ratio(1, 10), Fix128::from_ratio(7, 10));

    let disk_point_mass = params.disk_mass / Fix128::from_int(segments as i64 + 1);
    let tire_point_mass = params.tire_mass / Fix128::from_int(segments as i64);

    let inner_radius = params.radius * (Fix128::ONE - tire_ratio);
    let outer_radius = params.radius;

    let angle_step = Fix128::TWO_PI / Fix128::from_int(segments as i64);
    let half_angle_step = angle_step.half();

    let mut body = SoftBody::new();
    let hub = body.particles.push(params.center, disk_point_mass) as u32;

    let mut inner_ids = Vec::with_capacity(segments);
    let mut outer_ids = Vec::with_capacity(segments);
    for i in 0..segments {
        let angle = angle_step * Fix128::from_int(i as i64);

        let (s, c) = angle.sin_cos();
        let disk_pos = params.center + Vec2Fix::new(c, s) * inner_radius;
        inner_ids.push(body.particles.push(disk_pos, disk_point_mass) as u32);

        let (s, c) = (angle - half_angle_step).sin_cos();
        let tire_pos = params.center + Vec2Fix::new(c, s) * outer_radius;
        outer_ids.push(body.particles.push(tire_pos, tire_point_mass) as u32);
    }

    for i in 0..segments {
        let next = (i + 1) % segments;

        // hub spokes
        body.add_distance_constraint(hub, inner_ids[i], params.disk_hub_compliance)?;
        // disk ring
        body.add_distance_constraint(inner_ids[i], inner_ids[next], params.disk_rim_compliance)?;
        // disk to tire, straight and shifted
        body.add_distance_constraint(inner_ids[i], outer_ids[i], params.tire_body_compliance)?;
        body.add_distance_constraint(
            inner_ids[i],
            outer_ids[next],
            params.tire_body_compliance,
        )?;
        // tread ring
        body.add_distance_constraint(
            outer_ids[i],
            outer_ids[next],
            params.tire_tread_compliance,
        )?;
    }

    // Disk keeps its area rigidly
    body.add_volume_constraint(inner_ids.clone(), Fix128::ZERO)?;

    // Tire volume, inflated by the pressure multiplier
    let tire_volume = body.add_volume_constraint(
        outer_ids.clone(),
        params.tire_pressure_compliance,
    )?;
    body.volume_constraints[tire_volume].rest_volume =
        body.volume_constraints[tire_volume].rest_volume * params.tire_pressure;

    body.set_collision_points(outer_ids.clone())?;
    body.set_collision_shape(outer_ids)?;

    Ok(body)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(all(test, feature = "std"))]
mod tests {
    use super::*;
    use crate::constraint::polygon_area;

    #[test]
    fn test_polygon_positions_on_circle() {
        let positions = polygon_positions(6, Fix128::from_int(10), Vec2Fix::from_int(5, 5));
        assert_eq!(positions.len(), 6);
        for p in &positions {
            let r = (*p - Vec2Fix::from_int(5, 5)).length();
            assert!((r - Fix128::from_int(10)).abs() < Fix128::from_ratio(1, 1000));
        }
        // First vertex sits at angle zero
        assert!((positions[0].x - Fix128::from_int(15)).abs() < Fix128::from_ratio(1, 1000));
    }

    #[test]
    fn test_polygon_positions_clamps_segments() {
        assert_eq!(polygon_positions(1, Fix128::ONE, Vec2Fix::ZERO).len(), 3);
    }

    #[test]
    fn test_soft_polygon_is_fully_outfitted() {
        let body = soft_polygon(
            8,
            Fix128::from_int(50),
            Vec2Fix::ZERO,
            Fix128::ONE,
            Fix128::ZERO,
            Fix128::from_ratio(1, 100),
        )
        .unwrap();

        assert_eq!(body.particles.len(), 8);
        assert_eq!(body.distance_constraints.len(), 8);
        assert_eq!(body.volume_constraints.len(), 1);
        assert_eq!(body.collision_points.len(), 8);
        assert_eq!(body.collision_shape.len(), 8);

        // CCW generation gives a positive signed area
        assert!(body.volume_constraints[0].rest_volume > Fix128::ZERO);
    }

    #[test]
    fn test_wheel_structure() {
        let params = WheelParams {
            radial_segments: 8,
            ..WheelParams::default()
        };
        let body = wheel(&params).unwrap();

        // hub + 8 disk + 8 tire
        assert_eq!(body.particles.len(), 17);
        // 5 distance constraints per segment
        assert_eq!(body.distance_constraints.len(), 40);
        // disk volume + tire volume
        assert_eq!(body.volume_constraints.len(), 2);
        // collision data on the tire ring only
        assert_eq!(body.collision_points.len(), 8);
        assert_eq!(body.collision_shape.len(), 8);
    }

    #[test]
    fn test_wheel_pressure_scales_rest_volume() {
        let base = wheel(&WheelParams {
            radial_segments: 8,
            tire_pressure: Fix128::ONE,
            ..WheelParams::default()
        })
        .unwrap();
        let inflated = wheel(&WheelParams {
            radial_segments: 8,
            tire_pressure: Fix128::from_int(2),
            ..WheelParams::default()
        })
        .unwrap();

        let v1 = base.volume_constraints[1].rest_volume;
        let v2 = inflated.volume_constraints[1].rest_volume;
        assert!((v2 - v1.double()).abs() < Fix128::from_ratio(1, 1000));
    }

    #[test]
    fn test_wheel_tire_loop_area_matches_measure() {
        let body = wheel(&WheelParams {
            radial_segments: 8,
            tire_pressure: Fix128::ONE,
            ..WheelParams::default()
        })
        .unwrap();
        // With pressure 1 the tire rest volume equals the measured loop area
        let measured = polygon_area(&body.particles.positions, &body.collision_shape);
        assert_eq!(body.volume_constraints[1].rest_volume, measured);
    }
}

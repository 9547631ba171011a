//! Point-Mass Storage and Integration
//!
//! Structure-of-arrays particle storage for one soft body plus the two
//! integrator passes of the XPBD loop: semi-implicit Euler prediction and
//! the velocity update that re-derives velocity from corrected positions.
//!
//! An inverse mass of zero marks a fixed (immovable) particle; every
//! correction in the engine is scaled by inverse mass, so fixed particles
//! act as anchors without any special casing in the solvers.

use crate::math::{Fix128, Vec2Fix};

#[cfg(not(feature = "std"))]
use alloc::vec::Vec;

// ============================================================================
// ParticleSet
// ============================================================================

/// Structure-of-arrays point-mass storage.
///
/// All four sequences always have the same length; `push` is the only way
/// to grow the set, so the invariant holds by construction.
#[derive(Clone, Debug, Default)]
pub struct ParticleSet {
    /// Current positions
    pub positions: Vec<Vec2Fix>,
    /// Positions at the start of the current substep (set by [`Self::integrate`])
    pub prev_positions: Vec<Vec2Fix>,
    /// Velocities
    pub velocities: Vec<Vec2Fix>,
    /// Inverse masses; `0` marks a fixed particle
    pub inv_masses: Vec<Fix128>,
}

impl ParticleSet {
    /// Create an empty particle set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of particles.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.positions.len()
    }

    /// Returns `true` if the set holds no particles.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// Add a particle and return its index.
    ///
    /// `mass` is converted to inverse mass; a non-positive mass produces a
    /// fixed particle (inverse mass zero).
    pub fn push(&mut self, position: Vec2Fix, mass: Fix128) -> usize {
        let inv_mass = if mass > Fix128::ZERO {
            Fix128::ONE / mass
        } else {
            Fix128::ZERO
        };
        self.push_with_inv_mass(position, inv_mass)
    }

    /// Add a particle with an explicit inverse mass and return its index.
    pub fn push_with_inv_mass(&mut self, position: Vec2Fix, inv_mass: Fix128) -> usize {
        let idx = self.positions.len();
        self.positions.push(position);
        self.prev_positions.push(position);
        self.velocities.push(Vec2Fix::ZERO);
        self.inv_masses.push(inv_mass);
        idx
    }

    /// Returns `true` if particle `i` is fixed (inverse mass zero).
    #[inline]
    #[must_use]
    pub fn is_fixed(&self, i: usize) -> bool {
        self.inv_masses[i].is_zero()
    }

    /// Semi-implicit Euler prediction step.
    ///
    /// For every movable particle: accumulate gravity into the velocity,
    /// cache the position, and advance it. Fixed particles are untouched.
    pub fn integrate(&mut self, dt: Fix128, gravity: Vec2Fix) {
        for i in 0..self.positions.len() {
            if self.inv_masses[i].is_zero() {
                continue;
            }
            self.velocities[i] = self.velocities[i] + gravity * dt;
            self.prev_positions[i] = self.positions[i];
            self.positions[i] = self.positions[i] + self.velocities[i] * dt;
        }
    }

    /// Recover velocities from the constraint-corrected positions:
    /// `v = (x - x_prev) / dt`.
    ///
    /// This is what couples the position solve back into momentum for the
    /// next substep (and into friction).
    pub fn update_velocities(&mut self, dt: Fix128) {
        if dt.is_zero() {
            return;
        }
        let inv_dt = Fix128::ONE / dt;
        for i in 0..self.positions.len() {
            self.velocities[i] = (self.positions[i] - self.prev_positions[i]) * inv_dt;
        }
    }

    /// Unweighted centroid of all particle positions.
    #[must_use]
    pub fn geometry_center(&self) -> Vec2Fix {
        if self.positions.is_empty() {
            return Vec2Fix::ZERO;
        }
        let mut center = Vec2Fix::ZERO;
        for p in &self.positions {
            center = center + *p;
        }
        center / Fix128::from_int(self.positions.len() as i64)
    }

    /// Mass-weighted center of the particles.
    ///
    /// Fixed particles (inverse mass zero) carry no weight here; a set with
    /// zero total mass falls back to the unweighted centroid.
    #[must_use]
    pub fn mass_center(&self) -> Vec2Fix {
        let mut center = Vec2Fix::ZERO;
        let mut total_mass = Fix128::ZERO;

        for i in 0..self.positions.len() {
            let w = self.inv_masses[i];
            if w.is_zero() {
                continue;
            }
            let m = Fix128::ONE / w;
            center = center + self.positions[i] * m;
            total_mass = total_mass + m;
        }

        if total_mass.is_zero() {
            self.geometry_center()
        } else {
            center / total_mass
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

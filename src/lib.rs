//! # ALICE-SoftBody
//!
//! **Deterministic 2D Soft-Body Physics (XPBD)**
//!
//! A Rust library simulating 2D deformable bodies with Extended
//! Position-Based Dynamics: compliant distance, area, angle, shape-matching
//! and pin constraints over point masses, brute-force soft-soft collision
//! with static friction, and cross-body joints (distance and motor).
//!
//! ## Features
//!
//! | Feature | Description |
//! |---------|-------------|
//! | **Fix128 arithmetic** | Bit-exact I64F64 fixed point, identical results on every platform |
//! | **XPBD constraints** | One compliance parameter spans rigid to soft |
//! | **Soft-soft contacts** | Point-in-polygon parity detection, point-edge projection, static friction |
//! | **Joints** | Distance and motor joints across independently owned bodies |
//! | **Generational handles** | Removing a body silently disables joints that reference it |
//!
//! ## Design Principles
//!
//! - **Determinism**: no floating point in simulation paths, no randomized
//!   iteration order; identical inputs replay bit-identically
//! - **no_std Compatible**: the core needs only `alloc`
//! - **Validated Construction**: malformed indices are rejected when
//!   constraints are added, never discovered mid-solve
//!
//! ## Quick Start
//!
//! ```rust
//! use alice_softbody::prelude::*;
//!
//! let mut world = PhysicsWorld::new(PhysicsConfig::default());
//! world.gravity = Vec2Fix::new(Fix128::ZERO, Fix128::from_int(-10));
//!
//! // A soft octagon, 50 units across, falling under gravity
//! let body = soft_polygon(
//!     8,
//!     Fix128::from_int(25),
//!     Vec2Fix::from_int(0, 100),
//!     Fix128::ONE,
//!     Fix128::ZERO,
//!     Fix128::from_ratio(1, 100),
//! )
//! .unwrap();
//! let handle = world.add_body(body);
//!
//! let dt = Fix128::from_ratio(1, 60);
//! for _ in 0..60 {
//!     world.step(dt);
//! }
//!
//! assert!(world.body(handle).unwrap().particles.positions[0].y < Fix128::from_int(100));
//! ```

#![cfg_attr(not(feature = "std"), no_std)]

#[cfg(not(feature = "std"))]
extern crate alloc;

pub mod body;
pub mod collision;
pub mod constraint;
pub mod error;
pub mod joint;
pub mod math;
pub mod particle;
pub mod raycast;
pub mod shape_gen;
pub mod tick;
pub mod world;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::body::SoftBody;
    pub use crate::collision::ContactConstraint;
    pub use crate::constraint::{
        polygon_area, AccelerationConstraint, AngleConstraint, AngularAccelerationConstraint,
        AngularForceConstraint, AngularVelocityConstraint, DistanceConstraint, ForceConstraint,
        PinConstraint, ShapeMatchingConstraint, VelocityConstraint, VolumeConstraint,
    };
    pub use crate::error::PhysicsError;
    pub use crate::joint::{DistanceJoint, MotorJoint};
    pub use crate::math::{Fix128, Mat2Fix, Vec2Fix};
    pub use crate::particle::ParticleSet;
    pub use crate::raycast::{point_in_body, point_in_loop, RayHit};
    pub use crate::shape_gen::{soft_polygon, wheel, WheelParams};
    pub use crate::tick::TickSystem;
    pub use crate::world::{BodyArena, BodyHandle, PhysicsConfig, PhysicsWorld};
}

// Re-export main types at crate root
pub use prelude::*;

//! Physics Error Types
//!
//! Unified error type for the ALICE-SoftBody engine. Everything that can
//! fail does so at construction time (adding constraints, joints, or
//! configuration); the solver itself assumes validated input and recovers
//! from solve-time degeneracy by skipping, never by erroring.
//!
//! Author: Moroya Sakamoto

use core::fmt;

/// Unified error type for soft-body operations.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PhysicsError {
    /// A particle index is out of range for the body it was given to.
    InvalidParticleIndex {
        /// The invalid index that was provided
        index: usize,
        /// Number of particles in the body
        count: usize,
    },
    /// A constraint was constructed from degenerate input.
    InvalidConstraint {
        /// Human-readable description of the problem
        reason: &'static str,
    },
    /// Invalid configuration parameter.
    InvalidConfiguration {
        /// Description of the invalid configuration
        reason: &'static str,
    },
}

impl fmt::Display for PhysicsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidParticleIndex { index, count } => {
                write!(f, "particle index {index} out of range (count={count})")
            }
            Self::InvalidConstraint { reason } => {
                write!(f, "invalid constraint: {reason}")
            }
            Self::InvalidConfiguration { reason } => {
                write!(f, "invalid configuration: {reason}")
            }
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for PhysicsError {}

/*
 * Error Module
 *
 * This module defines the error type returned by the simulation API.
 * Errors are local to the call that produced them: an invalid parameter is
 * rejected at creation, an unknown handle leaves the world untouched, and
 * degenerate geometry inside a step is skipped rather than reported.
 */

use std::fmt;

// The kind of entity a handle refers to
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HandleKind {
    Particle,
    Constraint,
}

#[derive(Clone, Debug, PartialEq)]
pub enum SimError {
    InvalidParameter { name: &'static str, value: f32 },
    InvalidHandle(HandleKind),
    DegenerateGeometry,
}

pub type SimResult<T> = Result<T, SimError>;

impl fmt::Display for SimError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SimError::InvalidParameter { name, value } => {
                write!(f, "invalid value {} for parameter `{}`", value, name)
            }
            SimError::InvalidHandle(HandleKind::Particle) => {
                write!(f, "particle handle does not refer to a live particle")
            }
            SimError::InvalidHandle(HandleKind::Constraint) => {
                write!(f, "constraint handle does not refer to a live constraint")
            }
            SimError::DegenerateGeometry => {
                write!(f, "direction between coincident points is undefined")
            }
        }
    }
}

impl std::error::Error for SimError {}

// Reject values that are not strictly positive and finite
pub(crate) fn require_positive(name: &'static str, value: f32) -> SimResult<f32> {
    if value.is_finite() && value > 0.0 {
        Ok(value)
    } else {
        Err(SimError::InvalidParameter { name, value })
    }
}

pub(crate) fn require_unit_interval(name: &'static str, value: f32) -> SimResult<f32> {
    if (0.0..=1.0).contains(&value) {
        Ok(value)
    } else {
        Err(SimError::InvalidParameter { name, value })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn positive_values_pass_through() {
        assert_eq!(require_positive("mass", 2.0), Ok(2.0));
    }

    #[test]
    fn non_positive_and_nan_values_are_rejected() {
        assert!(require_positive("mass", 0.0).is_err());
        assert!(require_positive("mass", -1.0).is_err());
        assert!(require_positive("mass", f32::NAN).is_err());
        assert!(require_positive("mass", f32::INFINITY).is_err());
    }

    #[test]
    fn unit_interval_bounds_are_inclusive() {
        assert!(require_unit_interval("restitution", 0.0).is_ok());
        assert!(require_unit_interval("restitution", 1.0).is_ok());
        assert!(require_unit_interval("restitution", 1.5).is_err());
    }

    #[test]
    fn display_names_the_parameter() {
        let err = SimError::InvalidParameter { name: "timestep", value: 0.0 };
        assert_eq!(err.to_string(), "invalid value 0 for parameter `timestep`");
    }
}

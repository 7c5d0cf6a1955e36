//! Error Types for Tracker Construction
//!
//! ## Design Philosophy
//!
//! Waymark's error surface is deliberately small. All tracking decisions are
//! total — every tick produces an adopt-or-reject outcome — so the run-time
//! hot path has nothing to propagate. What can fail is construction: a
//! configuration carrying a non-positive pace or pixel scale, or a window
//! capacity that does not fit under the compile-time slot bound. Those are
//! programming or deployment errors, reported once and never retried.
//!
//! Error values follow the same constraints as the rest of the engine:
//!
//! 1. **Small Size**: variants carry at most a parameter name and the
//!    offending value (12-16 bytes).
//! 2. **No Heap Allocation**: parameter names are `&'static str`; no
//!    `String` anywhere.
//! 3. **Copy Semantics**: errors implement `Copy` so they can be returned
//!    and matched without move gymnastics.

use thiserror_no_std::Error;

/// Result type for fallible construction paths
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Configuration rejected at construction - fatal, not retried
#[derive(Error, Debug, Clone, Copy, PartialEq)]
pub enum ConfigError {
    /// A parameter that must be strictly positive was zero or negative
    #[error("{parameter} must be positive, got {value}")]
    NotPositive {
        /// Name of the offending configuration field
        parameter: &'static str,
        /// The rejected value
        value: f32,
    },

    /// A parameter that must not be negative was negative
    #[error("{parameter} must not be negative, got {value}")]
    Negative {
        /// Name of the offending configuration field
        parameter: &'static str,
        /// The rejected value
        value: f32,
    },

    /// A window capacity was zero or exceeded the compile-time slot bound
    #[error("{parameter} capacity {requested} outside 1..={max}")]
    WindowCapacity {
        /// Name of the offending configuration field
        parameter: &'static str,
        /// Requested slot count
        requested: usize,
        /// Compile-time upper bound
        max: usize,
    },

    /// The stationary thresholds are inconsistent with each other
    #[error("min_stationary_obs {min} must be below max_stationary_obs {max}")]
    StationaryBounds {
        /// Configured minimum stationary observation count
        min: usize,
        /// Configured long-window capacity
        max: usize,
    },
}

#[cfg(feature = "defmt")]
impl defmt::Format for ConfigError {
    fn format(&self, fmt: defmt::Formatter) {
        match self {
            Self::NotPositive { parameter, value } =>
                defmt::write!(fmt, "{} must be positive, got {}", parameter, value),
            Self::Negative { parameter, value } =>
                defmt::write!(fmt, "{} must not be negative, got {}", parameter, value),
            Self::WindowCapacity { parameter, requested, max } =>
                defmt::write!(fmt, "{} capacity {} outside 1..={}", parameter, requested, max),
            Self::StationaryBounds { min, max } =>
                defmt::write!(fmt, "min_stationary_obs {} must be below max_stationary_obs {}", min, max),
        }
    }
}

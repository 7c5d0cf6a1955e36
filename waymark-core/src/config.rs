//! Tracker Configuration
//!
//! All site- and deployment-specific tuning in one validated struct. The
//! defaults are the values the engine was tuned with on real floor plans;
//! only `px_per_meter` truly has no sensible default because it depends on
//! the map raster, so construction requires it explicitly.
//!
//! Validation happens once, at construction of the tracker: a non-positive
//! pace, cadence, or pixel scale is a deployment error, not a run-time
//! condition, and is rejected with a [`ConfigError`] before any tracking
//! starts.

use crate::constants::*;
use crate::errors::{ConfigError, ConfigResult};

/// Tuning parameters for the position tracker and scan loop
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TrackerConfig {
    /// Tick period of the scan loop (ms)
    pub cadence_ms: u64,
    /// Map scale: pixels per meter of floor plan
    pub px_per_meter: f32,
    /// Assumed walking pace (m/s) for travel-time gating and cursor speed
    pub walking_pace_mps: f32,
    /// Distance allowed to move in zero elapsed time (m)
    pub error_accommodation_m: f32,
    /// Capacity of the short window used while moving
    pub short_window: usize,
    /// Slot count the long window must exceed to count as stationary
    pub min_stationary_obs: usize,
    /// Capacity of the long window used while stationary
    pub max_stationary_obs: usize,
    /// Whether an improved score at the current location refreshes the fix
    pub allow_same_position_update: bool,
    /// Margin a new location must beat the current score by during the
    /// sticky period
    pub sticky_min_improvement: f32,
    /// Duration of the sticky period after a position update (ms)
    pub sticky_max_time_ms: u64,
}

impl TrackerConfig {
    /// Create a configuration with stock tuning for the given map scale.
    pub fn new(px_per_meter: f32) -> Self {
        Self {
            cadence_ms: DEFAULT_CADENCE_MS,
            px_per_meter,
            walking_pace_mps: DEFAULT_WALKING_PACE_MPS,
            error_accommodation_m: DEFAULT_ERROR_ACCOMMODATION_M,
            short_window: DEFAULT_SHORT_WINDOW,
            min_stationary_obs: DEFAULT_MIN_STATIONARY_OBS,
            max_stationary_obs: DEFAULT_MAX_STATIONARY_OBS,
            allow_same_position_update: false,
            sticky_min_improvement: DEFAULT_STICKY_MIN_IMPROVEMENT,
            sticky_max_time_ms: DEFAULT_STICKY_MAX_TIME_MS,
        }
    }

    /// Check every parameter against its constraint.
    ///
    /// Called by the tracker and runner constructors; exposed so a config
    /// loaded from a file can be checked before deployment.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.cadence_ms == 0 {
            return Err(ConfigError::NotPositive {
                parameter: "cadence_ms",
                value: 0.0,
            });
        }
        Self::require_positive("px_per_meter", self.px_per_meter)?;
        Self::require_positive("walking_pace_mps", self.walking_pace_mps)?;
        if self.error_accommodation_m < 0.0 {
            return Err(ConfigError::Negative {
                parameter: "error_accommodation_m",
                value: self.error_accommodation_m,
            });
        }
        if self.sticky_min_improvement < 0.0 {
            return Err(ConfigError::Negative {
                parameter: "sticky_min_improvement",
                value: self.sticky_min_improvement,
            });
        }
        Self::require_capacity("short_window", self.short_window)?;
        Self::require_capacity("max_stationary_obs", self.max_stationary_obs)?;
        if self.min_stationary_obs == 0 || self.min_stationary_obs >= self.max_stationary_obs {
            return Err(ConfigError::StationaryBounds {
                min: self.min_stationary_obs,
                max: self.max_stationary_obs,
            });
        }
        Ok(())
    }

    /// Pixels the cursor may travel per tick at the configured pace.
    pub fn px_per_tick(&self) -> f32 {
        self.walking_pace_mps * self.px_per_meter * self.cadence_ms as f32 / 1000.0
    }

    fn require_positive(parameter: &'static str, value: f32) -> ConfigResult<()> {
        if value > 0.0 {
            Ok(())
        } else {
            Err(ConfigError::NotPositive { parameter, value })
        }
    }

    fn require_capacity(parameter: &'static str, requested: usize) -> ConfigResult<()> {
        if requested == 0 || requested > MAX_WINDOW_SLOTS {
            Err(ConfigError::WindowCapacity {
                parameter,
                requested,
                max: MAX_WINDOW_SLOTS,
            })
        } else {
            Ok(())
        }
    }
}

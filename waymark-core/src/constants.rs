//! Physical Constants and Engine Tuning Parameters
//!
//! This module defines the physical constants and fixed tuning values used
//! by the tracking engine. Site-dependent values (pixel scale, window
//! lengths, sticky thresholds) live in [`TrackerConfig`](crate::config::TrackerConfig)
//! instead; everything here is either physics or a deliberate, fixed design
//! constant of the algorithms.

// ===== PHYSICAL CONSTANTS =====

/// Standard gravity (m/s²).
///
/// Seeds the motion gate's magnitude history so a device at rest produces a
/// near-zero first delta instead of a spurious "moved" event on startup.
///
/// Source: ISO 80000-3
pub const STANDARD_GRAVITY_MPS2: f32 = 9.80665;

// ===== MOTION GATE =====

/// Pole of the motion gate's single-pole IIR high-pass filter.
///
/// Each accelerometer delta decays by this factor per sample:
/// `accel = accel * MOTION_FILTER_POLE + delta`. A pole of 0.9 makes the
/// accumulator forget a transient within roughly 20 samples while still
/// summing sustained movement above the trigger threshold.
pub const MOTION_FILTER_POLE: f32 = 0.9;

/// Filtered-acceleration level above which the device counts as moved.
///
/// Crossing this threshold raises the one-shot reset flag that clears the
/// stationary observation window.
pub const MOTION_RESET_THRESHOLD: f32 = 0.5;

// ===== SCAN COMPARISON =====

/// Per-beacon signal tolerance when comparing consecutive scans.
///
/// Two scans whose strengths differ by no more than this for every beacon
/// are treated as the same scan (the radio layer repeated its last result),
/// and the windows are not fed.
pub const SCAN_CHANGE_EPSILON: f32 = 1e-9;

// ===== CAPACITY BOUNDS =====

/// Upper bound on snapshot slots in a reading window.
///
/// The configured window capacities must fit under this compile-time bound.
/// 32 slots at the default 100 ms cadence covers a 3.2 s stationary window,
/// comfortably above the stock `max_stationary_obs` of 20.
pub const MAX_WINDOW_SLOTS: usize = 32;

/// Maximum beacons stored per scan snapshot.
///
/// Indoor scans rarely see more than ~30 distinct transmitters; readings
/// beyond this bound are dropped with a warning. Power of two for the
/// index-map hasher.
pub const MAX_SCAN_BEACONS: usize = 32;

/// Maximum distinct beacons tracked across one window summary.
///
/// Bounds the union of beacon ids over all slots of a window. Power of two
/// for the index-map hasher.
pub const MAX_TRACKED_BEACONS: usize = 64;

/// Maximum entries in a per-level score board.
pub const MAX_SCORE_LINES: usize = 16;

/// Maximum length of one score-board display line.
pub const MAX_SCORE_LINE: usize = 48;

// ===== DEFAULT TRACKING PARAMETERS =====

/// Default tick period of the scan loop (ms).
pub const DEFAULT_CADENCE_MS: u64 = 100;

/// Default walking pace (m/s). Brisk indoor walk, about 7.2 km/h.
pub const DEFAULT_WALKING_PACE_MPS: f32 = 2.0;

/// Default distance the tracker may jump in zero elapsed time (m).
///
/// Absorbs fingerprint-grid spacing and scan latency when gating adoption
/// on travel time.
pub const DEFAULT_ERROR_ACCOMMODATION_M: f32 = 20.0;

/// Default capacity of the short ("moving") observation window.
pub const DEFAULT_SHORT_WINDOW: usize = 3;

/// Default slot count the long window must exceed to count as stationary.
pub const DEFAULT_MIN_STATIONARY_OBS: usize = 5;

/// Default capacity of the long ("stationary") observation window.
pub const DEFAULT_MAX_STATIONARY_OBS: usize = 20;

/// Default score margin a new location must beat the current one by while
/// the sticky period is active.
pub const DEFAULT_STICKY_MIN_IMPROVEMENT: f32 = 5.0;

/// Default duration of the sticky period after a position update (ms).
pub const DEFAULT_STICKY_MAX_TIME_MS: u64 = 3000;

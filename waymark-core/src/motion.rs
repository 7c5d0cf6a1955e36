//! Motion Gate: Accelerometer-Driven Window Reset
//!
//! ## Overview
//!
//! The long observation window assumes the device is standing still; its
//! statistics are only trustworthy while that holds. This module watches
//! the accelerometer stream for the moment the device starts moving and
//! raises a one-shot flag telling the tracker to discard the stationary
//! window before the next snapshot.
//!
//! ## Filter
//!
//! Per raw sample `(x, y, z)`:
//!
//! ```text
//! m     = sqrt(x² + y² + z²)
//! delta = m - previous_m
//! accel = accel * 0.9 + delta        (single-pole IIR)
//! ```
//!
//! The decaying accumulator behaves as a high-pass filter: a constant
//! gravity vector contributes nothing, while a burst of movement drives
//! `accel` past the 0.5 threshold. The magnitude history is seeded with
//! standard gravity so the very first sample of a resting device does not
//! register as motion.
//!
//! ## One-Shot Handoff
//!
//! The gate runs on the sensor callback thread; the tracker runs on the
//! scan worker. The only shared state is a [`ResetFlag`] - a single atomic
//! boolean. The producer side is idempotent (`raise` while already raised
//! changes nothing) and the consumer side is a `swap(false)`, so a raised
//! flag is observed exactly once no matter how the two threads interleave.
//! A plain shared boolean would lose an update when a raise lands between
//! the consumer's read and clear; the swap closes that window.

use core::sync::atomic::{AtomicBool, Ordering};

use crate::constants::{MOTION_FILTER_POLE, MOTION_RESET_THRESHOLD, STANDARD_GRAVITY_MPS2};

/// One-shot "device moved" flag shared between the sensor producer and the
/// scan worker.
#[derive(Debug, Default)]
pub struct ResetFlag {
    pending: AtomicBool,
}

impl ResetFlag {
    /// Create a lowered flag. Const so the flag can live in a static.
    pub const fn new() -> Self {
        Self {
            pending: AtomicBool::new(false),
        }
    }

    /// Raise the flag. Idempotent.
    pub fn raise(&self) {
        self.pending.store(true, Ordering::Release);
    }

    /// Atomically read and clear the flag.
    ///
    /// Returns true at most once per raise; the consumer calls this exactly
    /// once at the top of each aggregation cycle.
    pub fn take(&self) -> bool {
        self.pending.swap(false, Ordering::AcqRel)
    }

    /// Peek without consuming. Test and diagnostics only.
    pub fn is_raised(&self) -> bool {
        self.pending.load(Ordering::Acquire)
    }
}

/// Decaying high-pass filter over accelerometer magnitudes.
///
/// Owned by the sensor callback; feeds a shared [`ResetFlag`]. The filter
/// state itself is single-threaded - only the flag crosses threads.
#[derive(Debug)]
pub struct MotionGate<'a> {
    accel: f32,
    last_magnitude: f32,
    flag: &'a ResetFlag,
}

impl<'a> MotionGate<'a> {
    /// Create a gate feeding the given flag.
    pub fn new(flag: &'a ResetFlag) -> Self {
        Self {
            accel: 0.0,
            last_magnitude: STANDARD_GRAVITY_MPS2,
            flag,
        }
    }

    /// Feed one raw accelerometer sample (m/s² per axis).
    ///
    /// Raises the reset flag when the filtered acceleration crosses the
    /// motion threshold. Safe to call at any sensor rate.
    pub fn sample(&mut self, x: f32, y: f32, z: f32) {
        let magnitude = libm::sqrtf(x * x + y * y + z * z);
        let delta = magnitude - self.last_magnitude;
        self.last_magnitude = magnitude;
        self.accel = self.accel * MOTION_FILTER_POLE + delta;

        if self.accel > MOTION_RESET_THRESHOLD {
            self.flag.raise();
        }
    }

    /// Current filtered acceleration. Diagnostics only.
    pub fn level(&self) -> f32 {
        self.accel
    }
}

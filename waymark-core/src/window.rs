//! Sliding Observation Window over Beacon Scans
//!
//! ## Overview
//!
//! A [`ReadingWindow`] is a fixed-capacity ring of timestamped scan
//! snapshots. The tracker keeps two of them - a short window that reacts
//! quickly while the device moves, and a long window that accumulates
//! samples while it is stationary - and asks each for a statistical
//! summary of what the radio environment looked like over its span.
//!
//! ## Why a Ring of Snapshots?
//!
//! Fingerprint scoring needs more than the latest scan:
//! - presence fraction (how often a beacon was seen) separates a wall-washed
//!   reflection from a genuinely nearby transmitter;
//! - mean strength over several scans suppresses single-scan fading;
//! - the standard deviation feeds the scorer's noise model.
//!
//! A ring with FIFO eviction keeps exactly the most recent `capacity`
//! snapshots in chronological order with no heap allocation: the slot bound
//! is a compile-time constant and the backing store is a `heapless::Deque`.
//! The capacity itself is runtime configuration (the short and long windows
//! differ only in it), validated once at construction against the
//! compile-time bound.
//!
//! ## Summary Statistics
//!
//! For a beacon observed in `k` of `n` slots with strengths `v_1..v_k`:
//!
//! ```text
//! presence = k / n
//! mean     = (v_1 + .. + v_k) / k
//! std_dev  = sqrt(sum((v_i - mean)^2) / k)     (population form)
//! ```
//!
//! The population standard deviation (divide by `k`, not `k - 1`) is a
//! deliberate choice: it stays defined for a beacon seen exactly once,
//! where it is 0. Aggregation runs on count/sum/sum-of-squares
//! accumulators, so a summary is one pass over the window with O(1) state
//! per beacon. Beacons never observed in the window are absent from the
//! summary - never implicitly zero.

use heapless::{Deque, FnvIndexMap};

use crate::constants::{MAX_SCAN_BEACONS, MAX_TRACKED_BEACONS, MAX_WINDOW_SLOTS};
use crate::errors::{ConfigError, ConfigResult};
use crate::time::Timestamp;

/// Stable beacon identifier (hashed transmitter address)
pub type BeaconId = u32;

/// One tick's visible beacons and their signal strengths.
///
/// An empty map means no beacons were visible - a valid observation, not an
/// error.
pub type ScanReadings = FnvIndexMap<BeaconId, f32, MAX_SCAN_BEACONS>;

/// A single scan observation: when it happened and what was heard
#[derive(Debug, Clone, Default)]
pub struct ScanSnapshot {
    /// Milliseconds since tracking started
    pub offset_ms: Timestamp,
    /// Beacon strengths captured this tick
    pub readings: ScanReadings,
}

impl ScanSnapshot {
    fn new(offset_ms: Timestamp) -> Self {
        Self {
            offset_ms,
            readings: ScanReadings::new(),
        }
    }
}

/// Per-beacon statistics over one window
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BeaconStats {
    /// Fraction of window slots in which the beacon was observed, in [0, 1]
    pub presence: f32,
    /// Mean signal strength over the slots that saw the beacon
    pub mean: f32,
    /// Population standard deviation of those strengths
    pub std_dev: f32,
}

/// Statistical summary of a window's contents, keyed by beacon
#[derive(Debug, Clone, Default)]
pub struct ObservationSummary {
    stats: FnvIndexMap<BeaconId, BeaconStats, MAX_TRACKED_BEACONS>,
    samples: usize,
}

impl ObservationSummary {
    /// Number of snapshots the summary was computed over
    pub fn samples(&self) -> usize {
        self.samples
    }

    /// Statistics for one beacon, if it was observed in the window
    pub fn get(&self, beacon: BeaconId) -> Option<&BeaconStats> {
        self.stats.get(&beacon)
    }

    /// Number of distinct beacons observed
    pub fn len(&self) -> usize {
        self.stats.len()
    }

    /// True when no beacon was observed (or the window was empty)
    pub fn is_empty(&self) -> bool {
        self.stats.is_empty()
    }

    /// Iterate over `(beacon, stats)` pairs
    pub fn iter(&self) -> impl Iterator<Item = (&BeaconId, &BeaconStats)> {
        self.stats.iter()
    }
}

/// Running accumulator for one beacon while summarizing
#[derive(Clone, Copy, Default)]
struct Accumulator {
    count: u32,
    sum: f32,
    sum_sq: f32,
}

/// Fixed-capacity ring of scan snapshots with FIFO eviction
///
/// ## Invariants
///
/// - `len() <= capacity <= N` at all times
/// - snapshots iterate oldest to newest
/// - `record` only ever touches the most recently pushed slot
///
/// ## Thread Safety
///
/// Not thread-safe; owned exclusively by the tracker, which is driven by a
/// single worker.
#[derive(Debug, Clone)]
pub struct ReadingWindow<const N: usize = MAX_WINDOW_SLOTS> {
    slots: Deque<ScanSnapshot, N>,
    capacity: usize,
}

impl<const N: usize> ReadingWindow<N> {
    /// Create a window holding at most `capacity` snapshots.
    ///
    /// Fails when the capacity is zero or exceeds the compile-time slot
    /// bound `N`.
    pub fn new(capacity: usize) -> ConfigResult<Self> {
        if capacity == 0 || capacity > N {
            return Err(ConfigError::WindowCapacity {
                parameter: "window",
                requested: capacity,
                max: N,
            });
        }
        Ok(Self {
            slots: Deque::new(),
            capacity,
        })
    }

    /// Number of snapshots currently held
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// True when no snapshot has been pushed since the last clear
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Configured snapshot capacity
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Append a new empty snapshot slot, evicting the oldest when full.
    pub fn push(&mut self, offset_ms: Timestamp) {
        if self.slots.len() == self.capacity {
            self.slots.pop_front();
        }
        // Cannot fail: capacity <= N and we just made room
        let _ = self.slots.push_back(ScanSnapshot::new(offset_ms));
    }

    /// Add a reading to the most recently pushed slot.
    ///
    /// Returns whether the reading was stored. A call before any `push` is
    /// a no-op, as is a beacon beyond the per-snapshot table bound; both
    /// are logged and dropped rather than treated as errors.
    pub fn record(&mut self, beacon: BeaconId, strength: f32) -> bool {
        match self.slots.back_mut() {
            Some(slot) => {
                let stored = slot.readings.insert(beacon, strength).is_ok();
                if !stored {
                    log_warn!("beacon table full, dropping reading for {}", beacon);
                }
                stored
            }
            None => {
                log_warn!("record before first push, dropping reading for {}", beacon);
                false
            }
        }
    }

    /// Empty the window. Used when the motion gate reports the device moved.
    pub fn clear(&mut self) {
        self.slots.clear();
    }

    /// Aggregate all slots into per-beacon statistics.
    ///
    /// An empty window yields an empty summary.
    pub fn summarize(&self) -> ObservationSummary {
        let n = self.slots.len();
        if n == 0 {
            return ObservationSummary::default();
        }

        let mut accums: FnvIndexMap<BeaconId, Accumulator, MAX_TRACKED_BEACONS> =
            FnvIndexMap::new();
        for slot in self.slots.iter() {
            for (&beacon, &strength) in slot.readings.iter() {
                match accums.get_mut(&beacon) {
                    Some(acc) => {
                        acc.count += 1;
                        acc.sum += strength;
                        acc.sum_sq += strength * strength;
                    }
                    None => {
                        let acc = Accumulator {
                            count: 1,
                            sum: strength,
                            sum_sq: strength * strength,
                        };
                        if accums.insert(beacon, acc).is_err() {
                            log_warn!("summary table full, skipping beacon {}", beacon);
                        }
                    }
                }
            }
        }

        let mut summary = ObservationSummary {
            stats: FnvIndexMap::new(),
            samples: n,
        };
        for (&beacon, acc) in accums.iter() {
            let k = acc.count as f32;
            let mean = acc.sum / k;
            // Population variance from running sums; clamp the tiny
            // negative values float cancellation can produce
            let variance = (acc.sum_sq / k - mean * mean).max(0.0);
            let stats = BeaconStats {
                presence: acc.count as f32 / n as f32,
                mean,
                std_dev: libm::sqrtf(variance),
            };
            // Same bound as the accumulator table, cannot fail
            let _ = summary.stats.insert(beacon, stats);
        }
        summary
    }
}

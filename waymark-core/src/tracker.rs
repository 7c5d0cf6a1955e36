//! Best-Fit Decision State Machine
//!
//! ## Overview
//!
//! The [`PositionTracker`] owns the two observation windows and the current
//! best-fit location, and decides once per aggregation cycle whether the
//! freshly scored fingerprints justify moving the reported position. The
//! scorer proposes; this module disposes.
//!
//! ## Window Selection
//!
//! The long window only survives while the device stands still (the motion
//! gate clears it on movement), so its length is itself the movement
//! signal: once it holds more than `min_stationary_obs` snapshots the
//! device is presumed stationary and the long window's lower-variance
//! statistics are trusted. Otherwise the short window answers for a device
//! on the move.
//!
//! ## Adoption Rules
//!
//! Evaluated in order, first match wins:
//!
//! 1. **No prior fix** - adopt unconditionally; any position beats none.
//! 2. **Same fingerprint as current** - adopt only when the score strictly
//!    improved and same-position updates are enabled. Without the gate,
//!    float noise would re-anchor the fix every tick and the sticky dwell
//!    clock below would never run out.
//! 3. **Sticky window** - a different fingerprint that fails to beat the
//!    current score by `sticky_min_improvement` while the dwell time is
//!    within `sticky_max_time_ms` is rejected. Suppresses flip-flopping
//!    between two locations with near-equal scores.
//! 4. **Travel-time gate** - otherwise, the jump must be physically
//!    plausible: walking the pixel distance (same-level Euclidean, or
//!    routed through the nearest inter-level connector when the candidate
//!    is on another floor), minus the error allowance, must take less time
//!    than has elapsed since the current fix was adopted.
//!
//! Every branch is total: each tick ends in adopt or reject, never an
//! error.

use crate::config::TrackerConfig;
use crate::constants::MAX_WINDOW_SLOTS;
use crate::errors::ConfigResult;
use crate::motion::ResetFlag;
use crate::time::Timestamp;
use crate::traits::{Fingerprint, FingerprintScorer, LevelId, MovementState, TopologyService};
use crate::window::{ReadingWindow, ScanReadings};

/// The currently adopted best-fit location
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Fix {
    /// Index into the scorer's fingerprint slice
    pub index: usize,
    /// Map x position in pixels
    pub x: f32,
    /// Map y position in pixels
    pub y: f32,
    /// Floor level of the fix
    pub level: LevelId,
    /// Score the fingerprint carried when the fix was adopted
    pub score: f32,
    /// Tick offset at which the fix was adopted
    pub time_ms: Timestamp,
}

/// Outcome of one decision tick
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Decision {
    /// Which window answered this tick
    pub status: MovementState,
    /// Whether a new fix was adopted
    pub adopted: bool,
    /// Set when adoption changed the floor level (including the first fix);
    /// the display should switch plans and the cursor must snap
    pub level_changed: Option<LevelId>,
}

/// Decision engine: two observation windows plus the sticky best-fit state
pub struct PositionTracker<'a> {
    config: TrackerConfig,
    short_window: ReadingWindow<MAX_WINDOW_SLOTS>,
    long_window: ReadingWindow<MAX_WINDOW_SLOTS>,
    reset: Option<&'a ResetFlag>,
    best: Option<Fix>,
    nearest_connection: usize,
}

impl<'a> PositionTracker<'a> {
    /// Build a tracker from a validated configuration.
    ///
    /// `reset` is the motion gate's one-shot flag; pass `None` when no
    /// accelerometer is available (the long window then only resets on
    /// capacity eviction).
    pub fn new(config: TrackerConfig, reset: Option<&'a ResetFlag>) -> ConfigResult<Self> {
        config.validate()?;
        Ok(Self {
            short_window: ReadingWindow::new(config.short_window)?,
            long_window: ReadingWindow::new(config.max_stationary_obs)?,
            config,
            reset,
            best: None,
            nearest_connection: 0,
        })
    }

    /// The adopted fix, if any
    pub fn best_fix(&self) -> Option<&Fix> {
        self.best.as_ref()
    }

    /// Level of the adopted fix, if any
    pub fn best_level(&self) -> Option<LevelId> {
        self.best.map(|fix| fix.level)
    }

    /// Connection index cached for cross-level distance estimates
    pub fn nearest_connection(&self) -> usize {
        self.nearest_connection
    }

    /// Snapshot counts of the two windows, short first. Diagnostics only.
    pub fn window_lengths(&self) -> (usize, usize) {
        (self.short_window.len(), self.long_window.len())
    }

    /// Feed one fresh scan into both windows.
    ///
    /// Consumes the motion-reset flag first: when the device moved since
    /// the previous cycle, the stationary window's statistics are stale and
    /// are discarded before this snapshot is recorded. The short window is
    /// never cleared by motion.
    pub fn ingest(&mut self, now: Timestamp, readings: &ScanReadings) {
        if let Some(flag) = self.reset {
            if flag.take() {
                log_debug!("motion reset: clearing stationary window at {} ms", now);
                self.long_window.clear();
            }
        }
        self.short_window.push(now);
        self.long_window.push(now);
        for (&beacon, &strength) in readings.iter() {
            self.short_window.record(beacon, strength);
            self.long_window.record(beacon, strength);
        }
    }

    /// Run one decision cycle against freshly ingested windows.
    pub fn decide<S, T>(&mut self, scorer: &mut S, topology: &T, now: Timestamp) -> Decision
    where
        S: FingerprintScorer,
        T: TopologyService,
    {
        let status = if self.long_window.len() > self.config.min_stationary_obs {
            MovementState::Stationary
        } else {
            MovementState::Moving
        };
        let summary = match status {
            MovementState::Stationary => self.long_window.summarize(),
            MovementState::Moving => self.short_window.summarize(),
        };

        scorer.update_scores(&summary);
        let prints = scorer.fingerprints();

        let Some(candidate_index) = Self::argmax(prints) else {
            return Decision {
                status,
                adopted: false,
                level_changed: None,
            };
        };
        let candidate = prints[candidate_index];

        if self.should_adopt(prints, candidate_index, topology, now) {
            let level_changed = match self.best {
                Some(fix) if fix.level == candidate.level => None,
                _ => Some(candidate.level),
            };
            self.best = Some(Fix {
                index: candidate_index,
                x: candidate.x,
                y: candidate.y,
                level: candidate.level,
                score: candidate.score,
                time_ms: now,
            });
            self.nearest_connection =
                topology.nearest_connection_index(candidate.level, candidate.x, candidate.y);
            log_debug!(
                "adopted fingerprint {} (score {}) at {} ms",
                candidate.id,
                candidate.score,
                now
            );
            Decision {
                status,
                adopted: true,
                level_changed,
            }
        } else {
            Decision {
                status,
                adopted: false,
                level_changed: None,
            }
        }
    }

    /// Highest-scoring fingerprint; strictly-greater comparison so the
    /// first maximum encountered (lowest id by the trait's ordering
    /// contract) wins ties.
    fn argmax(prints: &[Fingerprint]) -> Option<usize> {
        let mut best: Option<(usize, f32)> = None;
        for (i, print) in prints.iter().enumerate() {
            match best {
                Some((_, score)) if print.score <= score => {}
                _ => best = Some((i, print.score)),
            }
        }
        best.map(|(i, _)| i)
    }

    fn should_adopt<T: TopologyService>(
        &self,
        prints: &[Fingerprint],
        candidate_index: usize,
        topology: &T,
        now: Timestamp,
    ) -> bool {
        let candidate = prints[candidate_index];

        // No prior fix: always adopt
        let Some(fix) = self.best else {
            return true;
        };
        // A fix whose fingerprint the scorer no longer exposes cannot
        // anchor anything; treat like a first fix
        let Some(current) = prints.get(fix.index) else {
            return true;
        };

        // Same place: only a score above the one recorded at adoption may
        // refresh the fix, and only when configured to. Comparing against
        // the stored score matters: the live score of the current
        // fingerprint IS the candidate score here.
        if fix.index == candidate_index {
            return candidate.score > fix.score && self.config.allow_same_position_update;
        }

        // Sticky period: a new place must beat the old by a margin while
        // the dwell time is short
        let dwell_ms = now.saturating_sub(fix.time_ms);
        if candidate.score < current.score + self.config.sticky_min_improvement
            && dwell_ms <= self.config.sticky_max_time_ms
        {
            log_debug!(
                "sticky reject: {} vs {} after {} ms",
                candidate.score,
                current.score,
                dwell_ms
            );
            return false;
        }

        // Travel-time gate: could we have walked there since the fix?
        let dist_px = self.distance_px(&fix, &candidate, topology);
        let time_to_there_ms = ((dist_px / self.config.px_per_meter)
            - self.config.error_accommodation_m)
            / self.config.walking_pace_mps
            * 1000.0;
        let plausible = time_to_there_ms < dwell_ms as f32;
        log_debug!(
            "travel gate: {} px, need {} ms, have {} ms -> {}",
            dist_px,
            time_to_there_ms,
            dwell_ms,
            plausible
        );
        plausible
    }

    /// Pixel distance from the current fix to the candidate.
    ///
    /// Across levels the path must route through a connection point: fix to
    /// the cached nearest connector on its level, then the same connector
    /// index on the candidate's level to the candidate.
    fn distance_px<T: TopologyService>(
        &self,
        fix: &Fix,
        candidate: &Fingerprint,
        topology: &T,
    ) -> f32 {
        if candidate.level == fix.level {
            let dx = candidate.x - fix.x;
            let dy = candidate.y - fix.y;
            libm::sqrtf(dx * dx + dy * dy)
        } else {
            let index = self.nearest_connection;
            let dx0 = topology.connector_x(index, fix.level) - fix.x;
            let dy0 = topology.connector_y(index, fix.level) - fix.y;
            let dx1 = topology.connector_x(index, candidate.level) - candidate.x;
            let dy1 = topology.connector_y(index, candidate.level) - candidate.y;
            libm::sqrtf(dx0 * dx0 + dy0 * dy0) + libm::sqrtf(dx1 * dx1 + dy1 * dy1)
        }
    }
}

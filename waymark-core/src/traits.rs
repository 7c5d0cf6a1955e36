//! Collaborator Seams for the Tracking Engine
//!
//! ## Overview
//!
//! The engine deliberately does not scan radios, store fingerprints, know
//! the building topology, or draw anything. Each of those concerns is a
//! trait the host injects at construction, keeping the core portable and
//! every collaborator replaceable by a scripted fake in tests.
//!
//! ## Design Principles
//!
//! - **Pluggable components**: swap a live radio for a replayed recording
//!   without touching the tracker.
//! - **Static dispatch**: the tracker and locator are generic over their
//!   collaborators; no trait objects in the tick path.
//! - **Synchronous read paths**: the scorer and topology service are plain
//!   reentrant calls invoked only from the worker; the presentation sink is
//!   fire-and-forget.

use heapless::{String, Vec};

use crate::constants::{MAX_SCORE_LINE, MAX_SCORE_LINES};
use crate::time::Timestamp;
use crate::window::{ObservationSummary, ScanReadings};

/// Floor level identifier
pub type LevelId = i32;

/// One display line of a per-level score board
pub type ScoreLine = String<MAX_SCORE_LINE>;

/// Per-level display strings produced by the scorer
pub type ScoreBoard = Vec<ScoreLine, MAX_SCORE_LINES>;

/// Whether the engine currently trusts the short or the long window
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MovementState {
    /// Short window active: the device moved recently
    Moving,
    /// Long window active: enough samples accumulated since the last move
    Stationary,
}

impl MovementState {
    /// Human-readable label for status displays
    pub const fn label(&self) -> &'static str {
        match self {
            MovementState::Moving => "Moving",
            MovementState::Stationary => "Stationary",
        }
    }
}

/// A recorded location and its current match score.
///
/// Owned by the scorer; the tracker only ever reads these. `score` is
/// recomputed by [`FingerprintScorer::update_scores`] each decision tick.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Fingerprint {
    /// Stable fingerprint identifier
    pub id: u32,
    /// Map x position in pixels
    pub x: f32,
    /// Map y position in pixels
    pub y: f32,
    /// Floor level of the recording
    pub level: LevelId,
    /// Match score against the latest observation summary (higher is better)
    pub score: f32,
}

/// Supplies one beacon scan per tick.
///
/// Must be safe to poll at the loop cadence and returns an empty map -
/// never an error - when no beacons are visible. Malformed entries are this
/// collaborator's problem; the engine assumes well-typed input.
pub trait SignalSource {
    /// Capture the beacons visible at `offset_ms`
    fn scan(&mut self, offset_ms: Timestamp) -> ScanReadings;
}

/// Scores observation summaries against the known fingerprints.
pub trait FingerprintScorer {
    /// Recompute every fingerprint's score from the given summary
    fn update_scores(&mut self, summary: &ObservationSummary);

    /// The known fingerprints in a stable order.
    ///
    /// The tracker breaks score ties by taking the first maximum it
    /// encounters, so implementations must keep this order fixed across
    /// calls; the convention is ascending id.
    fn fingerprints(&self) -> &[Fingerprint];

    /// Display strings for the fingerprints on one level
    fn scores_for_level(&self, level: LevelId) -> ScoreBoard;
}

/// Looks up inter-level connection points (stairs, elevators).
pub trait TopologyService {
    /// Index of the connection point nearest to `(x, y)` on `level`
    fn nearest_connection_index(&self, level: LevelId, x: f32, y: f32) -> usize;

    /// X pixel position of connection `index` on `level`
    fn connector_x(&self, index: usize, level: LevelId) -> f32;

    /// Y pixel position of connection `index` on `level`
    fn connector_y(&self, index: usize, level: LevelId) -> f32;
}

/// Receives engine output. All methods are fire-and-forget notifications;
/// the engine never waits for acknowledgement, and calls arrive in
/// production order from the single worker.
pub trait PresentationSink {
    /// The movement state used for this decision tick
    fn on_movement_status(&mut self, status: MovementState);

    /// The best-fit level changed; displays should switch floor plans
    fn on_level_changed(&mut self, level: LevelId);

    /// Per-tick cursor position along with the current score board
    fn on_position_update(&mut self, scores: &ScoreBoard, x: f32, y: f32);
}

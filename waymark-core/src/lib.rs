//! Core tracking engine for Waymark
//!
//! Estimates a device's position inside a building by matching windows of
//! beacon-signal observations against pre-recorded location fingerprints,
//! and animates a display cursor toward the best match at walking speed.
//!
//! Key constraints:
//! - No heap allocation in the per-tick hot path
//! - Every decision tick is total: adopt or reject, never an error
//! - One worker owns all tracking state; only a one-shot atomic flag
//!   crosses threads
//!
//! ```no_run
//! use waymark_core::{Locator, Runner, SystemClock, TrackerConfig};
//! # use waymark_core::{Fingerprint, FingerprintScorer, LevelId, MovementState,
//! #     ObservationSummary, PresentationSink, ScanReadings, ScoreBoard,
//! #     SignalSource, Timestamp, TopologyService};
//! # struct Radio; struct Database; struct FloorPlan; struct Screen;
//! # impl SignalSource for Radio {
//! #     fn scan(&mut self, _t: Timestamp) -> ScanReadings { ScanReadings::new() }
//! # }
//! # impl FingerprintScorer for Database {
//! #     fn update_scores(&mut self, _s: &ObservationSummary) {}
//! #     fn fingerprints(&self) -> &[Fingerprint] { &[] }
//! #     fn scores_for_level(&self, _l: LevelId) -> ScoreBoard { ScoreBoard::new() }
//! # }
//! # impl TopologyService for FloorPlan {
//! #     fn nearest_connection_index(&self, _l: LevelId, _x: f32, _y: f32) -> usize { 0 }
//! #     fn connector_x(&self, _i: usize, _l: LevelId) -> f32 { 0.0 }
//! #     fn connector_y(&self, _i: usize, _l: LevelId) -> f32 { 0.0 }
//! # }
//! # impl PresentationSink for Screen {
//! #     fn on_movement_status(&mut self, _s: MovementState) {}
//! #     fn on_level_changed(&mut self, _l: LevelId) {}
//! #     fn on_position_update(&mut self, _s: &ScoreBoard, _x: f32, _y: f32) {}
//! # }
//!
//! let config = TrackerConfig::new(12.5); // 12.5 px per meter on this map
//! let locator = Locator::new(config, Radio, Database, FloorPlan, Screen, None)
//!     .expect("valid config");
//!
//! let runner = Runner::spawn(locator, SystemClock);
//! // ... tracking runs on its own worker ...
//! runner.stop();
//! ```

#![cfg_attr(not(feature = "std"), no_std)]
#![deny(unsafe_code)]
#![warn(missing_docs)]

// Macros for optional logging
#[cfg(feature = "log")]
macro_rules! log_debug {
    ($($arg:tt)*) => { log::debug!($($arg)*) };
}

#[cfg(not(feature = "log"))]
macro_rules! log_debug {
    ($($arg:tt)*) => {};
}

#[cfg(feature = "log")]
macro_rules! log_warn {
    ($($arg:tt)*) => { log::warn!($($arg)*) };
}

#[cfg(not(feature = "log"))]
macro_rules! log_warn {
    ($($arg:tt)*) => {};
}

pub mod config;
pub mod constants;
pub mod cursor;
pub mod errors;
pub mod locator;
pub mod motion;
pub mod time;
pub mod tracker;
pub mod traits;
pub mod window;

// Public API
pub use config::TrackerConfig;
pub use cursor::CursorAnimator;
pub use errors::{ConfigError, ConfigResult};
pub use locator::Locator;
pub use motion::{MotionGate, ResetFlag};
pub use time::{FixedClock, TimeSource, Timestamp};
pub use tracker::{Decision, Fix, PositionTracker};
pub use traits::{
    Fingerprint, FingerprintScorer, LevelId, MovementState, PresentationSink, ScoreBoard,
    ScoreLine, SignalSource, TopologyService,
};
pub use window::{BeaconId, BeaconStats, ObservationSummary, ReadingWindow, ScanReadings};

#[cfg(feature = "std")]
pub use locator::Runner;
#[cfg(feature = "std")]
pub use time::SystemClock;

/// Crate version string
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

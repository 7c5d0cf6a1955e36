//! Scan Loop Orchestration
//!
//! ## Overview
//!
//! [`Locator`] wires the pieces together and runs exactly one tick of the
//! engine when asked: poll the signal source, feed the windows, run the
//! tracker decision, advance the cursor, and hand the results to the
//! presentation sink - in that order, every time. It owns every bit of
//! mutable tracking state, which is what makes the concurrency story
//! trivial: one worker drives `tick`, and the only thing any other thread
//! may touch is the motion gate's one-shot flag.
//!
//! [`Runner`] (std only) is that worker: a thread calling `tick` at a fixed
//! cadence, sleeping away the remainder of each period, and stopping
//! cooperatively within one period of a stop request.
//!
//! ## Tick Anatomy
//!
//! ```text
//! source.scan() ──changed?──▶ ingest ─▶ decide ─▶ retarget ─▶ sink
//!       │                                                      ▲
//!       └──────unchanged──────▶ drift ─────────────────────────┘
//! ```
//!
//! Radio stacks typically cache scan results between real sweeps, so
//! consecutive identical scans carry no new information. Feeding them to
//! the windows would multiply-count one observation; instead the tick
//! detects the repeat and only lets the cursor keep drifting toward the
//! unchanged target, which is what makes the on-screen motion smooth
//! between sparse real updates.

use crate::config::TrackerConfig;
use crate::constants::SCAN_CHANGE_EPSILON;
use crate::cursor::CursorAnimator;
use crate::errors::ConfigResult;
use crate::motion::ResetFlag;
use crate::time::Timestamp;
use crate::tracker::PositionTracker;
use crate::traits::{FingerprintScorer, PresentationSink, ScoreBoard, SignalSource, TopologyService};
use crate::window::ScanReadings;

/// Single-tick orchestrator owning all tracking state
pub struct Locator<'a, Src, Sc, Topo, Sink>
where
    Src: SignalSource,
    Sc: FingerprintScorer,
    Topo: TopologyService,
    Sink: PresentationSink,
{
    config: TrackerConfig,
    source: Src,
    scorer: Sc,
    topology: Topo,
    sink: Sink,
    tracker: PositionTracker<'a>,
    cursor: CursorAnimator,
    prev_scan: Option<ScanReadings>,
    scores: Option<ScoreBoard>,
}

impl<'a, Src, Sc, Topo, Sink> Locator<'a, Src, Sc, Topo, Sink>
where
    Src: SignalSource,
    Sc: FingerprintScorer,
    Topo: TopologyService,
    Sink: PresentationSink,
{
    /// Assemble an engine from its collaborators.
    ///
    /// Validates the configuration up front; a bad config is fatal here,
    /// never a run-time condition. `reset` is the motion gate's flag, or
    /// `None` when no accelerometer feeds the engine.
    pub fn new(
        config: TrackerConfig,
        source: Src,
        scorer: Sc,
        topology: Topo,
        sink: Sink,
        reset: Option<&'a ResetFlag>,
    ) -> ConfigResult<Self> {
        config.validate()?;
        let cursor = CursorAnimator::new(config.px_per_tick());
        let tracker = PositionTracker::new(config.clone(), reset)?;
        Ok(Self {
            config,
            source,
            scorer,
            topology,
            sink,
            tracker,
            cursor,
            prev_scan: None,
            scores: None,
        })
    }

    /// The validated configuration the engine runs with
    pub fn config(&self) -> &TrackerConfig {
        &self.config
    }

    /// The decision state machine
    pub fn tracker(&self) -> &PositionTracker<'a> {
        &self.tracker
    }

    /// The cursor animator
    pub fn cursor(&self) -> &CursorAnimator {
        &self.cursor
    }

    /// The injected scorer
    pub fn scorer(&self) -> &Sc {
        &self.scorer
    }

    /// The injected presentation sink
    pub fn sink(&self) -> &Sink {
        &self.sink
    }

    /// Run one tick at the given offset since tracking started.
    ///
    /// This is the only mutator of tracker and cursor state; drive it from
    /// a single worker.
    pub fn tick(&mut self, offset_ms: Timestamp) {
        let readings = self.source.scan(offset_ms);

        if scan_changed(self.prev_scan.as_ref(), &readings) {
            self.tracker.ingest(offset_ms, &readings);
            self.prev_scan = Some(readings);

            let decision = self.tracker.decide(&mut self.scorer, &self.topology, offset_ms);
            self.sink.on_movement_status(decision.status);

            if let Some(level) = decision.level_changed {
                self.sink.on_level_changed(level);
                // The cursor must not drift across floor plans
                if let Some(fix) = self.tracker.best_fix() {
                    self.cursor.snap_to(fix.x, fix.y, offset_ms);
                }
            }

            if let Some(fix) = self.tracker.best_fix() {
                let (x, y, level) = (fix.x, fix.y, fix.level);
                self.cursor.retarget(x, y, offset_ms);
                self.scores = Some(self.scorer.scores_for_level(level));
            }
        } else if let Some(fix) = self.tracker.best_fix() {
            // No new information: keep gliding toward the standing target
            self.cursor.drift(fix.x, fix.y, offset_ms);
        }

        if let (Some(scores), Some((x, y))) = (self.scores.as_ref(), self.cursor.position()) {
            self.sink.on_position_update(scores, x, y);
        }
    }
}

/// Whether `next` carries information `prev` did not.
///
/// Scans count as unchanged only when they list the same beacons with
/// strengths equal to within [`SCAN_CHANGE_EPSILON`].
fn scan_changed(prev: Option<&ScanReadings>, next: &ScanReadings) -> bool {
    let Some(prev) = prev else {
        return true;
    };
    if prev.len() != next.len() {
        return true;
    }
    for (beacon, strength) in next.iter() {
        match prev.get(beacon) {
            Some(old) if (old - strength).abs() <= SCAN_CHANGE_EPSILON => {}
            _ => return true,
        }
    }
    false
}

/// Worker thread driving a [`Locator`] at a fixed cadence (std only).
///
/// The loop checks its stop flag at the top of every iteration and sleeps
/// the remainder of each period, so a stop request takes effect within one
/// period plus one tick - a bounded latency accepted by design, not a
/// fault to report.
#[cfg(feature = "std")]
pub struct Runner {
    stop: std::sync::Arc<std::sync::atomic::AtomicBool>,
    worker: Option<std::thread::JoinHandle<()>>,
}

#[cfg(feature = "std")]
impl Runner {
    /// Spawn the worker thread.
    ///
    /// `clock` supplies wall time; tick offsets are measured from the
    /// moment the thread starts. The locator's reset flag, if any, must be
    /// `'static` (typically a `static ResetFlag`) so the sensor side can
    /// keep raising it for the thread's lifetime.
    pub fn spawn<Src, Sc, Topo, Sink, C>(
        mut locator: Locator<'static, Src, Sc, Topo, Sink>,
        clock: C,
    ) -> Self
    where
        Src: SignalSource + Send + 'static,
        Sc: FingerprintScorer + Send + 'static,
        Topo: TopologyService + Send + 'static,
        Sink: PresentationSink + Send + 'static,
        C: crate::time::TimeSource + Send + 'static,
    {
        use std::sync::atomic::{AtomicBool, Ordering};
        use std::sync::Arc;
        use std::time::Duration;

        let cadence_ms = locator.config().cadence_ms;
        let stop = Arc::new(AtomicBool::new(false));
        let stop_flag = Arc::clone(&stop);

        let worker = std::thread::spawn(move || {
            let start = clock.now();
            while !stop_flag.load(Ordering::Acquire) {
                let tick_begin = clock.now();
                locator.tick(tick_begin.saturating_sub(start));

                let spent = clock.now().saturating_sub(tick_begin);
                if spent < cadence_ms {
                    std::thread::sleep(Duration::from_millis(cadence_ms - spent));
                }
            }
        });

        Self {
            stop,
            worker: Some(worker),
        }
    }

    /// Ask the worker to stop without waiting for it.
    pub fn request_stop(&self) {
        self.stop
            .store(true, std::sync::atomic::Ordering::Release);
    }

    /// Stop the worker and wait for its current iteration to finish.
    pub fn stop(mut self) {
        self.request_stop();
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
    }
}

#[cfg(feature = "std")]
impl Drop for Runner {
    fn drop(&mut self) {
        self.request_stop();
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
    }
}

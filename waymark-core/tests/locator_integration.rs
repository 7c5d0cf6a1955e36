//! Integration tests for the tracking loop
//!
//! Drives a fully assembled [`Locator`] through scripted scans, scores,
//! and clock offsets, and checks the observable behavior at the
//! presentation sink: movement status, level changes, cursor motion, and
//! delivery order.

use core::fmt::Write as _;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use waymark_core::{
    Fingerprint, FingerprintScorer, FixedClock, LevelId, Locator, MovementState,
    ObservationSummary, PresentationSink, ResetFlag, Runner, ScanReadings, ScoreBoard, ScoreLine,
    SignalSource, SystemClock, TimeSource, Timestamp, TopologyService, TrackerConfig,
};

/// Emits a scripted sequence of scans, repeating the last one forever.
struct ScriptedSource {
    script: VecDeque<ScanReadings>,
    last: ScanReadings,
}

impl ScriptedSource {
    fn new(script: Vec<ScanReadings>) -> Self {
        Self {
            script: script.into_iter().collect(),
            last: ScanReadings::new(),
        }
    }
}

impl SignalSource for ScriptedSource {
    fn scan(&mut self, _offset_ms: Timestamp) -> ScanReadings {
        if let Some(next) = self.script.pop_front() {
            self.last = next;
        }
        self.last.clone()
    }
}

/// Applies a planned score vector on each `update_scores` call; keeps the
/// previous scores when the plan runs out.
struct ScriptedScorer {
    prints: Vec<Fingerprint>,
    planned: VecDeque<Vec<f32>>,
    update_calls: usize,
    last_summary_samples: usize,
}

impl ScriptedScorer {
    fn new(prints: Vec<Fingerprint>) -> Self {
        Self {
            prints,
            planned: VecDeque::new(),
            update_calls: 0,
            last_summary_samples: 0,
        }
    }

    fn plan(mut self, scores: &[&[f32]]) -> Self {
        self.planned = scores.iter().map(|s| s.to_vec()).collect();
        self
    }
}

impl FingerprintScorer for ScriptedScorer {
    fn update_scores(&mut self, summary: &ObservationSummary) {
        self.update_calls += 1;
        self.last_summary_samples = summary.samples();
        if let Some(scores) = self.planned.pop_front() {
            for (print, score) in self.prints.iter_mut().zip(scores) {
                print.score = score;
            }
        }
    }

    fn fingerprints(&self) -> &[Fingerprint] {
        &self.prints
    }

    fn scores_for_level(&self, level: LevelId) -> ScoreBoard {
        let mut board = ScoreBoard::new();
        for print in self.prints.iter().filter(|p| p.level == level) {
            let mut line = ScoreLine::new();
            let _ = write!(line, "{}: {:.1}", print.id, print.score);
            let _ = board.push(line);
        }
        board
    }
}

/// One connector per level, all sharing index 0.
struct StairTopology {
    connectors: Vec<(LevelId, f32, f32)>,
}

impl TopologyService for StairTopology {
    fn nearest_connection_index(&self, _level: LevelId, _x: f32, _y: f32) -> usize {
        0
    }

    fn connector_x(&self, _index: usize, level: LevelId) -> f32 {
        self.connectors
            .iter()
            .find(|(l, _, _)| *l == level)
            .map(|(_, x, _)| *x)
            .unwrap_or(0.0)
    }

    fn connector_y(&self, _index: usize, level: LevelId) -> f32 {
        self.connectors
            .iter()
            .find(|(l, _, _)| *l == level)
            .map(|(_, _, y)| *y)
            .unwrap_or(0.0)
    }
}

/// Records every sink call in arrival order.
#[derive(Debug, PartialEq, Clone)]
enum SinkEvent {
    Status(MovementState),
    Level(LevelId),
    Position { lines: usize, x: f32, y: f32 },
}

#[derive(Default)]
struct RecordingSink {
    events: Vec<SinkEvent>,
}

impl RecordingSink {
    fn positions(&self) -> Vec<(f32, f32)> {
        self.events
            .iter()
            .filter_map(|e| match e {
                SinkEvent::Position { x, y, .. } => Some((*x, *y)),
                _ => None,
            })
            .collect()
    }

    fn statuses(&self) -> Vec<MovementState> {
        self.events
            .iter()
            .filter_map(|e| match e {
                SinkEvent::Status(s) => Some(*s),
                _ => None,
            })
            .collect()
    }
}

impl PresentationSink for RecordingSink {
    fn on_movement_status(&mut self, status: MovementState) {
        self.events.push(SinkEvent::Status(status));
    }

    fn on_level_changed(&mut self, level: LevelId) {
        self.events.push(SinkEvent::Level(level));
    }

    fn on_position_update(&mut self, scores: &ScoreBoard, x: f32, y: f32) {
        self.events.push(SinkEvent::Position {
            lines: scores.len(),
            x,
            y,
        });
    }
}

fn readings(pairs: &[(u32, f32)]) -> ScanReadings {
    let mut map = ScanReadings::new();
    for (beacon, strength) in pairs {
        map.insert(*beacon, *strength).unwrap();
    }
    map
}

/// Scans whose strengths shift a little every tick, so each one is fresh.
fn fresh_scans(count: usize) -> Vec<ScanReadings> {
    (0..count)
        .map(|i| readings(&[(1, -50.0 - i as f32), (2, -60.0 - i as f32)]))
        .collect()
}

fn print(id: u32, x: f32, y: f32, level: LevelId) -> Fingerprint {
    Fingerprint {
        id,
        x,
        y,
        level,
        score: 0.0,
    }
}

/// 10 px/m, 2 m/s, no error allowance: 2 px per 100 ms tick, and a 100 px
/// jump needs 5000 ms of dwell.
fn config() -> TrackerConfig {
    let mut cfg = TrackerConfig::new(10.0);
    cfg.error_accommodation_m = 0.0;
    cfg
}

fn flat_topology() -> StairTopology {
    StairTopology {
        connectors: vec![(0, 0.0, 0.0), (1, 0.0, 0.0)],
    }
}

#[test]
fn first_fix_snaps_cursor_and_reports() {
    let scorer = ScriptedScorer::new(vec![print(0, 40.0, 30.0, 0), print(1, 90.0, 90.0, 0)])
        .plan(&[&[10.0, 5.0]]);
    let mut locator = Locator::new(
        config(),
        ScriptedSource::new(fresh_scans(1)),
        scorer,
        flat_topology(),
        RecordingSink::default(),
        None,
    )
    .unwrap();

    locator.tick(0);

    let events = &locator.sink().events;
    assert_eq!(events[0], SinkEvent::Status(MovementState::Moving));
    // First fix counts as a level change so the display starts on the
    // right floor, and the cursor appears directly on the fix
    assert_eq!(events[1], SinkEvent::Level(0));
    assert_eq!(
        events[2],
        SinkEvent::Position {
            lines: 2,
            x: 40.0,
            y: 30.0
        }
    );
    assert_eq!(locator.tracker().best_fix().unwrap().index, 0);
}

#[test]
fn stale_scans_keep_reporting_cached_scores() {
    let scorer =
        ScriptedScorer::new(vec![print(0, 40.0, 30.0, 0)]).plan(&[&[10.0]]);
    // One real scan; the source then repeats it verbatim
    let mut locator = Locator::new(
        config(),
        ScriptedSource::new(fresh_scans(1)),
        scorer,
        flat_topology(),
        RecordingSink::default(),
        None,
    )
    .unwrap();

    for t in 0..4u64 {
        locator.tick(t * 100);
    }

    // Only the first tick was fresh: one status, one summary fed
    assert_eq!(locator.sink().statuses().len(), 1);
    assert_eq!(locator.scorer().update_calls, 1);
    // Every tick still produced a position update from the cached board
    assert_eq!(locator.sink().positions().len(), 4);
    assert!(locator
        .sink()
        .positions()
        .iter()
        .all(|&(x, y)| (x, y) == (40.0, 30.0)));
}

#[test]
fn cursor_glides_toward_new_fix_and_arrives() {
    // Fix A at the origin; B is 10 px away on the same level. Scores make
    // A best on tick 0, then B far better once the sticky period ends.
    let scorer = ScriptedScorer::new(vec![print(0, 0.0, 0.0, 0), print(1, 10.0, 0.0, 0)])
        .plan(&[&[10.0, 0.0], &[10.0, 100.0]]);
    let mut scans = fresh_scans(2);
    scans.push(scans[1].clone()); // ticks after the second are stale
    let mut locator = Locator::new(
        config(),
        ScriptedSource::new(scans),
        scorer,
        flat_topology(),
        RecordingSink::default(),
        None,
    )
    .unwrap();

    locator.tick(0);
    assert_eq!(locator.cursor().position(), Some((0.0, 0.0)));

    // Second fresh tick well past the sticky window; 10 px = 1 m = 500 ms
    // of walking, and 4000 ms have elapsed: adopt B
    locator.tick(4000);
    assert_eq!(locator.tracker().best_fix().unwrap().index, 1);
    // The adoption tick only turns the heading; the glide happens on the
    // stale ticks that follow
    assert_eq!(locator.cursor().position(), Some((0.0, 0.0)));

    locator.tick(4100);
    assert_eq!(locator.cursor().position(), Some((2.0, 0.0)));
    locator.tick(4200);
    assert_eq!(locator.cursor().position(), Some((4.0, 0.0)));

    // Keep drifting: the cursor reaches B and stays put
    for t in 3..10u64 {
        locator.tick(4000 + t * 100);
    }
    assert_eq!(locator.cursor().position(), Some((10.0, 0.0)));
    assert_eq!(locator.cursor().drift_vector(), (0.0, 0.0));
}

#[test]
fn travel_gate_holds_until_enough_time_elapsed() {
    let scorer = ScriptedScorer::new(vec![print(0, 0.0, 0.0, 0), print(1, 100.0, 0.0, 0)])
        .plan(&[&[10.0, 0.0], &[10.0, 100.0], &[10.0, 100.0]]);
    let mut locator = Locator::new(
        config(),
        ScriptedSource::new(fresh_scans(3)),
        scorer,
        flat_topology(),
        RecordingSink::default(),
        None,
    )
    .unwrap();

    locator.tick(0);
    assert_eq!(locator.tracker().best_fix().unwrap().index, 0);

    // 100 px at 10 px/m and 2 m/s takes 5000 ms; 4999 is not enough
    locator.tick(4999);
    assert_eq!(locator.tracker().best_fix().unwrap().index, 0);

    locator.tick(5001);
    assert_eq!(locator.tracker().best_fix().unwrap().index, 1);
}

#[test]
fn level_change_snaps_cursor_and_notifies() {
    // Connector at the origin on both levels; the candidate is 50 px from
    // it upstairs (2500 ms of walking)
    let scorer = ScriptedScorer::new(vec![print(0, 0.0, 0.0, 0), print(1, 30.0, 40.0, 1)])
        .plan(&[&[10.0, 0.0], &[10.0, 100.0]]);
    let mut locator = Locator::new(
        config(),
        ScriptedSource::new(fresh_scans(2)),
        scorer,
        flat_topology(),
        RecordingSink::default(),
        None,
    )
    .unwrap();

    locator.tick(0);
    locator.tick(4000);

    assert_eq!(locator.tracker().best_level(), Some(1));
    // No drifting across floor plans: the cursor teleports
    assert_eq!(locator.cursor().position(), Some((30.0, 40.0)));
    let events = &locator.sink().events;
    assert!(events.contains(&SinkEvent::Level(1)));
    // Within the adoption tick, status precedes the level change, which
    // precedes the position update
    let status_at = events
        .iter()
        .rposition(|e| matches!(e, SinkEvent::Status(_)))
        .unwrap();
    let level_at = events.iter().rposition(|e| *e == SinkEvent::Level(1)).unwrap();
    let position_at = events
        .iter()
        .rposition(|e| matches!(e, SinkEvent::Position { .. }))
        .unwrap();
    assert!(status_at < level_at && level_at < position_at);
}

#[test]
fn stationary_status_after_quiet_spell_and_motion_resets_it() {
    static FLAG: ResetFlag = ResetFlag::new();

    let scorer = ScriptedScorer::new(vec![print(0, 0.0, 0.0, 0)]);
    let mut locator = Locator::new(
        config(),
        ScriptedSource::new(fresh_scans(12)),
        scorer,
        flat_topology(),
        RecordingSink::default(),
        Some(&FLAG),
    )
    .unwrap();

    let mut clock = FixedClock::new(0);
    for _ in 0..8 {
        locator.tick(clock.now());
        clock.advance(100);
    }
    // min_stationary_obs is 5: the long window outgrew it two ticks ago
    let statuses = locator.sink().statuses();
    assert_eq!(statuses[4], MovementState::Moving);
    assert_eq!(statuses[5], MovementState::Stationary);
    assert_eq!(statuses[7], MovementState::Stationary);

    // The device moves: the long window restarts and the engine falls
    // back to the short window
    FLAG.raise();
    locator.tick(clock.now());
    assert_eq!(
        *locator.sink().statuses().last().unwrap(),
        MovementState::Moving
    );
}

#[test]
fn summary_reaches_scorer_with_window_depth() {
    let scorer = ScriptedScorer::new(vec![print(0, 0.0, 0.0, 0)]);
    let mut locator = Locator::new(
        config(),
        ScriptedSource::new(fresh_scans(4)),
        scorer,
        flat_topology(),
        RecordingSink::default(),
        None,
    )
    .unwrap();

    for t in 0..4u64 {
        locator.tick(t * 100);
    }
    // Four fresh scans, short window caps at 3
    assert_eq!(locator.scorer().update_calls, 4);
    assert_eq!(locator.scorer().last_summary_samples, 3);
}

/// Counts position updates across threads.
struct CountingSink {
    positions: Arc<AtomicUsize>,
}

impl PresentationSink for CountingSink {
    fn on_movement_status(&mut self, _status: MovementState) {}

    fn on_level_changed(&mut self, _level: LevelId) {}

    fn on_position_update(&mut self, _scores: &ScoreBoard, _x: f32, _y: f32) {
        self.positions.fetch_add(1, Ordering::Relaxed);
    }
}

#[test]
fn runner_ticks_and_stops_cooperatively() {
    let positions = Arc::new(AtomicUsize::new(0));
    let scorer = ScriptedScorer::new(vec![print(0, 5.0, 5.0, 0)]).plan(&[&[10.0]]);
    let mut cfg = config();
    cfg.cadence_ms = 10;
    let locator = Locator::new(
        cfg,
        ScriptedSource::new(fresh_scans(1)),
        scorer,
        flat_topology(),
        CountingSink {
            positions: Arc::clone(&positions),
        },
        None,
    )
    .unwrap();

    let runner = Runner::spawn(locator, SystemClock);
    std::thread::sleep(std::time::Duration::from_millis(200));
    runner.stop();

    let after_stop = positions.load(Ordering::Relaxed);
    assert!(after_stop >= 1, "worker never ticked");

    // Stopped means stopped: no more updates arrive
    std::thread::sleep(std::time::Duration::from_millis(50));
    assert_eq!(positions.load(Ordering::Relaxed), after_stop);
}

//! Cursor Drift Animation
//!
//! ## Overview
//!
//! Position fixes arrive in discrete, irregular jumps - often seconds
//! apart - but a position cursor that teleports looks broken. The
//! [`CursorAnimator`] turns those jumps into a constant-velocity glide: it
//! moves the displayed position toward the current best fit at walking
//! speed, one fixed-length step per tick.
//!
//! ## Behavior
//!
//! - On a tick that processed a fresh fix ([`CursorAnimator::retarget`]),
//!   the animator recomputes the heading toward the target with a
//!   four-quadrant `atan2` and stores the per-tick drift vector.
//! - On a tick with nothing new ([`CursorAnimator::drift`]), it advances by
//!   the stored vector without recomputing the heading, so the cursor
//!   travels a straight line between sparse fixes instead of wobbling as
//!   float noise shifts the target.
//! - In both cases, once the cursor is within half a step of the target on
//!   both axes it snaps exactly onto it and the drift vector zeroes;
//!   without the snap the cursor would orbit the target forever.
//! - A level change teleports the cursor ([`CursorAnimator::snap_to`]):
//!   drifting across floor plans has no physical meaning.

use crate::time::Timestamp;

/// Constant-velocity animator for the displayed position cursor
#[derive(Debug, Clone)]
pub struct CursorAnimator {
    /// Pixels traveled per tick at the configured walking pace
    step_px: f32,
    /// Displayed position; None until the first fix arrives
    position: Option<(f32, f32)>,
    /// Current per-tick drift vector
    drift: (f32, f32),
    /// Tick offset of the last update. Diagnostics only.
    last_update_ms: Timestamp,
}

impl CursorAnimator {
    /// Create an animator stepping `step_px` pixels per tick.
    pub fn new(step_px: f32) -> Self {
        Self {
            step_px,
            position: None,
            drift: (0.0, 0.0),
            last_update_ms: 0,
        }
    }

    /// Displayed position, once a first fix has been shown
    pub fn position(&self) -> Option<(f32, f32)> {
        self.position
    }

    /// Current drift vector
    pub fn drift_vector(&self) -> (f32, f32) {
        self.drift
    }

    /// Tick offset of the most recent update
    pub fn last_update_ms(&self) -> Timestamp {
        self.last_update_ms
    }

    /// A fresh fix was processed this tick: aim the drift vector at it.
    ///
    /// The first ever call places the cursor directly on the target.
    pub fn retarget(&mut self, target_x: f32, target_y: f32, now: Timestamp) {
        self.last_update_ms = now;
        let (cx, cy) = match self.position {
            Some(p) => p,
            None => {
                self.snap(target_x, target_y);
                return;
            }
        };

        if self.within_snap(cx, cy, target_x, target_y) {
            self.snap(target_x, target_y);
        } else {
            let theta = libm::atan2f(target_y - cy, target_x - cx);
            self.drift = (
                self.step_px * libm::cosf(theta),
                self.step_px * libm::sinf(theta),
            );
        }
    }

    /// Nothing new this tick: advance along the stored drift vector.
    pub fn drift(&mut self, target_x: f32, target_y: f32, now: Timestamp) {
        self.last_update_ms = now;
        let (cx, cy) = match self.position {
            Some(p) => p,
            None => return,
        };

        if self.within_snap(cx, cy, target_x, target_y) {
            self.snap(target_x, target_y);
        } else {
            self.position = Some((cx + self.drift.0, cy + self.drift.1));
        }
    }

    /// Teleport the cursor, e.g. across a level change.
    pub fn snap_to(&mut self, x: f32, y: f32, now: Timestamp) {
        self.last_update_ms = now;
        self.snap(x, y);
    }

    fn snap(&mut self, x: f32, y: f32) {
        self.position = Some((x, y));
        self.drift = (0.0, 0.0);
    }

    fn within_snap(&self, cx: f32, cy: f32, tx: f32, ty: f32) -> bool {
        let half = self.step_px / 2.0;
        (tx - cx).abs() < half && (ty - cy).abs() < half
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const STEP: f32 = 2.0;

    fn animator_at(x: f32, y: f32) -> CursorAnimator {
        let mut a = CursorAnimator::new(STEP);
        a.retarget(x, y, 0); // first fix snaps
        a
    }

    #[test]
    fn first_fix_snaps_onto_target() {
        let mut a = CursorAnimator::new(STEP);
        assert!(a.position().is_none());
        a.retarget(40.0, 30.0, 0);
        assert_eq!(a.position(), Some((40.0, 30.0)));
        assert_eq!(a.drift_vector(), (0.0, 0.0));
    }

    #[test]
    fn snaps_within_half_step() {
        let mut a = animator_at(10.0, 10.0);
        // 0.9 px away on each axis, under the 1.0 px half step
        a.retarget(10.9, 9.1, 100);
        assert_eq!(a.position(), Some((10.9, 9.1)));
        assert_eq!(a.drift_vector(), (0.0, 0.0));
    }

    #[test]
    fn heading_resolves_left_quadrant() {
        let mut a = animator_at(10.0, 10.0);
        // Target due left; a single-argument arctangent would head right
        a.retarget(0.0, 10.0, 100);
        let (dx, dy) = a.drift_vector();
        assert!((dx + STEP).abs() < 1e-4);
        assert!(dy.abs() < 1e-4);
    }

    #[test]
    fn heading_resolves_straight_up_and_down() {
        let mut a = animator_at(10.0, 10.0);
        a.retarget(10.0, 0.0, 100);
        let (dx, dy) = a.drift_vector();
        assert!(dx.abs() < 1e-4);
        assert!((dy + STEP).abs() < 1e-4);

        let mut a = animator_at(10.0, 10.0);
        a.retarget(10.0, 25.0, 100);
        let (dx, dy) = a.drift_vector();
        assert!(dx.abs() < 1e-4);
        assert!((dy - STEP).abs() < 1e-4);
    }

    #[test]
    fn drift_advances_in_straight_line() {
        let mut a = animator_at(0.0, 0.0);
        a.retarget(10.0, 0.0, 100); // heading +x
        let before = a.position().unwrap();
        a.drift(10.0, 0.0, 200);
        a.drift(10.0, 0.0, 300);
        let after = a.position().unwrap();
        assert!((after.0 - before.0 - 2.0 * STEP).abs() < 1e-4);
        assert_eq!(after.1, before.1);
    }

    #[test]
    fn drift_snaps_on_arrival() {
        let mut a = animator_at(0.0, 0.0);
        a.retarget(5.5, 0.0, 100);
        for t in 0..5 {
            a.drift(5.5, 0.0, 200 + t * 100);
        }
        assert_eq!(a.position(), Some((5.5, 0.0)));
        assert_eq!(a.drift_vector(), (0.0, 0.0));
    }

    #[test]
    fn snap_to_teleports() {
        let mut a = animator_at(0.0, 0.0);
        a.retarget(100.0, 100.0, 100);
        a.snap_to(50.0, 60.0, 200);
        assert_eq!(a.position(), Some((50.0, 60.0)));
        assert_eq!(a.drift_vector(), (0.0, 0.0));
    }
}

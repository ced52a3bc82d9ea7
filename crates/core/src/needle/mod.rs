use serde::{Deserialize, Serialize};

use crate::angle::{shortest_delta, Easing, RESTING_ANGLE};

/// Time a point-to-point needle move takes, in milliseconds.
pub const ANIMATION_DURATION_MS: f64 = 1200.0;

/// Timing policy for point-to-point needle moves.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Motion {
    pub duration_ms: f64,
    pub easing: Easing,
}

impl Default for Motion {
    fn default() -> Self {
        Self {
            duration_ms: ANIMATION_DURATION_MS,
            easing: Easing::QuadInOut,
        }
    }
}

/// A single rotating needle.
///
/// `delta` is fixed when a target is set and never recomputed while the move is
/// in flight, so a needle keeps its original rotation direction even if it
/// crosses the ±π seam on the way.
#[derive(Debug, Clone, PartialEq)]
pub struct NeedleState {
    current: f64,
    start: f64,
    target: f64,
    delta: f64,
    animation_start: Option<f64>,
    length: f64,
}

impl NeedleState {
    /// Creates an idle needle at the resting angle.
    pub fn new(length: f64) -> Self {
        Self {
            current: RESTING_ANGLE,
            start: RESTING_ANGLE,
            target: RESTING_ANGLE,
            delta: 0.0,
            animation_start: None,
            length,
        }
    }

    pub fn angle(&self) -> f64 {
        self.current
    }

    pub fn target(&self) -> f64 {
        self.target
    }

    pub fn start(&self) -> f64 {
        self.start
    }

    pub fn delta(&self) -> f64 {
        self.delta
    }

    pub fn length(&self) -> f64 {
        self.length
    }

    pub fn is_animating(&self) -> bool {
        self.animation_start.is_some()
    }

    /// Starts a move towards `target`. Targets equal to the current angle are ignored.
    pub fn set_target(&mut self, target: f64, now: f64) {
        if target == self.current {
            return;
        }
        self.start = self.current;
        self.target = target;
        self.delta = shortest_delta(self.start, target);
        self.animation_start = Some(now);
    }

    /// Advances the move to `now`. Returns true while the needle is still moving.
    pub fn step(&mut self, now: f64, motion: &Motion) -> bool {
        let Some(started) = self.animation_start else {
            return false;
        };

        let elapsed = now - started;
        if elapsed >= motion.duration_ms {
            self.current = self.target;
            self.animation_start = None;
            return false;
        }

        let progress = (elapsed / motion.duration_ms).clamp(0.0, 1.0);
        self.current = self.start + self.delta * motion.easing.apply(progress);
        true
    }

    /// Puts the needle at `angle` immediately, cancelling any move in flight.
    pub fn place(&mut self, angle: f64) {
        self.current = angle;
        self.start = angle;
        self.target = angle;
        self.delta = 0.0;
        self.animation_start = None;
    }

    /// Stops a move in flight at its current interpolated angle.
    pub fn freeze(&mut self) {
        if self.animation_start.is_some() {
            self.place(self.current);
        }
    }

    pub fn reset_to_default(&mut self) {
        self.place(RESTING_ANGLE);
    }

    /// True when both the shown and the intended angle are the resting one.
    pub fn is_at_rest(&self) -> bool {
        self.current == RESTING_ANGLE && self.target == RESTING_ANGLE
    }
}

use serde::{Deserialize, Serialize};

use crate::{
    angle::{shortest_delta, AnglePair, Easing},
    grid::Grid,
    pattern::{loop_progress, Field, PatternLibrary, PATTERN_PERIOD_MS},
};

/// Time the grid takes to blend from its previous pose into a new pattern, in milliseconds.
pub const TRANSITION_DURATION_MS: f64 = 2_000.0;

/// Timing for pattern playback.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PatternTiming {
    pub period_ms: f64,
    pub transition_ms: f64,
    /// Move on to the next registered pattern after each full period.
    pub auto_cycle: bool,
}

impl Default for PatternTiming {
    fn default() -> Self {
        Self {
            period_ms: PATTERN_PERIOD_MS,
            transition_ms: TRANSITION_DURATION_MS,
            auto_cycle: false,
        }
    }
}

#[derive(Debug, Clone)]
struct ActivePattern {
    index: usize,
    started_at: f64,
    /// Angles every needle showed when the pattern was selected, row-major.
    snapshot: Vec<AnglePair>,
}

/// Plays patterns on a grid, blending in from whatever pose the grid had.
///
/// The blend always measures from the snapshot taken at selection time, never from
/// the previous frame, so the grid accelerates away from its old pose towards the
/// live field and tracks it exactly once the transition window has passed.
#[derive(Debug, Clone)]
pub struct Transitioner {
    library: PatternLibrary,
    timing: PatternTiming,
    easing: Easing,
    active: Option<ActivePattern>,
}

impl Transitioner {
    pub fn new(library: PatternLibrary, timing: PatternTiming) -> Self {
        Self {
            library,
            timing,
            easing: Easing::CubicInOut,
            active: None,
        }
    }

    pub fn library(&self) -> &PatternLibrary {
        &self.library
    }

    pub fn timing(&self) -> &PatternTiming {
        &self.timing
    }

    pub fn set_auto_cycle(&mut self, enabled: bool) {
        self.timing.auto_cycle = enabled;
    }

    pub fn is_active(&self) -> bool {
        self.active.is_some()
    }

    /// Key of the pattern currently playing.
    pub fn active_key(&self) -> Option<&'static str> {
        self.active
            .as_ref()
            .and_then(|active| self.library.by_index(active.index))
            .map(|pattern| pattern.key)
    }

    /// Starts `key` from the grid's current pose. Unknown keys leave everything as is.
    pub fn select(&mut self, key: &str, grid: &Grid, now: f64) -> bool {
        match self.library.index_of(key) {
            Some(index) => {
                self.start(index, grid, now);
                true
            }
            None => {
                tracing::warn!(key, "unknown pattern requested");
                false
            }
        }
    }

    pub fn stop(&mut self) {
        if let Some(key) = self.active_key() {
            tracing::debug!(key, "pattern stopped");
        }
        self.active = None;
    }

    /// Writes the blended field for `now` into the grid. Returns true while a
    /// pattern is playing; a live field never settles, so every frame redraws.
    pub fn tick(&mut self, grid: &mut Grid, now: f64) -> bool {
        let Some(active) = self.active.as_ref() else {
            return false;
        };

        let elapsed = (now - active.started_at).max(0.0);
        if self.timing.auto_cycle && elapsed >= self.timing.period_ms {
            if let Some(next) = self.library.next_index(active.index) {
                self.start(next, grid, now);
            }
        }

        let Some(active) = self.active.as_mut() else {
            return false;
        };
        if active.snapshot.len() != grid.cells().len() {
            // The grid was rebuilt underneath us; blend from its new pose instead.
            active.snapshot = capture(grid);
        }
        let Some(pattern) = self.library.by_index(active.index) else {
            return false;
        };

        let elapsed = (now - active.started_at).max(0.0);
        let progress = loop_progress(elapsed, self.timing.period_ms);
        let blend = self.easing.apply(transition_progress(elapsed, self.timing.transition_ms));
        let field = Field::of(grid);

        for ((pos, cell), from) in grid.iter_mut().zip(&active.snapshot) {
            let target = pattern.sample(&field, progress, pos.row, pos.col);
            cell.place(blend_pair(*from, target, blend));
        }
        true
    }

    fn start(&mut self, index: usize, grid: &Grid, now: f64) {
        if let Some(pattern) = self.library.by_index(index) {
            tracing::info!(key = pattern.key, name = pattern.name, "pattern selected");
        }
        self.active = Some(ActivePattern {
            index,
            started_at: now,
            snapshot: capture(grid),
        });
    }
}

fn capture(grid: &Grid) -> Vec<AnglePair> {
    grid.cells().iter().map(|cell| cell.angles()).collect()
}

fn transition_progress(elapsed: f64, duration: f64) -> f64 {
    if duration <= 0.0 {
        1.0
    } else {
        (elapsed / duration).min(1.0)
    }
}

/// Moves each angle of `from` towards `to` along the shortest path by `amount`.
pub fn blend_pair(from: AnglePair, to: AnglePair, amount: f64) -> AnglePair {
    [
        from[0] + shortest_delta(from[0], to[0]) * amount,
        from[1] + shortest_delta(from[1], to[1]) * amount,
    ]
}

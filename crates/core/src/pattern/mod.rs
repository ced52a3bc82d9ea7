//! Continuous angle fields.
//!
//! Every pattern is a pure function of `(progress, row, col)` where progress is the
//! position inside one looping period. The formulas only use `progress` through
//! `sin`/`cos` of `progress · 2π` (or whole turns), so each field wraps seamlessly
//! when the period restarts. The second needle is always offset from the first by
//! a bounded, non-zero amount so a cell never collapses into a single line.

use std::{
    f64::consts::{FRAC_PI_2, FRAC_PI_4, PI, TAU},
    fmt,
};

use crate::{angle::AnglePair, grid::Grid, NeedleMatrixError, Result};

/// Length of one pattern loop, in milliseconds.
pub const PATTERN_PERIOD_MS: f64 = 10_000.0;

/// Immutable grid geometry a generator may depend on.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Field {
    pub rows: usize,
    pub cols: usize,
}

impl Field {
    pub fn new(rows: usize, cols: usize) -> Self {
        Self { rows, cols }
    }

    pub fn of(grid: &Grid) -> Self {
        Self::new(grid.rows(), grid.cols())
    }

    /// Geometric centre in (row, col) units.
    pub fn center(&self) -> (f64, f64) {
        (
            self.rows.saturating_sub(1) as f64 / 2.0,
            self.cols.saturating_sub(1) as f64 / 2.0,
        )
    }

    /// Distance and polar angle of a cell around the centre.
    fn polar(&self, row: usize, col: usize) -> (f64, f64) {
        let (dy, dx) = self.offset(row, col);
        ((dx * dx + dy * dy).sqrt(), dy.atan2(dx))
    }

    fn offset(&self, row: usize, col: usize) -> (f64, f64) {
        let (center_row, center_col) = self.center();
        (row as f64 - center_row, col as f64 - center_col)
    }
}

pub type Generator = fn(&Field, f64, usize, usize) -> AnglePair;

/// A named, stateless angle field.
#[derive(Clone, Copy)]
pub struct Pattern {
    pub key: &'static str,
    pub name: &'static str,
    generator: Generator,
}

impl Pattern {
    pub const fn new(key: &'static str, name: &'static str, generator: Generator) -> Self {
        Self {
            key,
            name,
            generator,
        }
    }

    /// Target angles for a cell. `progress` is wrapped into `[0, 1)`.
    pub fn sample(&self, field: &Field, progress: f64, row: usize, col: usize) -> AnglePair {
        (self.generator)(field, progress.rem_euclid(1.0), row, col)
    }
}

impl fmt::Debug for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pattern")
            .field("key", &self.key)
            .field("name", &self.name)
            .finish()
    }
}

/// Position inside the loop for a pattern that has been running for `elapsed_ms`.
pub fn loop_progress(elapsed_ms: f64, period_ms: f64) -> f64 {
    if period_ms <= 0.0 || !elapsed_ms.is_finite() {
        return 0.0;
    }
    elapsed_ms.max(0.0).rem_euclid(period_ms) / period_ms
}

/// Patterns in registration order.
#[derive(Debug, Clone, Default)]
pub struct PatternLibrary {
    patterns: Vec<Pattern>,
}

impl PatternLibrary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Library holding every built-in pattern.
    pub fn builtin() -> Self {
        Self {
            patterns: vec![
                Pattern::new("fluid_flow", "Fluid Flow", fluid_flow),
                Pattern::new("spiral_flow", "Spiral Flow", spiral_flow),
                Pattern::new("wave_flow", "Wave Flow", wave_flow),
                Pattern::new("vortex_flow", "Vortex Flow", vortex_flow),
                Pattern::new("chase_light", "Chase Light", chase_light),
                Pattern::new("left_to_right", "Left To Right", left_to_right),
                Pattern::new("top_to_bottom", "Waterfall", top_to_bottom),
                Pattern::new("diagonal", "Diagonal Pulse", diagonal),
                Pattern::new("corner_spread", "Corner Spread", corner_spread),
                Pattern::new("center_ripple", "Centre Ripple", center_ripple),
                Pattern::new("column_sway", "Column Sway", column_sway),
            ],
        }
    }

    pub fn register(&mut self, pattern: Pattern) -> Result<()> {
        if self.index_of(pattern.key).is_some() {
            return Err(NeedleMatrixError::msg(format!(
                "pattern `{}` is already registered",
                pattern.key
            )));
        }
        self.patterns.push(pattern);
        Ok(())
    }

    pub fn get(&self, key: &str) -> Option<&Pattern> {
        self.patterns.iter().find(|pattern| pattern.key == key)
    }

    pub fn by_index(&self, index: usize) -> Option<&Pattern> {
        self.patterns.get(index)
    }

    pub fn index_of(&self, key: &str) -> Option<usize> {
        self.patterns.iter().position(|pattern| pattern.key == key)
    }

    /// Index following `index`, wrapping to the first pattern.
    pub fn next_index(&self, index: usize) -> Option<usize> {
        (!self.patterns.is_empty()).then(|| (index + 1) % self.patterns.len())
    }

    pub fn keys(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.patterns.iter().map(|pattern| pattern.key)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Pattern> + '_ {
        self.patterns.iter()
    }

    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }
}

fn turn(progress: f64) -> f64 {
    progress * TAU
}

/// Full-range swing used by the travelling-wave patterns.
fn sweep(phase: f64) -> AnglePair {
    let first = PI * phase.sin();
    [first, first + FRAC_PI_2 + FRAC_PI_4 * phase.cos()]
}

fn fluid_flow(field: &Field, progress: f64, row: usize, col: usize) -> AnglePair {
    const AMPLITUDE: f64 = 0.6;
    let (distance, angle) = field.polar(row, col);
    let phase = distance * 0.2 - turn(progress);
    [
        angle + phase.sin() * AMPLITUDE,
        angle + FRAC_PI_2 + (phase + FRAC_PI_2).sin() * AMPLITUDE,
    ]
}

fn spiral_flow(field: &Field, progress: f64, row: usize, col: usize) -> AnglePair {
    let (distance, angle) = field.polar(row, col);
    let strength = (-distance * 0.1).exp();
    let phase = distance * 0.3 + turn(progress);
    let first = angle + PI * strength * phase.sin();
    [first, first + FRAC_PI_2 + FRAC_PI_4 * strength * phase.cos()]
}

fn wave_flow(field: &Field, progress: f64, row: usize, col: usize) -> AnglePair {
    const AMPLITUDE: f64 = 0.5;
    let (_, angle) = field.polar(row, col);
    let (dy, dx) = field.offset(row, col);
    let horizontal = dx * 0.3 + turn(progress);
    let vertical = dy * 0.3 + turn(progress);
    [
        angle + horizontal.sin() * AMPLITUDE,
        angle + FRAC_PI_2 + vertical.sin() * AMPLITUDE,
    ]
}

fn vortex_flow(field: &Field, progress: f64, row: usize, col: usize) -> AnglePair {
    let (distance, angle) = field.polar(row, col);
    let strength = 1.0 - (distance * 0.15).min(1.0);
    let first = angle + PI * strength * turn(progress).sin();
    [first, first + PI * (0.5 + (distance * 0.1).min(0.4))]
}

fn chase_light(field: &Field, progress: f64, _row: usize, col: usize) -> AnglePair {
    let delay = field.cols.saturating_sub(1 + col) as f64 * 0.1;
    sweep(turn(progress) - delay)
}

fn left_to_right(_field: &Field, progress: f64, _row: usize, col: usize) -> AnglePair {
    sweep(turn(progress) - col as f64 * 0.1)
}

fn top_to_bottom(_field: &Field, progress: f64, row: usize, _col: usize) -> AnglePair {
    sweep(turn(progress) - row as f64 * 0.15)
}

fn diagonal(_field: &Field, progress: f64, row: usize, col: usize) -> AnglePair {
    sweep(turn(progress) - (row + col) as f64 * 0.12)
}

fn corner_spread(_field: &Field, progress: f64, row: usize, col: usize) -> AnglePair {
    let distance = ((row * row + col * col) as f64).sqrt();
    sweep(turn(progress) - distance * 0.1)
}

fn center_ripple(field: &Field, progress: f64, row: usize, col: usize) -> AnglePair {
    let (distance, _) = field.polar(row, col);
    sweep(turn(progress) - distance * 0.15)
}

fn column_sway(_field: &Field, progress: f64, _row: usize, col: usize) -> AnglePair {
    const WAVE_LENGTH: f64 = 5.0;
    const LOW: f64 = -FRAC_PI_4;
    const HIGH: f64 = FRAC_PI_4;
    let column_phase = col as f64 / WAVE_LENGTH * TAU;
    let swing = ((turn(progress) + column_phase).sin() + 1.0) / 2.0;
    let first = LOW + (HIGH - LOW) * swing;
    [first, first + PI]
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::angle::shortest_delta;

    const FIELD: Field = Field { rows: 8, cols: 16 };

    fn close(a: AnglePair, b: AnglePair, tolerance: f64) -> bool {
        a.iter()
            .zip(b)
            .all(|(x, y)| shortest_delta(*x, y).abs() <= tolerance)
    }

    #[test]
    fn keys_follow_registration_order() {
        let library = PatternLibrary::builtin();
        let keys: Vec<_> = library.keys().collect();
        assert_eq!(
            keys,
            vec![
                "fluid_flow",
                "spiral_flow",
                "wave_flow",
                "vortex_flow",
                "chase_light",
                "left_to_right",
                "top_to_bottom",
                "diagonal",
                "corner_spread",
                "center_ripple",
                "column_sway",
            ]
        );
        assert_eq!(library.index_of("diagonal"), Some(7));
        assert_eq!(library.next_index(10), Some(0));
        assert!(library.get("nope").is_none());
    }

    #[test]
    fn duplicate_keys_are_rejected() {
        let mut library = PatternLibrary::new();
        library
            .register(Pattern::new("sway", "Sway", column_sway))
            .unwrap();
        assert!(library
            .register(Pattern::new("sway", "Sway again", diagonal))
            .is_err());
        assert_eq!(library.len(), 1);
        assert_eq!(PatternLibrary::new().next_index(0), None);
    }

    #[test]
    fn fields_wrap_seamlessly() {
        for pattern in PatternLibrary::builtin().iter() {
            for row in 0..FIELD.rows {
                for col in 0..FIELD.cols {
                    let start = (pattern.generator)(&FIELD, 0.0, row, col);
                    let end = (pattern.generator)(&FIELD, 1.0, row, col);
                    assert!(close(start, end, 1e-9), "{} wraps badly", pattern.key);

                    for progress in [0.0, 0.25, 0.625] {
                        assert_eq!(
                            pattern.sample(&FIELD, progress, row, col),
                            pattern.sample(&FIELD, progress + 1.0, row, col)
                        );
                    }
                }
            }
        }
    }

    #[test]
    fn fields_move_continuously_across_the_wrap() {
        for pattern in PatternLibrary::builtin().iter() {
            for (row, col) in [(0, 0), (3, 7), (7, 15), (4, 2)] {
                let before = (pattern.generator)(&FIELD, 0.999, row, col);
                let after = pattern.sample(&FIELD, 1.001, row, col);
                assert!(close(before, after, 0.1), "{} jumps", pattern.key);

                let a = pattern.sample(&FIELD, 0.4, row, col);
                let b = pattern.sample(&FIELD, 0.402, row, col);
                assert!(close(a, b, 0.1), "{} jumps", pattern.key);
            }
        }
    }

    #[test]
    fn needles_never_coincide() {
        for pattern in PatternLibrary::builtin().iter() {
            for step in 0..40 {
                let progress = step as f64 / 40.0;
                for row in 0..FIELD.rows {
                    for col in 0..FIELD.cols {
                        let [first, second] = pattern.sample(&FIELD, progress, row, col);
                        assert!(
                            shortest_delta(first, second).abs() > 0.5,
                            "{} collapses at ({row},{col}) p={progress}",
                            pattern.key
                        );
                    }
                }
            }
        }
    }

    #[test]
    fn loop_progress_wraps_at_period() {
        assert_eq!(loop_progress(0.0, 10_000.0), 0.0);
        assert_eq!(loop_progress(2_500.0, 10_000.0), 0.25);
        assert_eq!(loop_progress(12_500.0, 10_000.0), 0.25);
        assert_eq!(loop_progress(-5.0, 10_000.0), 0.0);
        assert_eq!(loop_progress(100.0, 0.0), 0.0);
    }

    #[test]
    fn centre_tracks_grid_shape() {
        assert_eq!(FIELD.center(), (3.5, 7.5));
        assert_eq!(Field::new(1, 1).center(), (0.0, 0.0));
    }
}

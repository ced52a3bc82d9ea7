//! Angle helpers shared by every moving part of the display.
//!
//! Angles are `f64` radians in surface coordinates: `0` points right and
//! positive values turn clockwise (the y axis grows downwards), so clock
//! position 12 sits at `-π/2`.

use std::f64::consts::{FRAC_PI_2, PI, TAU};

use serde::{Deserialize, Serialize};

/// Orientation every needle returns to when it shows nothing (clock position 8).
///
/// Written with the same arithmetic as [`clock_to_angle`] so that `clock_to_angle(8)`
/// is bit-for-bit the resting angle.
pub const RESTING_ANGLE: f64 = 8.0 * (PI / 6.0) - FRAC_PI_2;

/// Largest clock position kept as written; anything above wraps onto the dial.
pub const MAX_CLOCK_VALUE: u8 = 12;

/// Pair of clock positions, one per needle, e.g. `[3, 9]` for a horizontal bar.
pub type ClockPair = [u8; 2];

/// Target orientation for the two needles of a cell.
pub type AnglePair = [f64; 2];

/// Signed shortest rotation from `from` to `to`, in `(-π, π]`.
///
/// Non-finite inputs yield `0`.
pub fn shortest_delta(from: f64, to: f64) -> f64 {
    let delta = to - from;
    if !delta.is_finite() {
        return 0.0;
    }
    let wrapped = delta.rem_euclid(TAU);
    if wrapped > PI {
        wrapped - TAU
    } else {
        wrapped
    }
}

/// Normalises an angle into `[0, 2π)`.
pub fn normalize(angle: f64) -> f64 {
    let wrapped = angle.rem_euclid(TAU);
    // rem_euclid can round up to exactly TAU for tiny negative inputs.
    if wrapped >= TAU {
        0.0
    } else {
        wrapped
    }
}

/// Converts a clock position (hours, any integer) to a needle angle.
pub fn clock_to_angle(value: u8) -> f64 {
    f64::from(value % 12) * (PI / 6.0) - FRAC_PI_2
}

/// Folds a clock position onto the dial face, keeping `0..=12` unchanged.
/// The angle is the same before and after.
pub fn fold_clock(value: u8) -> u8 {
    if value > MAX_CLOCK_VALUE {
        value % 12
    } else {
        value
    }
}

/// Folds both halves of a pair with [`fold_clock`].
pub fn fold_clock_pair(pair: ClockPair) -> ClockPair {
    [fold_clock(pair[0]), fold_clock(pair[1])]
}

/// Converts both clock positions of a pair.
pub fn clock_pair_to_angles(pair: ClockPair) -> AnglePair {
    [clock_to_angle(pair[0]), clock_to_angle(pair[1])]
}

/// Returns true when two angles describe the same orientation.
pub fn same_orientation(a: f64, b: f64, tolerance: f64) -> bool {
    shortest_delta(a, b).abs() <= tolerance
}

/// Easing curves mapping linear progress onto eased progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Easing {
    /// Constant speed.
    Linear,
    /// Quadratic accelerate then decelerate.
    #[default]
    QuadInOut,
    /// Fast start that settles gently.
    SineOut,
    /// Cubic accelerate then decelerate, used for pattern transitions.
    CubicInOut,
}

impl Easing {
    /// Applies the curve to `t`, clamped to `[0, 1]`.
    pub fn apply(self, t: f64) -> f64 {
        let t = t.clamp(0.0, 1.0);
        match self {
            Self::Linear => t,
            Self::QuadInOut => {
                if t < 0.5 {
                    2.0 * t * t
                } else {
                    1.0 - (-2.0 * t + 2.0).powi(2) / 2.0
                }
            }
            Self::SineOut => (t * FRAC_PI_2).sin(),
            Self::CubicInOut => {
                if t < 0.5 {
                    4.0 * t * t * t
                } else {
                    1.0 - (-2.0 * t + 2.0).powi(3) / 2.0
                }
            }
        }
    }
}

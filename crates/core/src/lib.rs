//! Core library for the Needle Matrix display.
//!
//! A grid of dials, each with two needles, that spells out text from a glyph table
//! or plays continuous angle-field patterns. Everything here is headless: time is
//! passed in as milliseconds and drawing goes through the [`render::Surface`] trait,
//! so hosts decide how frames reach the screen.

pub mod angle;
pub mod animator;
pub mod config;
pub mod engine;
pub mod error;
pub mod glyph;
pub mod grid;
pub mod marks;
pub mod needle;
pub mod pattern;
pub mod render;
pub mod sequence;
pub mod timeline;
pub mod transition;

pub use angle::{clock_to_angle, shortest_delta, AnglePair, ClockPair, Easing, RESTING_ANGLE};
pub use animator::Animator;
pub use config::{AppConfig, GridConfig, SequenceConfig, TextConfig};
pub use engine::{Mode, NeedleMatrix, StopMode};
pub use error::{NeedleMatrixError, Result};
pub use glyph::{Alignment, GlyphMatrix, GlyphRasterizer, GlyphTable, RasterReport};
pub use grid::{Cell, Grid, GridPos};
pub use marks::{parse_debug_text, DebugEntry, MarkedPositions};
pub use needle::{Motion, NeedleState};
pub use pattern::{Field, Pattern, PatternLibrary};
pub use render::{DrawCommand, DrawList, Point, RenderStyle, Renderer, Surface};
pub use sequence::{AutoSequencer, Content};
pub use timeline::PlaybackClock;
pub use transition::{PatternTiming, Transitioner};

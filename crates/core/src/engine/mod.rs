//! The frame driver that owns the grid.
//!
//! All mutation goes through [`NeedleMatrix`], which is the single writer of the
//! grid. It runs in one of two driving modes: point-to-point moves (text, manual
//! edits), where idle frames are skipped, or a live pattern, where every frame is
//! recomputed. Entering one mode halts the other first.

use crate::{
    angle::{clock_pair_to_angles, fold_clock_pair, ClockPair},
    animator::Animator,
    config::AppConfig,
    glyph::{Alignment, GlyphRasterizer, GlyphTable, RasterReport},
    grid::{Grid, GridPos, NEEDLES_PER_CELL},
    marks::{parse_debug_text, MarkedPositions},
    pattern::PatternLibrary,
    render::{Renderer, Surface},
    sequence::{AutoSequencer, Content},
    transition::Transitioner,
    Result,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Nothing displayed; needles may still be settling from manual edits.
    Idle,
    /// Text or marked cells shown with point-to-point moves.
    Text,
    /// A live pattern drives every needle.
    Pattern,
}

/// What happens to the needles when playback stops.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopMode {
    /// Keep every needle where it is right now.
    Freeze,
    /// Snap every needle back to rest and forget all marks.
    Reset,
}

#[derive(Debug)]
pub struct NeedleMatrix {
    grid: Grid,
    marks: MarkedPositions,
    animator: Animator,
    transitioner: Transitioner,
    rasterizer: GlyphRasterizer,
    renderer: Renderer,
    sequencer: Option<AutoSequencer>,
    alignment: Alignment,
    dwell_ms: f64,
    mode: Mode,
    dirty: bool,
}

impl NeedleMatrix {
    /// Builds a display with the built-in pattern library.
    pub fn new(config: &AppConfig, glyphs: GlyphTable) -> Result<Self> {
        Self::with_library(config, glyphs, PatternLibrary::builtin())
    }

    pub fn with_library(
        config: &AppConfig,
        glyphs: GlyphTable,
        library: PatternLibrary,
    ) -> Result<Self> {
        config.validate()?;
        let grid = Grid::new(config.grid.rows, config.grid.cols, config.grid.cell_size)?;
        tracing::info!(
            rows = grid.rows(),
            cols = grid.cols(),
            patterns = library.len(),
            glyphs = glyphs.len(),
            "needle matrix ready"
        );
        Ok(Self {
            grid,
            marks: MarkedPositions::new(),
            animator: Animator::new(config.motion),
            transitioner: Transitioner::new(library, config.patterns),
            rasterizer: GlyphRasterizer::new(glyphs),
            renderer: Renderer::new(config.render),
            sequencer: None,
            alignment: config.text.alignment,
            dwell_ms: config.sequence.dwell_ms,
            mode: Mode::Idle,
            dirty: true,
        })
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn marks(&self) -> &MarkedPositions {
        &self.marks
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn patterns(&self) -> &PatternLibrary {
        self.transitioner.library()
    }

    pub fn glyphs(&self) -> &GlyphTable {
        self.rasterizer.table()
    }

    pub fn active_pattern(&self) -> Option<&'static str> {
        self.transitioner.active_key()
    }

    /// Playlist entry on screen while a sequence runs.
    pub fn current_content(&self) -> Option<&Content> {
        self.sequencer.as_ref().and_then(AutoSequencer::current)
    }

    /// True when no pattern plays and no needle is moving.
    pub fn is_settled(&self) -> bool {
        self.mode != Mode::Pattern && !self.grid.cells().iter().any(|cell| cell.is_animating())
    }

    /// Rebuilds the grid. Marks and any playing pattern are dropped with the old cells.
    pub fn resize(&mut self, rows: usize, cols: usize, cell_size: f64) -> Result<()> {
        self.grid.resize(rows, cols, cell_size)?;
        self.transitioner.stop();
        self.marks.clear();
        self.mode = Mode::Idle;
        self.dirty = true;
        Ok(())
    }

    /// Animates a single needle. Out-of-range addresses are ignored.
    pub fn set_needle(&mut self, pos: GridPos, needle: usize, angle: f64, now: f64) -> bool {
        if needle >= NEEDLES_PER_CELL || !self.grid.contains(pos) {
            tracing::debug!(?pos, needle, "ignoring needle outside the grid");
            return false;
        }
        self.leave_pattern_mode();
        if let Some(cell) = self.grid.cell_mut(pos) {
            cell.needles[needle].set_target(angle, now);
        }
        self.dirty = true;
        true
    }

    /// Records a clock pair for a cell and animates both needles to it. Values
    /// above 12 are folded onto the dial before they are stored.
    pub fn mark(&mut self, pos: GridPos, pair: ClockPair, now: f64) -> bool {
        let pair = fold_clock_pair(pair);
        let Some(cell) = self.grid.cell_mut(pos) else {
            tracing::debug!(?pos, "ignoring mark outside the grid");
            return false;
        };
        cell.set_targets(clock_pair_to_angles(pair), now);
        self.marks.insert(pos, pair);
        self.leave_pattern_mode();
        self.mode = Mode::Text;
        self.dirty = true;
        true
    }

    /// Clears a cell's mark and snaps it back to rest.
    pub fn unmark(&mut self, pos: GridPos) -> bool {
        let Some(cell) = self.grid.cell_mut(pos) else {
            return false;
        };
        cell.reset_to_default();
        self.marks.remove(pos);
        self.dirty = true;
        true
    }

    /// Shows `text` with the configured alignment.
    pub fn show_text(&mut self, text: &str, now: f64) -> RasterReport {
        self.show_text_aligned(text, self.alignment, now)
    }

    pub fn show_text_aligned(&mut self, text: &str, alignment: Alignment, now: f64) -> RasterReport {
        self.leave_pattern_mode();
        let report = self
            .rasterizer
            .apply(text, alignment, &mut self.grid, &mut self.marks, now);
        self.mode = if self.marks.is_empty() {
            Mode::Idle
        } else {
            Mode::Text
        };
        self.dirty = true;
        report
    }

    /// Starts a pattern from the current pose. Unknown keys change nothing.
    pub fn play_pattern(&mut self, key: &str, now: f64) -> bool {
        if self.patterns().get(key).is_none() {
            tracing::warn!(key, "unknown pattern; keeping current mode");
            return false;
        }
        // Moves in flight stop where they are so the snapshot is what is on screen.
        self.grid.freeze_all();
        self.marks.clear();
        let started = self.transitioner.select(key, &self.grid, now);
        if started {
            self.mode = Mode::Pattern;
            self.dirty = true;
        }
        started
    }

    pub fn set_auto_cycle(&mut self, enabled: bool) {
        self.transitioner.set_auto_cycle(enabled);
    }

    /// Starts cycling through `playlist`, showing its first entry right away.
    pub fn start_sequence(&mut self, playlist: Vec<Content>, now: f64) -> bool {
        let mut sequencer = AutoSequencer::new(playlist, self.dwell_ms);
        let first = sequencer.start(now).cloned();
        self.sequencer = Some(sequencer);
        match first {
            Some(content) => {
                self.dispatch(content, now);
                true
            }
            None => {
                self.sequencer = None;
                false
            }
        }
    }

    pub fn stop_sequence(&mut self) {
        self.sequencer = None;
    }

    /// Halts the sequence, any pattern and any needle in flight.
    pub fn stop(&mut self, how: StopMode) {
        self.sequencer = None;
        match how {
            StopMode::Freeze => {
                self.transitioner.stop();
                self.grid.freeze_all();
                self.mode = Mode::Idle;
                self.dirty = true;
            }
            StopMode::Reset => self.reset_needles(),
        }
    }

    /// Snaps every needle to rest and forgets all marks. A running sequence keeps
    /// going and shows its next entry on schedule.
    pub fn reset_needles(&mut self) {
        self.transitioner.stop();
        self.grid.reset_all();
        self.marks.clear();
        self.mode = Mode::Idle;
        self.dirty = true;
    }

    /// Advances everything to `now`. Returns true when the surface needs a redraw;
    /// the host keeps scheduling frames while this is true and may idle otherwise.
    pub fn tick(&mut self, now: f64) -> bool {
        let mut redraw = std::mem::take(&mut self.dirty);

        let due = self
            .sequencer
            .as_mut()
            .and_then(|sequencer| sequencer.poll(now))
            .cloned();
        if let Some(content) = due {
            self.dispatch(content, now);
            redraw = true;
        }

        let moved = match self.mode {
            Mode::Pattern => self.transitioner.tick(&mut self.grid, now),
            Mode::Idle | Mode::Text => {
                // The frame a move lands on still has to be drawn.
                let was_moving = self.grid.cells().iter().any(|cell| cell.is_animating());
                self.animator.step_all(&mut self.grid, now);
                was_moving
            }
        };
        self.dirty = false;
        redraw || moved
    }

    /// Renders the current needle angles.
    pub fn draw(&mut self, surface: &mut dyn Surface) -> Result<()> {
        self.renderer.draw(&self.grid, surface)
    }

    /// Plain-text dump of the marks, one line per grid row.
    pub fn export_debug(&self) -> String {
        self.marks.to_debug_text(self.grid.rows(), self.grid.cols())
    }

    /// Applies a dump produced by [`Self::export_debug`] (or edited by hand).
    ///
    /// Addressed cells jump straight to their pair, `[--,--]` cells return to rest,
    /// and cells the text does not mention keep both their needles and their mark.
    /// Returns the number of cells touched.
    pub fn import_debug(&mut self, text: &str) -> usize {
        self.leave_pattern_mode();
        let mut applied = 0;
        for entry in parse_debug_text(text) {
            let Some(cell) = self.grid.cell_mut(entry.pos) else {
                continue;
            };
            match entry.pair {
                Some(pair) => {
                    let pair = fold_clock_pair(pair);
                    cell.place(clock_pair_to_angles(pair));
                    self.marks.insert(entry.pos, pair);
                }
                None => {
                    cell.reset_to_default();
                    self.marks.remove(entry.pos);
                }
            }
            applied += 1;
        }
        self.mode = if self.marks.is_empty() {
            Mode::Idle
        } else {
            Mode::Text
        };
        self.dirty = true;
        tracing::debug!(applied, marks = self.marks.len(), "debug grid imported");
        applied
    }

    fn dispatch(&mut self, content: Content, now: f64) {
        tracing::info!(?content, "showing playlist entry");
        match content {
            Content::Pattern(key) => {
                self.play_pattern(&key, now);
            }
            Content::Text(text) => {
                self.show_text(&text, now);
            }
        }
    }

    fn leave_pattern_mode(&mut self) {
        if self.mode == Mode::Pattern {
            self.transitioner.stop();
            self.mode = Mode::Idle;
        }
    }
}

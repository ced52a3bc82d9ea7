//! Text rendering on the needle grid.
//!
//! Glyphs come from an external table mapping characters to a 6-row block of clock
//! pairs (`[h1, h2]`, either half may be `null` to leave the cell alone). Narrow
//! glyphs such as `:` are one column wide, everything else three.

use std::{
    collections::{BTreeMap, BTreeSet, HashMap},
    path::Path,
};

use serde::{Deserialize, Serialize};

use crate::{
    angle::{clock_pair_to_angles, ClockPair, MAX_CLOCK_VALUE},
    grid::{Grid, GridPos},
    marks::MarkedPositions,
    NeedleMatrixError, Result,
};

/// Rows in every glyph.
pub const GLYPH_HEIGHT: usize = 6;

/// One glyph cell as stored in the table.
pub type GlyphCell = [Option<u8>; 2];

/// A validated `GLYPH_HEIGHT × width` block of glyph cells.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GlyphMatrix {
    rows: Vec<Vec<GlyphCell>>,
}

impl GlyphMatrix {
    pub fn new(label: &str, rows: Vec<Vec<GlyphCell>>) -> Result<Self> {
        if rows.len() != GLYPH_HEIGHT {
            return Err(NeedleMatrixError::glyph(
                label,
                format!("expected {GLYPH_HEIGHT} rows, found {}", rows.len()),
            ));
        }
        let width = rows[0].len();
        if width == 0 {
            return Err(NeedleMatrixError::glyph(label, "rows are empty"));
        }
        if rows.iter().any(|row| row.len() != width) {
            return Err(NeedleMatrixError::glyph(label, "rows differ in width"));
        }
        let out_of_range = rows
            .iter()
            .flatten()
            .flatten()
            .flatten()
            .find(|value| **value > MAX_CLOCK_VALUE);
        if let Some(value) = out_of_range {
            return Err(NeedleMatrixError::glyph(
                label,
                format!("clock value {value} is above {MAX_CLOCK_VALUE}"),
            ));
        }
        Ok(Self { rows })
    }

    pub fn width(&self) -> usize {
        self.rows[0].len()
    }

    pub fn height(&self) -> usize {
        self.rows.len()
    }

    /// Cells carrying a complete clock pair, as `(row, col, pair)`.
    pub fn assigned(&self) -> impl Iterator<Item = (usize, usize, ClockPair)> + '_ {
        self.rows.iter().enumerate().flat_map(|(row, cells)| {
            cells.iter().enumerate().filter_map(move |(col, cell)| match cell {
                [Some(first), Some(second)] => Some((row, col, [*first, *second])),
                _ => None,
            })
        })
    }
}

/// Character → glyph lookup, loaded once and then treated as read-only.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GlyphTable {
    glyphs: BTreeMap<char, GlyphMatrix>,
}

impl GlyphTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses a JSON object of single-character keys to glyph rows.
    ///
    /// Keys longer than one character are skipped; a badly shaped glyph fails the
    /// whole load so a half-valid table never reaches the display.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let raw: HashMap<String, Vec<Vec<GlyphCell>>> = serde_json::from_str(json)?;
        let mut table = Self::new();
        for (key, rows) in raw {
            let mut chars = key.chars();
            match (chars.next(), chars.next()) {
                (Some(ch), None) => {
                    table.insert(ch, GlyphMatrix::new(&key, rows)?);
                }
                _ => tracing::warn!(key = %key, "ignoring glyph key that is not a single character"),
            }
        }
        tracing::debug!(glyphs = table.len(), "glyph table parsed");
        Ok(table)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let json = std::fs::read_to_string(path.as_ref())?;
        Self::from_json_str(&json)
    }

    pub fn insert(&mut self, ch: char, glyph: GlyphMatrix) -> Option<GlyphMatrix> {
        self.glyphs.insert(ch, glyph)
    }

    /// Adds glyphs from `other` for characters this table does not define yet.
    pub fn with_fallback(mut self, other: GlyphTable) -> Self {
        for (ch, glyph) in other.glyphs {
            self.glyphs.entry(ch).or_insert(glyph);
        }
        self
    }

    /// Exact match first, then the lowercase form.
    pub fn lookup(&self, ch: char) -> Option<&GlyphMatrix> {
        self.glyphs.get(&ch).or_else(|| {
            ch.to_lowercase()
                .next()
                .and_then(|lower| self.glyphs.get(&lower))
        })
    }

    pub fn chars(&self) -> impl Iterator<Item = char> + '_ {
        self.glyphs.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.glyphs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.glyphs.is_empty()
    }
}

/// Horizontal placement of a line of text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Alignment {
    /// Centred columns; used for numbers and clock faces.
    Centered,
    /// Starts at column 0; used for alphabetic banners.
    LeftAnchored,
    /// Left-anchored when the text starts with a letter, centred otherwise.
    #[default]
    Auto,
}

impl Alignment {
    fn resolve(self, first: Option<char>) -> Self {
        match self {
            Self::Auto if first.is_some_and(char::is_alphabetic) => Self::LeftAnchored,
            Self::Auto => Self::Centered,
            other => other,
        }
    }
}

/// A clock pair assigned to a grid cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Placement {
    pub pos: GridPos,
    pub pair: ClockPair,
}

/// Where a string lands on a grid.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TextLayout {
    pub placements: Vec<Placement>,
    /// Characters with no glyph; they take up no columns.
    pub skipped: Vec<char>,
    pub start_row: usize,
    pub start_col: usize,
    pub width: usize,
}

/// Outcome of applying a string to a grid.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RasterReport {
    pub assigned: usize,
    pub reset: usize,
    pub skipped: Vec<char>,
}

#[derive(Debug, Clone, Default)]
pub struct GlyphRasterizer {
    table: GlyphTable,
}

impl GlyphRasterizer {
    pub fn new(table: GlyphTable) -> Self {
        Self { table }
    }

    pub fn table(&self) -> &GlyphTable {
        &self.table
    }

    /// Computes the cells `text` covers on a `rows × cols` grid. Cells falling
    /// outside the grid are dropped.
    pub fn layout(&self, text: &str, alignment: Alignment, rows: usize, cols: usize) -> TextLayout {
        let chars: Vec<char> = text.chars().filter(|c| !c.is_whitespace()).collect();
        let mut layout = TextLayout::default();

        let glyphs: Vec<&GlyphMatrix> = chars
            .iter()
            .filter_map(|&ch| {
                let glyph = self.table.lookup(ch);
                if glyph.is_none() {
                    layout.skipped.push(ch);
                }
                glyph
            })
            .collect();

        layout.width = glyphs.iter().map(|glyph| glyph.width()).sum();
        layout.start_col = match alignment.resolve(chars.first().copied()) {
            Alignment::LeftAnchored => 0,
            _ => cols.saturating_sub(layout.width) / 2,
        };
        layout.start_row = rows.saturating_sub(GLYPH_HEIGHT) / 2;

        let mut cursor = layout.start_col;
        for glyph in glyphs {
            for (local_row, local_col, pair) in glyph.assigned() {
                let pos = GridPos::new(layout.start_row + local_row, cursor + local_col);
                if pos.row < rows && pos.col < cols {
                    layout.placements.push(Placement { pos, pair });
                }
            }
            cursor += glyph.width();
        }
        layout
    }

    /// Animates the grid towards `text` and records it in `marks`.
    ///
    /// The cells active before the call are taken from the needles' intended
    /// targets, so in-flight moves from a previous string count without waiting for
    /// them to land. Any of those cells the new text does not cover snap back to
    /// rest and lose their mark.
    pub fn apply(
        &self,
        text: &str,
        alignment: Alignment,
        grid: &mut Grid,
        marks: &mut MarkedPositions,
        now: f64,
    ) -> RasterReport {
        let before: BTreeSet<GridPos> = grid
            .active_positions()
            .into_iter()
            .chain(marks.positions())
            .collect();

        let layout = self.layout(text, alignment, grid.rows(), grid.cols());
        let mut after = BTreeSet::new();
        for placement in &layout.placements {
            if let Some(cell) = grid.cell_mut(placement.pos) {
                cell.set_targets(clock_pair_to_angles(placement.pair), now);
                marks.insert(placement.pos, placement.pair);
                after.insert(placement.pos);
            }
        }

        let mut reset = 0;
        for pos in before.difference(&after) {
            if let Some(cell) = grid.cell_mut(*pos) {
                cell.reset_to_default();
                reset += 1;
            }
        }
        marks.retain(|pos| after.contains(&pos));

        if !layout.skipped.is_empty() {
            tracing::debug!(skipped = ?layout.skipped, "characters without glyphs");
        }
        tracing::debug!(text, assigned = after.len(), reset, "text applied");

        RasterReport {
            assigned: after.len(),
            reset,
            skipped: layout.skipped,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use pretty_assertions::assert_eq;

    use super::*;
    use crate::angle::{clock_to_angle, RESTING_ANGLE};

    const BAR: GlyphCell = [Some(3), Some(9)];
    const POST: GlyphCell = [Some(12), Some(6)];
    const NONE: GlyphCell = [None, None];

    fn wide(cell: GlyphCell) -> Vec<Vec<GlyphCell>> {
        vec![vec![cell; 3]; GLYPH_HEIGHT]
    }

    fn table() -> GlyphTable {
        let mut table = GlyphTable::new();
        table.insert('1', GlyphMatrix::new("1", wide(POST)).unwrap());
        table.insert('2', GlyphMatrix::new("2", wide(BAR)).unwrap());
        let mut colon = vec![vec![NONE]; GLYPH_HEIGHT];
        colon[1][0] = [Some(6), Some(6)];
        colon[4][0] = [Some(12), Some(12)];
        table.insert(':', GlyphMatrix::new(":", colon).unwrap());
        table.insert('a', GlyphMatrix::new("a", wide(BAR)).unwrap());
        table
    }

    #[test]
    fn rejects_badly_shaped_glyphs() {
        assert!(GlyphMatrix::new("x", vec![vec![BAR; 3]; 5]).is_err());
        assert!(GlyphMatrix::new("x", vec![vec![]; GLYPH_HEIGHT]).is_err());
        let mut ragged = wide(BAR);
        ragged[2].pop();
        let err = GlyphMatrix::new("x", ragged).unwrap_err();
        assert!(format!("{err}").contains("glyph `x`"));
    }

    #[test]
    fn rejects_clock_values_off_the_dial() {
        let mut rows = wide(BAR);
        rows[3][1] = [Some(100), Some(5)];
        let err = GlyphMatrix::new("x", rows).unwrap_err();
        assert!(matches!(err, NeedleMatrixError::InvalidGlyph { .. }));
        assert!(format!("{err}").contains("100"));

        let mut edge = wide(NONE);
        edge[0][0] = [Some(0), Some(12)];
        assert!(GlyphMatrix::new("x", edge).is_ok());

        let json = r#"{"9": [[[13,1]],[[1,1]],[[1,1]],[[1,1]],[[1,1]],[[1,1]]]}"#;
        assert!(matches!(
            GlyphTable::from_json_str(json),
            Err(NeedleMatrixError::InvalidGlyph { .. })
        ));
    }

    #[test]
    fn half_assigned_cells_are_left_alone() {
        let mut rows = wide(NONE);
        rows[0][0] = [Some(3), None];
        rows[5][2] = [Some(1), Some(2)];
        let glyph = GlyphMatrix::new("g", rows).unwrap();
        assert_eq!(glyph.assigned().collect::<Vec<_>>(), vec![(5, 2, [1, 2])]);
    }

    #[test]
    fn loads_json_tables_and_skips_long_keys() {
        let json = r#"{
            "7": [[[3,9],[3,9],[9,6]],[[null,null],[null,null],[12,6]],
                  [[null,null],[null,null],[12,6]],[[null,null],[null,null],[12,6]],
                  [[null,null],[null,null],[12,6]],[[null,null],[null,null],[12,12]]],
            "ab": []
        }"#;
        let table = GlyphTable::from_json_str(json).unwrap();
        assert_eq!(table.len(), 1);
        assert_eq!(table.lookup('7').unwrap().width(), 3);
        assert_eq!(table.lookup('7').unwrap().assigned().count(), 8);
    }

    #[test]
    fn bad_tables_fail_to_load() {
        assert!(matches!(
            GlyphTable::from_json_str("{not json"),
            Err(NeedleMatrixError::Json(_))
        ));
        assert!(matches!(
            GlyphTable::from_json_str(r#"{"1": [[[1,1]]]}"#),
            Err(NeedleMatrixError::InvalidGlyph { .. })
        ));
    }

    #[test]
    fn loads_tables_from_disk() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        let rows = serde_json::to_string(&wide(BAR)).unwrap();
        write!(file, "{{\"-\": {rows}}}").unwrap();

        let table = GlyphTable::from_path(file.path()).unwrap();
        assert!(table.lookup('-').is_some());
        assert!(GlyphTable::from_path(file.path().with_extension("missing")).is_err());
    }

    #[test]
    fn lookup_falls_back_to_lowercase_and_tables_merge() {
        let table = table();
        assert!(table.lookup('A').is_some());
        assert!(table.lookup('b').is_none());

        let mut extra = GlyphTable::new();
        extra.insert('b', GlyphMatrix::new("b", wide(POST)).unwrap());
        extra.insert('1', GlyphMatrix::new("1", wide(BAR)).unwrap());
        let merged = table.with_fallback(extra);
        assert!(merged.lookup('b').is_some());
        assert_eq!(merged.lookup('1').unwrap().assigned().next().unwrap().2, [12, 6]);
        assert_eq!(merged.chars().collect::<String>(), "12:ab");
    }

    #[test]
    fn centred_layout_counts_glyph_widths() {
        let rasterizer = GlyphRasterizer::new(table());
        let layout = rasterizer.layout("12:1", Alignment::Auto, 8, 16);
        assert_eq!(layout.width, 10);
        assert_eq!((layout.start_row, layout.start_col), (1, 3));

        let colon_cols: BTreeSet<_> = layout
            .placements
            .iter()
            .filter(|p| p.pair == [6, 6] || p.pair == [12, 12])
            .map(|p| p.pos.col)
            .collect();
        assert_eq!(colon_cols, BTreeSet::from([9]));
        assert!(layout.placements.iter().any(|p| p.pos == GridPos::new(6, 12)));
    }

    #[test]
    fn letters_anchor_left_and_unknown_characters_take_no_space() {
        let rasterizer = GlyphRasterizer::new(table());
        let layout = rasterizer.layout("a ?1", Alignment::Auto, 6, 16);
        assert_eq!(layout.skipped, vec!['?']);
        assert_eq!((layout.start_row, layout.start_col), (0, 0));
        assert_eq!(layout.width, 6);
        let max_col = layout.placements.iter().map(|p| p.pos.col).max();
        assert_eq!(max_col, Some(5));

        let forced = rasterizer.layout("a", Alignment::Centered, 6, 9);
        assert_eq!(forced.start_col, 3);
    }

    #[test]
    fn overflowing_text_is_clipped() {
        let rasterizer = GlyphRasterizer::new(table());
        let layout = rasterizer.layout("1212", Alignment::Centered, 4, 5);
        assert_eq!((layout.start_row, layout.start_col), (0, 0));
        assert!(layout
            .placements
            .iter()
            .all(|p| p.pos.row < 4 && p.pos.col < 5));
        assert_eq!(layout.placements.len(), 4 * 5);
    }

    #[test]
    fn apply_animates_towards_glyph_angles() {
        let rasterizer = GlyphRasterizer::new(table());
        let mut grid = Grid::new(8, 16, 10.0).unwrap();
        let mut marks = MarkedPositions::new();

        let report = rasterizer.apply("1", Alignment::Auto, &mut grid, &mut marks, 0.0);
        assert_eq!(report.assigned, 18);
        assert_eq!(marks.len(), 18);

        let cell = grid.cell(GridPos::new(1, 6)).unwrap();
        assert!(cell.is_animating());
        assert_eq!(cell.angles(), [RESTING_ANGLE; 2]);
        assert_eq!(cell.needles[0].target(), clock_to_angle(12));
        assert_eq!(cell.needles[1].target(), clock_to_angle(6));
    }

    #[test]
    fn shorter_text_resets_leftover_cells() {
        let rasterizer = GlyphRasterizer::new(table());
        let mut grid = Grid::new(8, 16, 10.0).unwrap();
        let mut marks = MarkedPositions::new();

        rasterizer.apply("12", Alignment::Auto, &mut grid, &mut marks, 0.0);
        let report = rasterizer.apply("1", Alignment::Auto, &mut grid, &mut marks, 100.0);
        assert_eq!(report.assigned, 18);
        assert_eq!(report.reset, 18);
        assert_eq!(grid.active_positions().len(), 18);
        assert_eq!(marks.len(), 18);
    }

    #[test]
    fn empty_text_clears_everything() {
        let rasterizer = GlyphRasterizer::new(table());
        let mut grid = Grid::new(8, 16, 10.0).unwrap();
        let mut marks = MarkedPositions::new();

        rasterizer.apply("12", Alignment::Auto, &mut grid, &mut marks, 0.0);
        assert_eq!(marks.len(), 36);

        let report = rasterizer.apply("", Alignment::Auto, &mut grid, &mut marks, 10.0);
        assert_eq!(report.reset, 36);
        assert!(marks.is_empty());
        assert!(grid
            .cells()
            .iter()
            .all(|cell| cell.angles() == [RESTING_ANGLE; 2] && !cell.is_animating()));
    }
}

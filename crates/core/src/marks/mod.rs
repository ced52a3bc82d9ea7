//! Ledger of what each addressed cell is meant to show, plus the plain-text grid
//! dump used for debugging and hand-editing layouts.
//!
//! The dump is one line per grid row with one `[h1,h2]` token per column. Values are
//! clock positions right-aligned to two characters, and `[--,--]` marks an empty cell:
//!
//! ```text
//! [ 3, 9] [--,--]
//! [12, 6] [ 6, 6]
//! ```

use std::{
    collections::BTreeMap,
    fmt::Write as _,
    sync::OnceLock,
};

use regex::Regex;

use crate::{angle::ClockPair, grid::GridPos};

/// Sparse map from cell to the clock pair it displays.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MarkedPositions {
    entries: BTreeMap<GridPos, ClockPair>,
}

impl MarkedPositions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, pos: GridPos, pair: ClockPair) -> Option<ClockPair> {
        self.entries.insert(pos, pair)
    }

    pub fn remove(&mut self, pos: GridPos) -> Option<ClockPair> {
        self.entries.remove(&pos)
    }

    pub fn get(&self, pos: GridPos) -> Option<ClockPair> {
        self.entries.get(&pos).copied()
    }

    pub fn contains(&self, pos: GridPos) -> bool {
        self.entries.contains_key(&pos)
    }

    pub fn retain(&mut self, mut keep: impl FnMut(GridPos) -> bool) {
        self.entries.retain(|pos, _| keep(*pos));
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (GridPos, ClockPair)> + '_ {
        self.entries.iter().map(|(pos, pair)| (*pos, *pair))
    }

    pub fn positions(&self) -> impl Iterator<Item = GridPos> + '_ {
        self.entries.keys().copied()
    }

    /// Entries keyed as `"row,col"` strings.
    pub fn keyed(&self) -> BTreeMap<String, ClockPair> {
        self.iter()
            .map(|(pos, pair)| (format!("{},{}", pos.row, pos.col), pair))
            .collect()
    }

    /// Renders a `rows × cols` dump of the ledger.
    pub fn to_debug_text(&self, rows: usize, cols: usize) -> String {
        let mut text = String::new();
        for row in 0..rows {
            let line = (0..cols)
                .map(|col| match self.get(GridPos::new(row, col)) {
                    Some([first, second]) => format!("[{first:>2},{second:>2}]"),
                    None => "[--,--]".to_string(),
                })
                .collect::<Vec<_>>()
                .join(" ");
            let _ = writeln!(text, "{}", line.trim_end());
        }
        text
    }
}

/// One token read back from a dump.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DebugEntry {
    pub pos: GridPos,
    /// `None` when either half of the token was `--`.
    pub pair: Option<ClockPair>,
}

fn token_pattern() -> &'static Regex {
    static TOKEN: OnceLock<Regex> = OnceLock::new();
    TOKEN.get_or_init(|| {
        Regex::new(r"\[(\d{1,2}|--),(\d{1,2}|--)\]").expect("token pattern is valid")
    })
}

/// Reads a dump back, best effort.
///
/// Whitespace is ignored, lines without tokens are skipped, and a line holding only
/// a number starts a new block from row 0.
pub fn parse_debug_text(text: &str) -> Vec<DebugEntry> {
    let mut entries = Vec::new();
    let mut row = 0;

    for line in text.lines().map(str::trim).filter(|line| !line.is_empty()) {
        if line.chars().all(|c| c.is_ascii_digit()) {
            row = 0;
            continue;
        }

        let compact: String = line.chars().filter(|c| !c.is_whitespace()).collect();
        let before = entries.len();
        for (col, captures) in token_pattern().captures_iter(&compact).enumerate() {
            let first = captures[1].parse::<u8>().ok();
            let second = captures[2].parse::<u8>().ok();
            entries.push(DebugEntry {
                pos: GridPos::new(row, col),
                pair: first.zip(second).map(|(a, b)| [a, b]),
            });
        }

        if entries.len() > before {
            row += 1;
        } else {
            tracing::debug!(line, "skipping unparseable debug line");
        }
    }
    entries
}

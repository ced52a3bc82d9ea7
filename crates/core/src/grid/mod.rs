use serde::{Deserialize, Serialize};

use crate::{
    angle::AnglePair,
    needle::NeedleState,
    NeedleMatrixError, Result,
};

/// Needles carried by every cell.
pub const NEEDLES_PER_CELL: usize = 2;

/// Needle length relative to the cell size.
const NEEDLE_LENGTH_RATIO: f64 = 0.3;

/// Row/column address of a cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct GridPos {
    pub row: usize,
    pub col: usize,
}

impl GridPos {
    pub const fn new(row: usize, col: usize) -> Self {
        Self { row, col }
    }
}

/// One dial: a fixed centre on the surface and two needles.
#[derive(Debug, Clone, PartialEq)]
pub struct Cell {
    pub x: f64,
    pub y: f64,
    pub size: f64,
    pub needles: [NeedleState; NEEDLES_PER_CELL],
}

impl Cell {
    fn new(pos: GridPos, size: f64) -> Self {
        let length = size * NEEDLE_LENGTH_RATIO;
        Self {
            x: pos.col as f64 * size + size / 2.0,
            y: pos.row as f64 * size + size / 2.0,
            size,
            needles: [NeedleState::new(length), NeedleState::new(length)],
        }
    }

    /// Currently shown angles of both needles.
    pub fn angles(&self) -> AnglePair {
        [self.needles[0].angle(), self.needles[1].angle()]
    }

    /// Animates both needles towards `targets`.
    pub fn set_targets(&mut self, targets: AnglePair, now: f64) {
        for (needle, target) in self.needles.iter_mut().zip(targets) {
            needle.set_target(target, now);
        }
    }

    /// Shows `angles` immediately.
    pub fn place(&mut self, angles: AnglePair) {
        for (needle, angle) in self.needles.iter_mut().zip(angles) {
            needle.place(angle);
        }
    }

    pub fn freeze(&mut self) {
        self.needles.iter_mut().for_each(NeedleState::freeze);
    }

    /// Snaps every needle back to the resting angle without a transition.
    pub fn reset_to_default(&mut self) {
        self.needles.iter_mut().for_each(NeedleState::reset_to_default);
    }

    /// A cell is active when any needle shows or is heading somewhere other than rest.
    pub fn is_active(&self) -> bool {
        self.needles.iter().any(|needle| !needle.is_at_rest())
    }

    pub fn is_animating(&self) -> bool {
        self.needles.iter().any(NeedleState::is_animating)
    }
}

/// Rectangular collection of cells stored row-major.
#[derive(Debug, Clone)]
pub struct Grid {
    rows: usize,
    cols: usize,
    cell_size: f64,
    cells: Vec<Cell>,
}

impl Grid {
    pub fn new(rows: usize, cols: usize, cell_size: f64) -> Result<Self> {
        validate(rows, cols, cell_size)?;
        Ok(Self {
            rows,
            cols,
            cell_size,
            cells: build_cells(rows, cols, cell_size),
        })
    }

    /// Replaces every cell. Nothing survives a resize; all needles start at rest.
    pub fn resize(&mut self, rows: usize, cols: usize, cell_size: f64) -> Result<()> {
        validate(rows, cols, cell_size)?;
        self.rows = rows;
        self.cols = cols;
        self.cell_size = cell_size;
        self.cells = build_cells(rows, cols, cell_size);
        tracing::debug!(rows, cols, cell_size, "grid rebuilt");
        Ok(())
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn cell_size(&self) -> f64 {
        self.cell_size
    }

    /// Surface extent covered by the grid.
    pub fn surface_size(&self) -> (f64, f64) {
        (
            self.cols as f64 * self.cell_size,
            self.rows as f64 * self.cell_size,
        )
    }

    pub fn contains(&self, pos: GridPos) -> bool {
        pos.row < self.rows && pos.col < self.cols
    }

    pub fn cell(&self, pos: GridPos) -> Option<&Cell> {
        self.index(pos).map(|index| &self.cells[index])
    }

    pub fn cell_mut(&mut self, pos: GridPos) -> Option<&mut Cell> {
        self.index(pos).map(move |index| &mut self.cells[index])
    }

    /// Cells with their addresses in row-major order.
    pub fn iter(&self) -> impl Iterator<Item = (GridPos, &Cell)> + '_ {
        let cols = self.cols;
        self.cells
            .iter()
            .enumerate()
            .map(move |(index, cell)| (GridPos::new(index / cols, index % cols), cell))
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (GridPos, &mut Cell)> + '_ {
        let cols = self.cols;
        self.cells
            .iter_mut()
            .enumerate()
            .map(move |(index, cell)| (GridPos::new(index / cols, index % cols), cell))
    }

    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    pub fn cells_mut(&mut self) -> &mut [Cell] {
        &mut self.cells
    }

    pub fn reset_all(&mut self) {
        self.cells.iter_mut().for_each(Cell::reset_to_default);
    }

    pub fn freeze_all(&mut self) {
        self.cells.iter_mut().for_each(Cell::freeze);
    }

    /// Addresses of every active cell.
    pub fn active_positions(&self) -> Vec<GridPos> {
        self.iter()
            .filter(|(_, cell)| cell.is_active())
            .map(|(pos, _)| pos)
            .collect()
    }

    fn index(&self, pos: GridPos) -> Option<usize> {
        self.contains(pos).then(|| pos.row * self.cols + pos.col)
    }
}

fn validate(rows: usize, cols: usize, cell_size: f64) -> Result<()> {
    if rows == 0 || cols == 0 || !cell_size.is_finite() || cell_size <= 0.0 {
        return Err(NeedleMatrixError::InvalidGrid {
            rows,
            cols,
            cell_size,
        });
    }
    Ok(())
}

fn build_cells(rows: usize, cols: usize, cell_size: f64) -> Vec<Cell> {
    (0..rows)
        .flat_map(|row| (0..cols).map(move |col| GridPos::new(row, col)))
        .map(|pos| Cell::new(pos, cell_size))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::angle::{clock_pair_to_angles, RESTING_ANGLE};

    #[test]
    fn builds_every_cell_at_rest() {
        let grid = Grid::new(3, 4, 50.0).unwrap();
        assert_eq!(grid.cells().len(), 12);
        assert!(grid.cells().iter().all(|cell| !cell.is_active()));
        assert!(grid
            .cells()
            .iter()
            .all(|cell| cell.angles() == [RESTING_ANGLE; 2]));
    }

    #[test]
    fn positions_cells_at_their_centres() {
        let grid = Grid::new(2, 3, 40.0).unwrap();
        let cell = grid.cell(GridPos::new(1, 2)).unwrap();
        assert_eq!((cell.x, cell.y), (100.0, 60.0));
        assert_eq!(cell.needles[0].length(), 12.0);
        assert_eq!(grid.surface_size(), (120.0, 80.0));
    }

    #[test]
    fn out_of_range_lookups_return_none() {
        let mut grid = Grid::new(2, 2, 10.0).unwrap();
        assert!(grid.cell(GridPos::new(2, 0)).is_none());
        assert!(grid.cell_mut(GridPos::new(0, 2)).is_none());
    }

    #[test]
    fn iter_reports_row_major_positions() {
        let grid = Grid::new(2, 3, 10.0).unwrap();
        let positions: Vec<_> = grid.iter().map(|(pos, _)| pos).collect();
        assert_eq!(positions[4], GridPos::new(1, 1));
        assert_eq!(positions.len(), 6);
    }

    #[test]
    fn resize_discards_previous_state() {
        let mut grid = Grid::new(2, 2, 10.0).unwrap();
        grid.cell_mut(GridPos::new(0, 0)).unwrap().place([0.0, 1.0]);
        grid.cell_mut(GridPos::new(1, 1))
            .unwrap()
            .set_targets([0.5, 0.5], 0.0);

        grid.resize(3, 5, 20.0).unwrap();
        assert_eq!((grid.rows(), grid.cols(), grid.cell_size()), (3, 5, 20.0));
        assert_eq!(grid.cells().len(), 15);
        assert!(grid.active_positions().is_empty());
    }

    #[test]
    fn rejects_degenerate_dimensions() {
        assert!(Grid::new(0, 4, 10.0).is_err());
        assert!(Grid::new(4, 0, 10.0).is_err());
        assert!(Grid::new(4, 4, 0.0).is_err());
        assert!(Grid::new(4, 4, f64::NAN).is_err());

        let mut grid = Grid::new(1, 1, 10.0).unwrap();
        let err = grid.resize(0, 1, 10.0).unwrap_err();
        assert!(format!("{err}").contains("0x1"));
        assert_eq!(grid.rows(), 1);
    }

    #[test]
    fn clock_eight_counts_as_rest() {
        let mut grid = Grid::new(1, 2, 10.0).unwrap();
        grid.cell_mut(GridPos::new(0, 0))
            .unwrap()
            .place(clock_pair_to_angles([8, 8]));
        grid.cell_mut(GridPos::new(0, 1))
            .unwrap()
            .place(clock_pair_to_angles([8, 7]));
        assert_eq!(grid.active_positions(), vec![GridPos::new(0, 1)]);
    }

    #[test]
    fn active_cells_include_pending_targets() {
        let mut grid = Grid::new(2, 2, 10.0).unwrap();
        grid.cell_mut(GridPos::new(0, 1))
            .unwrap()
            .set_targets([0.0, 0.0], 0.0);
        assert_eq!(grid.active_positions(), vec![GridPos::new(0, 1)]);

        grid.reset_all();
        assert!(grid.active_positions().is_empty());
    }
}

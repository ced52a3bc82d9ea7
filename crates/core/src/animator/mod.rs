use crate::{grid::Grid, needle::Motion};

/// Steps every point-to-point needle move in a grid.
#[derive(Debug, Clone, Default)]
pub struct Animator {
    motion: Motion,
}

impl Animator {
    pub fn new(motion: Motion) -> Self {
        Self { motion }
    }

    pub fn motion(&self) -> &Motion {
        &self.motion
    }

    /// Advances all needles to `now`. Returns true if any needle is still moving,
    /// which is the signal to schedule another frame.
    pub fn step_all(&self, grid: &mut Grid, now: f64) -> bool {
        let mut animating = false;
        for cell in grid.cells_mut() {
            for needle in &mut cell.needles {
                // No short-circuit: every needle must advance this frame.
                animating |= needle.step(now, &self.motion);
            }
        }
        animating
    }
}

use serde::{Deserialize, Serialize};

use crate::{
    grid::{Cell, Grid},
    needle::NeedleState,
    Result,
};

/// Point on the drawing surface.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Drawing backend. Implementations turn primitives into pixels, SVG, etc.
pub trait Surface {
    fn begin_frame(&mut self, width: f64, height: f64) -> Result<()>;
    /// Filled dial face behind a cell's needles.
    fn dial(&mut self, center: Point, radius: f64) -> Result<()>;
    /// Straight needle with round caps.
    fn needle(&mut self, from: Point, to: Point, stroke_width: f64) -> Result<()>;
    fn end_frame(&mut self) -> Result<()> {
        Ok(())
    }
}

/// Proportions of the drawn elements relative to the cell size.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderStyle {
    pub dial_ratio: f64,
    pub stroke_ratio: f64,
    pub min_stroke: f64,
}

impl Default for RenderStyle {
    fn default() -> Self {
        Self {
            dial_ratio: 0.35,
            stroke_ratio: 0.06,
            min_stroke: 1.0,
        }
    }
}

/// Turns a grid into drawing primitives: every dial first, then every needle.
#[derive(Debug, Default)]
pub struct Renderer {
    style: RenderStyle,
    frames_drawn: u64,
}

impl Renderer {
    pub fn new(style: RenderStyle) -> Self {
        Self {
            style,
            frames_drawn: 0,
        }
    }

    pub fn frames_drawn(&self) -> u64 {
        self.frames_drawn
    }

    pub fn draw(&mut self, grid: &Grid, surface: &mut dyn Surface) -> Result<()> {
        let (width, height) = grid.surface_size();
        let radius = grid.cell_size() * self.style.dial_ratio;
        let stroke = (grid.cell_size() * self.style.stroke_ratio).max(self.style.min_stroke);

        surface.begin_frame(width, height)?;
        for cell in grid.cells() {
            surface.dial(Point::new(cell.x, cell.y), radius)?;
        }
        for cell in grid.cells() {
            for needle in &cell.needles {
                surface.needle(Point::new(cell.x, cell.y), needle_tip(cell, needle), stroke)?;
            }
        }
        surface.end_frame()?;

        self.frames_drawn += 1;
        Ok(())
    }
}

/// Outer end of a needle.
pub fn needle_tip(cell: &Cell, needle: &NeedleState) -> Point {
    let angle = needle.angle();
    Point::new(
        cell.x + angle.cos() * needle.length(),
        cell.y + angle.sin() * needle.length(),
    )
}

/// Primitive recorded by [`DrawList`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum DrawCommand {
    Begin { width: f64, height: f64 },
    Dial { center: Point, radius: f64 },
    Needle { from: Point, to: Point, stroke_width: f64 },
    End,
}

/// Surface that just records what it was asked to draw.
#[derive(Debug, Default, Clone)]
pub struct DrawList {
    commands: Vec<DrawCommand>,
}

impl DrawList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn commands(&self) -> &[DrawCommand] {
        &self.commands
    }
}

impl Surface for DrawList {
    fn begin_frame(&mut self, width: f64, height: f64) -> Result<()> {
        self.commands.clear();
        self.commands.push(DrawCommand::Begin { width, height });
        Ok(())
    }

    fn dial(&mut self, center: Point, radius: f64) -> Result<()> {
        self.commands.push(DrawCommand::Dial { center, radius });
        Ok(())
    }

    fn needle(&mut self, from: Point, to: Point, stroke_width: f64) -> Result<()> {
        self.commands.push(DrawCommand::Needle {
            from,
            to,
            stroke_width,
        });
        Ok(())
    }

    fn end_frame(&mut self) -> Result<()> {
        self.commands.push(DrawCommand::End);
        Ok(())
    }
}

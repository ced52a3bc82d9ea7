use std::{fmt::Write as _, path::Path};

use needle_matrix_core::{NeedleMatrixError, Point, Result, Surface};

const BACKGROUND: &str = "#111111";
const DIAL_FILL: &str = "#1e1e1e";
const NEEDLE_STROKE: &str = "#f2f2f2";

/// Surface that writes a single frame as an SVG document.
#[derive(Debug, Default)]
pub struct SvgSurface {
    width: f64,
    height: f64,
    body: String,
}

impl SvgSurface {
    pub fn new() -> Self {
        Self::default()
    }

    /// The last drawn frame as a complete document.
    pub fn document(&self) -> String {
        format!(
            "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{w}\" height=\"{h}\" viewBox=\"0 0 {w} {h}\">\n\
             <rect width=\"100%\" height=\"100%\" fill=\"{BACKGROUND}\"/>\n{body}</svg>\n",
            w = fmt_num(self.width),
            h = fmt_num(self.height),
            body = self.body,
        )
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        std::fs::write(path, self.document())?;
        tracing::info!(path = %path.display(), "frame written");
        Ok(())
    }

    fn push(&mut self, element: std::fmt::Arguments<'_>) -> Result<()> {
        self.body
            .write_fmt(element)
            .map_err(|err| NeedleMatrixError::msg(format!("svg formatting failed: {err}")))
    }
}

impl Surface for SvgSurface {
    fn begin_frame(&mut self, width: f64, height: f64) -> Result<()> {
        self.width = width;
        self.height = height;
        self.body.clear();
        Ok(())
    }

    fn dial(&mut self, center: Point, radius: f64) -> Result<()> {
        self.push(format_args!(
            "<circle cx=\"{}\" cy=\"{}\" r=\"{}\" fill=\"{DIAL_FILL}\"/>\n",
            fmt_num(center.x),
            fmt_num(center.y),
            fmt_num(radius),
        ))
    }

    fn needle(&mut self, from: Point, to: Point, stroke_width: f64) -> Result<()> {
        self.push(format_args!(
            "<line x1=\"{}\" y1=\"{}\" x2=\"{}\" y2=\"{}\" stroke=\"{NEEDLE_STROKE}\" \
             stroke-width=\"{}\" stroke-linecap=\"round\"/>\n",
            fmt_num(from.x),
            fmt_num(from.y),
            fmt_num(to.x),
            fmt_num(to.y),
            fmt_num(stroke_width),
        ))
    }
}

fn fmt_num(value: f64) -> String {
    let text = format!("{value:.2}");
    text.trim_end_matches('0').trim_end_matches('.').to_string()
}

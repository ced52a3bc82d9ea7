use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::{
    glyph::Alignment,
    needle::Motion,
    render::RenderStyle,
    sequence::{Content, DWELL_DURATION_MS},
    transition::PatternTiming,
    NeedleMatrixError, Result,
};

/// Top-level configuration structure for the application.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub grid: GridConfig,
    pub motion: Motion,
    pub patterns: PatternTiming,
    pub text: TextConfig,
    pub sequence: SequenceConfig,
    pub render: RenderStyle,
}

impl AppConfig {
    /// Reads a JSON config; missing fields keep their defaults.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Rejects sizes, durations and proportions that are zero, negative or not finite.
    pub fn validate(&self) -> Result<()> {
        let grid = &self.grid;
        if grid.rows == 0 || grid.cols == 0 || !is_positive(grid.cell_size) {
            return Err(NeedleMatrixError::InvalidGrid {
                rows: grid.rows,
                cols: grid.cols,
                cell_size: grid.cell_size,
            });
        }

        let checks = [
            ("motion.duration_ms", self.motion.duration_ms),
            ("patterns.period_ms", self.patterns.period_ms),
            ("patterns.transition_ms", self.patterns.transition_ms),
            ("sequence.dwell_ms", self.sequence.dwell_ms),
            ("render.dial_ratio", self.render.dial_ratio),
            ("render.stroke_ratio", self.render.stroke_ratio),
        ];
        match checks.into_iter().find(|(_, value)| !is_positive(*value)) {
            Some((field, value)) => Err(NeedleMatrixError::msg(format!(
                "`{field}` must be positive, got {value}"
            ))),
            None => Ok(()),
        }
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let json = std::fs::read_to_string(path.as_ref())?;
        Self::from_json_str(&json)
    }
}

fn is_positive(value: f64) -> bool {
    value.is_finite() && value > 0.0
}

/// Grid dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridConfig {
    pub rows: usize,
    pub cols: usize,
    pub cell_size: f64,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            rows: 8,
            cols: 16,
            cell_size: 50.0,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TextConfig {
    pub alignment: Alignment,
}

/// Auto-play settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SequenceConfig {
    pub dwell_ms: f64,
    pub playlist: Vec<Content>,
}

impl Default for SequenceConfig {
    fn default() -> Self {
        Self {
            dwell_ms: DWELL_DURATION_MS,
            playlist: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use pretty_assertions::assert_eq;

    use super::*;
    use crate::angle::Easing;

    #[test]
    fn defaults_match_the_reference_display() {
        let config = AppConfig::default();
        assert_eq!(config.grid, GridConfig::default());
        assert_eq!((config.grid.rows, config.grid.cols), (8, 16));
        assert_eq!(config.motion.duration_ms, 1_200.0);
        assert_eq!(config.patterns.period_ms, 10_000.0);
        assert_eq!(config.patterns.transition_ms, 2_000.0);
        assert_eq!(config.sequence.dwell_ms, 10_000.0);
    }

    #[test]
    fn partial_json_keeps_other_defaults() {
        let config = AppConfig::from_json_str(
            r#"{
                "grid": { "cols": 20 },
                "motion": { "easing": "sine_out" },
                "text": { "alignment": "left_anchored" },
                "sequence": { "playlist": [{ "kind": "text", "value": "12:00" }] }
            }"#,
        )
        .unwrap();

        assert_eq!(config.grid.cols, 20);
        assert_eq!(config.grid.rows, 8);
        assert_eq!(config.motion.easing, Easing::SineOut);
        assert_eq!(config.motion.duration_ms, 1_200.0);
        assert_eq!(config.text.alignment, Alignment::LeftAnchored);
        assert_eq!(config.sequence.playlist, vec![Content::text("12:00")]);
    }

    #[test]
    fn render_style_is_configurable() {
        let config = AppConfig::from_json_str(r#"{"render": {"dial_ratio": 0.45}}"#).unwrap();
        assert_eq!(config.render.dial_ratio, 0.45);
        assert_eq!(config.render.stroke_ratio, RenderStyle::default().stroke_ratio);
    }

    #[test]
    fn non_positive_timings_are_rejected() {
        for json in [
            r#"{"patterns": {"period_ms": -10000}}"#,
            r#"{"patterns": {"transition_ms": 0}}"#,
            r#"{"sequence": {"dwell_ms": 0}}"#,
            r#"{"motion": {"duration_ms": -1}}"#,
            r#"{"render": {"stroke_ratio": 0}}"#,
        ] {
            let err = AppConfig::from_json_str(json).unwrap_err();
            assert!(matches!(err, NeedleMatrixError::Message(_)), "{json} gave {err}");
        }

        let err = AppConfig::from_json_str(r#"{"sequence": {"dwell_ms": -5}}"#).unwrap_err();
        assert_eq!(format!("{err}"), "`sequence.dwell_ms` must be positive, got -5");

        assert!(matches!(
            AppConfig::from_json_str(r#"{"grid": {"rows": 0}}"#),
            Err(NeedleMatrixError::InvalidGrid { .. })
        ));

        let mut config = AppConfig::default();
        assert!(config.validate().is_ok());
        config.patterns.period_ms = f64::NAN;
        assert!(config.validate().is_err());
    }

    #[test]
    fn loads_from_disk() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"patterns": {{"auto_cycle": true}}}}"#).unwrap();
        let config = AppConfig::load(file.path()).unwrap();
        assert!(config.patterns.auto_cycle);

        assert!(AppConfig::from_json_str("[]").is_err());
    }
}

/// Result alias that carries the custom [`NeedleMatrixError`] type.
pub type Result<T> = std::result::Result<T, NeedleMatrixError>;

/// Common error type for the core crate.
#[derive(Debug, thiserror::Error)]
pub enum NeedleMatrixError {
    /// Free-form message for failures that do not warrant their own variant.
    #[error("{0}")]
    Message(String),
    /// Wrapper around standard IO errors.
    #[error("{0}")]
    Io(#[from] std::io::Error),
    /// Malformed JSON in a configuration or glyph table.
    #[error("invalid json: {0}")]
    Json(#[from] serde_json::Error),
    /// Grid dimensions that cannot hold a single cell.
    #[error("invalid grid {rows}x{cols} with cell size {cell_size}")]
    InvalidGrid {
        rows: usize,
        cols: usize,
        cell_size: f64,
    },
    /// Glyph matrix with the wrong shape.
    #[error("glyph `{glyph}`: {reason}")]
    InvalidGlyph { glyph: String, reason: String },
}

impl NeedleMatrixError {
    /// Creates a new error that simply wraps the provided message.
    pub fn msg<T: Into<String>>(msg: T) -> Self {
        Self::Message(msg.into())
    }

    pub(crate) fn glyph(glyph: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidGlyph {
            glyph: glyph.into(),
            reason: reason.into(),
        }
    }
}

impl From<&str> for NeedleMatrixError {
    fn from(value: &str) -> Self {
        Self::msg(value)
    }
}

impl From<String> for NeedleMatrixError {
    fn from(value: String) -> Self {
        Self::Message(value)
    }
}

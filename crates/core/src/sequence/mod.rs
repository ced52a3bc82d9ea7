use serde::{Deserialize, Serialize};

/// Time each playlist entry stays on screen, in milliseconds.
pub const DWELL_DURATION_MS: f64 = 10_000.0;

/// Something the display can show.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Content {
    /// A registered pattern key.
    Pattern(String),
    /// A string to rasterize.
    Text(String),
}

impl Content {
    pub fn pattern(key: impl Into<String>) -> Self {
        Self::Pattern(key.into())
    }

    pub fn text(text: impl Into<String>) -> Self {
        Self::Text(text.into())
    }
}

/// Round-robin playlist that advances once per dwell interval.
#[derive(Debug, Clone)]
pub struct AutoSequencer {
    playlist: Vec<Content>,
    dwell_ms: f64,
    current: Option<usize>,
    next_due: f64,
}

impl AutoSequencer {
    pub fn new(playlist: Vec<Content>, dwell_ms: f64) -> Self {
        Self {
            playlist,
            dwell_ms,
            current: None,
            next_due: 0.0,
        }
    }

    pub fn playlist(&self) -> &[Content] {
        &self.playlist
    }

    pub fn dwell_ms(&self) -> f64 {
        self.dwell_ms
    }

    /// Entry currently on screen.
    pub fn current(&self) -> Option<&Content> {
        self.current.and_then(|index| self.playlist.get(index))
    }

    /// Rewinds to the first entry and returns it for immediate display.
    pub fn start(&mut self, now: f64) -> Option<&Content> {
        if self.playlist.is_empty() {
            self.current = None;
            return None;
        }
        self.current = Some(0);
        self.next_due = now + self.dwell_ms;
        self.current()
    }

    /// Returns the next entry once the dwell interval has elapsed, wrapping at
    /// the end of the playlist. The next interval is measured from `now`.
    pub fn poll(&mut self, now: f64) -> Option<&Content> {
        let index = self.current?;
        if now < self.next_due {
            return None;
        }
        self.current = Some((index + 1) % self.playlist.len());
        self.next_due = now + self.dwell_ms;
        self.current()
    }
}

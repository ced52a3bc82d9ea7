/// Virtual clock in milliseconds used to drive frames deterministically.
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct PlaybackClock {
    pub time_ms: f64,
}

impl PlaybackClock {
    pub fn new(time_ms: f64) -> Self {
        Self { time_ms }
    }

    pub fn now(&self) -> f64 {
        self.time_ms
    }

    pub fn reset(&mut self) {
        self.time_ms = 0.0;
    }

    /// Moves the clock forward; time never runs backwards.
    pub fn advance(&mut self, delta_ms: f64) -> f64 {
        self.time_ms = (self.time_ms + delta_ms.max(0.0)).max(0.0);
        self.time_ms
    }
}

/// Fixed frame interval for a target frame rate.
pub fn frame_interval_ms(fps: u32) -> f64 {
    1_000.0 / f64::from(fps.max(1))
}

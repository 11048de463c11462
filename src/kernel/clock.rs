use std::time::Instant;

/// Millisecond timestamps relative to scheduler start.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Clock {
    start: Instant,
}

impl Clock {
    pub fn start() -> Clock {
        Clock {
            start: Instant::now(),
        }
    }

    pub fn now_ms(&self) -> u64 {
        self.millis_at(Instant::now())
    }

    /// Instants before the clock started map to 0.
    pub fn millis_at(&self, instant: Instant) -> u64 {
        instant.saturating_duration_since(self.start).as_millis() as u64
    }
}

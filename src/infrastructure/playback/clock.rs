use std::time::{Duration, Instant};

/// Wall-clock position of a stream that started at some offset.
///
/// Used instead of asking the sink, since the pipeline is rebuilt on every
/// seek and reroute.
#[derive(Debug, Clone, Copy)]
pub struct PlaybackClock {
    offset: Duration,
    resumed_at: Instant,
}

impl PlaybackClock {
    /// Start counting from `offset` now
    pub fn starting_at(offset: Duration) -> Self {
        Self::starting_at_instant(offset, Instant::now())
    }

    pub fn starting_at_instant(offset: Duration, resumed_at: Instant) -> Self {
        Self { offset, resumed_at }
    }

    pub fn position_at(&self, now: Instant) -> Duration {
        self.offset + now.saturating_duration_since(self.resumed_at)
    }

    pub fn position(&self) -> Duration {
        self.position_at(Instant::now())
    }
}

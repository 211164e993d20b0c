//! Leading-edge throttle with a trailing sample.
//!
//! The first sample in an interval passes through immediately. Samples that
//! arrive inside the interval replace each other; the latest one is released
//! by [`Throttle::poll`] once the interval has elapsed, so the final resting
//! position of a scroll is never lost.

use std::time::{Duration, Instant};

/// Rate limiter over samples of type `T`.
#[derive(Debug, Clone)]
pub struct Throttle<T> {
    interval: Duration,
    last_emit: Option<Instant>,
    trailing: Option<T>,
}

impl<T> Throttle<T> {
    /// Create a throttle passing at most one sample per `interval`.
    #[must_use]
    pub const fn new(interval: Duration) -> Self {
        Self {
            interval,
            last_emit: None,
            trailing: None,
        }
    }

    /// Offer a sample. Returns it back when it may be processed now;
    /// otherwise it is held as the trailing sample.
    pub fn offer(&mut self, sample: T, now: Instant) -> Option<T> {
        if self.ready(now) {
            self.last_emit = Some(now);
            self.trailing = None;
            Some(sample)
        } else {
            self.trailing = Some(sample);
            None
        }
    }

    /// Release the trailing sample if its interval has elapsed.
    pub fn poll(&mut self, now: Instant) -> Option<T> {
        if self.trailing.is_some() && self.ready(now) {
            self.last_emit = Some(now);
            return self.trailing.take();
        }
        None
    }

    /// Whether a trailing sample is waiting.
    #[must_use]
    pub const fn has_trailing(&self) -> bool {
        self.trailing.is_some()
    }

    /// Forget timing and any held sample.
    pub fn reset(&mut self) {
        self.last_emit = None;
        self.trailing = None;
    }

    fn ready(&self, now: Instant) -> bool {
        self.last_emit
            .is_none_or(|last| now.saturating_duration_since(last) >= self.interval)
    }
}

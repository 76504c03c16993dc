//! Exponential backoff for transient broker and store errors.
//!
//! Starts at 100ms and doubles up to 30 seconds; reset on the first healthy
//! operation.

use std::time::Duration;

pub(crate) struct Backoff {
    current: Duration,
    max: Duration,
}

impl Backoff {
    pub(crate) fn new() -> Self {
        Self {
            current: Duration::from_millis(100),
            max: Duration::from_secs(30),
        }
    }

    pub(crate) fn next_delay(&mut self) -> Duration {
        let delay = self.current;
        self.current = std::cmp::min(self.current * 2, self.max);
        delay
    }

    pub(crate) fn reset(&mut self) {
        self.current = Duration::from_millis(100);
    }
}

//! Waiting and duration counters.
//!
//! Both advance on the session actor's one-second tick and only while the
//! session is joined. The waiting counter accumulates seconds spent alone;
//! the duration counter accumulates seconds spent with company and never
//! starts before the first remote appears.

use std::time::Duration;

#[derive(Debug)]
pub struct SessionTimers {
    solo_timeout: Duration,
    waiting_seconds: u64,
    duration_seconds: u64,
}

impl SessionTimers {
    #[must_use]
    pub fn new(solo_timeout: Duration) -> Self {
        Self {
            solo_timeout,
            waiting_seconds: 0,
            duration_seconds: 0,
        }
    }

    /// Advance one second of joined wall-clock time.
    pub fn tick(&mut self, remote_count: usize) {
        if remote_count == 0 {
            self.waiting_seconds += 1;
        } else {
            self.duration_seconds += 1;
        }
    }

    #[must_use]
    pub fn waiting_seconds(&self) -> u64 {
        self.waiting_seconds
    }

    #[must_use]
    pub fn duration_seconds(&self) -> u64 {
        self.duration_seconds
    }

    /// Whether time spent alone has reached the solo timeout.
    #[must_use]
    pub fn solo_timeout_reached(&self) -> bool {
        self.waiting_seconds >= self.solo_timeout.as_secs()
    }
}

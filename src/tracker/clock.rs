//! Time source for the polling loop

use std::cell::Cell;
use std::thread;
use std::time::{Duration, Instant};

/// Monotonic time and sleeping, injectable for tests
pub trait Clock {
    /// Time elapsed since the clock was created
    fn now(&self) -> Duration;

    /// Block for `duration`
    fn sleep(&self, duration: Duration);
}

/// Wall-clock time backed by [`Instant`] and [`thread::sleep`]
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    start: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now(&self) -> Duration {
        self.start.elapsed()
    }

    fn sleep(&self, duration: Duration) {
        thread::sleep(duration);
    }
}

/// Clock that only moves when slept on or advanced by hand
#[derive(Debug, Default)]
pub struct ManualClock {
    now: Cell<Duration>,
    sleeps: Cell<usize>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn advance(&self, duration: Duration) {
        self.now.set(self.now.get() + duration);
    }

    /// Total simulated time
    pub fn elapsed(&self) -> Duration {
        self.now.get()
    }

    /// Number of `sleep` calls so far
    pub fn sleep_count(&self) -> usize {
        self.sleeps.get()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Duration {
        self.now.get()
    }

    fn sleep(&self, duration: Duration) {
        self.sleeps.set(self.sleeps.get() + 1);
        self.advance(duration);
    }
}

//! Idle backoff for workers polling an empty queue.

use std::hint::spin_loop;
use std::thread;
use std::time::Duration;

/// Spin, then yield, then park.
///
/// Parking uses a timeout so a worker re-checks its pool state even if it
/// misses an unpark.
#[derive(Debug)]
pub struct Backoff {
    step: u32,
    max_park: Duration,
}

impl Backoff {
    const SPIN_LIMIT: u32 = 6;
    const YIELD_LIMIT: u32 = 10;

    pub fn new(max_park: Duration) -> Self {
        Self { step: 0, max_park }
    }

    pub fn reset(&mut self) {
        self.step = 0;
    }

    /// Whether the next snooze will park the thread.
    pub fn is_parking(&self) -> bool {
        self.step > Self::YIELD_LIMIT
    }

    pub fn snooze(&mut self) {
        if self.step <= Self::SPIN_LIMIT {
            for _ in 0..(1 << self.step) {
                spin_loop();
            }
        } else if self.step <= Self::YIELD_LIMIT {
            thread::yield_now();
        } else {
            thread::park_timeout(self.max_park);
        }

        if self.step <= Self::YIELD_LIMIT {
            self.step += 1;
        }
    }
}

impl Default for Backoff {
    fn default() -> Self {
        Self::new(Duration::from_millis(5))
    }
}

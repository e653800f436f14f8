//! Mock timer implementation for testing

use crate::platform::{traits::TimerInterface, Result};

/// Mock timer implementation
///
/// Uses simulated time: delays advance the clock instead of sleeping, which
/// makes the motor calibration sequence (which interleaves 1 ms delays with
/// encoder reads) run instantaneously under test.
#[derive(Debug)]
pub struct MockTimer {
    now_us: u64,
}

impl MockTimer {
    /// Create a new mock timer at t=0
    pub fn new() -> Self {
        Self { now_us: 0 }
    }

    /// Create a mock timer at a given start time (for wraparound tests)
    pub fn starting_at(now_us: u64) -> Self {
        Self { now_us }
    }

    /// Advance simulated time without a delay call
    pub fn advance_us(&mut self, us: u64) {
        self.now_us = self.now_us.wrapping_add(us);
    }
}

impl Default for MockTimer {
    fn default() -> Self {
        Self::new()
    }
}

impl TimerInterface for MockTimer {
    fn delay_us(&mut self, us: u32) -> Result<()> {
        self.now_us = self.now_us.wrapping_add(us as u64);
        Ok(())
    }

    fn delay_ms(&mut self, ms: u32) -> Result<()> {
        self.delay_us(ms.saturating_mul(1000))
    }

    fn now_us(&self) -> u64 {
        self.now_us
    }
}

//! Delta-time bookkeeping
//!
//! Every control loop in this crate derives its `dT` from an externally
//! supplied monotonic microsecond counter. [`DeltaTimer`] turns successive
//! counter readings into elapsed seconds, handling two artifacts of real
//! counters:
//!
//! - the very first reading has no predecessor, so it yields `dT = 0` (every
//!   consumer treats a non-positive `dT` as a no-op);
//! - a 32-bit source counter wraps after about 71 minutes; the wrap is
//!   detected and compensated instead of producing a negative delta.

use crate::log_warn;

/// Wrap period of a 32-bit microsecond counter
const U32_WRAP: u64 = 1 << 32;

/// Converts monotonic microsecond readings into elapsed seconds
#[derive(Debug, Default)]
pub struct DeltaTimer {
    last_us: Option<u64>,
}

impl DeltaTimer {
    pub fn new() -> Self {
        Self { last_us: None }
    }

    /// Forget the previous reading; the next `dt()` returns 0
    pub fn reset(&mut self) {
        self.last_us = None;
    }

    /// True if no reading has been consumed since construction/reset
    pub fn is_first_call(&self) -> bool {
        self.last_us.is_none()
    }

    /// Elapsed seconds since the previous call, 0.0 on the first call
    pub fn dt(&mut self, now_us: u64) -> f32 {
        let elapsed_us = match self.last_us {
            None => 0,
            Some(last) if now_us >= last => now_us - last,
            Some(last) => {
                // Source counter wrapped (32-bit micros rolls over every ~71 min)
                let elapsed = U32_WRAP - (last & (U32_WRAP - 1)) + (now_us & (U32_WRAP - 1));
                log_warn!("timer wraparound compensated: {} us", elapsed);
                elapsed
            }
        };
        self.last_us = Some(now_us);
        elapsed_us as f32 * 1.0e-6
    }
}

//! Monotonic timer interface

use crate::platform::error::Result;

/// Monotonic time source and short-delay provider
///
/// `now_us()` is the clock every control-loop `dT` derives from. The
/// underlying hardware counter may be 32 bits wide and wrap after a few
/// hours; [`crate::core::time::DeltaTimer`] compensates for that, so
/// implementations may expose the raw counter directly.
///
/// `delay_ms`/`delay_us` block the caller. The balance core uses them only
/// inside the one-shot motor calibration sequence, never during steady-state
/// control.
pub trait TimerInterface {
    /// Blocking delay in microseconds
    fn delay_us(&mut self, us: u32) -> Result<()>;

    /// Blocking delay in milliseconds
    fn delay_ms(&mut self, ms: u32) -> Result<()>;

    /// Current monotonic time in microseconds
    fn now_us(&self) -> u64;
}

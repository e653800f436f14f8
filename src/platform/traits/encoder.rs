//! Quadrature encoder interface

use crate::platform::error::Result;

/// Incremental quadrature encoder attached to a motor shaft
///
/// Implementations return the raw accumulated count. One encoder cycle (CPR)
/// corresponds to four counts; the conversion to a shaft angle is done by the
/// motor driver, which also accumulates the angle continuously so speed
/// derivatives stay accurate across revolutions.
pub trait Encoder {
    /// Read the accumulated quadrature count (signed, free-running)
    ///
    /// Must be non-blocking and return the latest available value.
    fn read(&mut self) -> Result<i32>;
}

//! Platform abstraction layer
//!
//! This module provides hardware abstraction for the peripherals the balance
//! core consumes: quadrature encoders, PWM output stages, the IMU and a
//! monotonic timer. All platform-specific code must stay behind these traits.

pub mod error;
pub mod traits;

#[cfg(any(test, feature = "mock"))]
pub mod mock;

// Re-export commonly used types
pub use error::{PlatformError, Result};
pub use traits::{
    Encoder, ImuSensor, PwmOutput, RawImuSample, ThreePhasePwm, TimerInterface,
};

//! Platform abstraction traits
//!
//! This module defines the traits that platform implementations must provide.

pub mod encoder;
pub mod imu;
pub mod pwm;
pub mod timer;

// Re-export trait interfaces
pub use encoder::Encoder;
pub use imu::{ImuSensor, RawImuSample};
pub use pwm::{PwmOutput, ThreePhasePwm};
pub use timer::TimerInterface;

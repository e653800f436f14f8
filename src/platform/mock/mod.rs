//! Mock platform implementation for testing
//!
//! This module provides mock implementations of platform traits that can be
//! used for unit testing without requiring actual hardware.
//!
//! # Feature Gate
//!
//! This module is available in two contexts:
//! - During test builds (`#[cfg(test)]`)
//! - When the `mock` feature is enabled
//!
//! # Example
//!
//! ```
//! use pico_ball::platform::mock::{MockThreePhasePwm, MockTimer};
//! use pico_ball::platform::traits::{ThreePhasePwm, TimerInterface};
//!
//! let mut pwm = MockThreePhasePwm::new();
//! pwm.set_duty(0.5, 0.5, 0.5).unwrap();
//! let mut timer = MockTimer::new();
//! timer.delay_ms(1).unwrap();
//! assert_eq!(timer.now_us(), 1000);
//! ```

#![cfg(any(test, feature = "mock"))]

mod encoder;
mod imu;
mod pwm;
mod sim_motor;
mod timer;

pub use encoder::MockEncoder;
pub use imu::MockImu;
pub use pwm::{MockPwmOutput, MockThreePhasePwm};
pub use sim_motor::{SimMotor, SimMotorEncoder, SimMotorPwm};
pub use timer::MockTimer;

//! Motor drivers
//!
//! Field-oriented control for the three brushless wheel motors and a plain
//! position-controlled H-bridge driver for the brushed lifter motor.

pub mod bldc;
pub mod brushed;
pub mod svpwm;

pub use bldc::{BrushlessMotorDriver, MotorState};
pub use brushed::BrushedMotorDriver;
pub use svpwm::SvpwmTable;

use crate::platform::PlatformError;

/// Motor driver error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum MotorError {
    /// Rotor alignment failed on all retries; the driver disabled itself
    CalibrationFailed,
    /// Underlying PWM, encoder or timer fault
    Platform(PlatformError),
}

impl From<PlatformError> for MotorError {
    fn from(err: PlatformError) -> Self {
        MotorError::Platform(err)
    }
}

impl core::fmt::Display for MotorError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            MotorError::CalibrationFailed => write!(f, "rotor alignment failed"),
            MotorError::Platform(err) => write!(f, "platform fault: {err}"),
        }
    }
}

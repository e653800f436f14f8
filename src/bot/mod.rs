//! Vehicle layer
//!
//! Wires the subsystems into one robot: [`BallDrive`] bundles the three
//! wheel motors behind the kinematics transform, [`BotController`] runs the
//! whole balance pipeline from one cooperative `loop_once`.

pub mod ball_drive;
pub mod controller;

pub use ball_drive::BallDrive;
pub use controller::{BotController, BotMode};

use crate::libraries::motor_driver::MotorError;
use crate::platform::PlatformError;
use crate::subsystems::kinematics::KinematicsError;

/// Top-level error of the vehicle layer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BotError {
    Motor(MotorError),
    Kinematics(KinematicsError),
    Platform(PlatformError),
}

impl From<MotorError> for BotError {
    fn from(err: MotorError) -> Self {
        BotError::Motor(err)
    }
}

impl From<KinematicsError> for BotError {
    fn from(err: KinematicsError) -> Self {
        BotError::Kinematics(err)
    }
}

impl From<PlatformError> for BotError {
    fn from(err: PlatformError) -> Self {
        BotError::Platform(err)
    }
}

impl core::fmt::Display for BotError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            BotError::Motor(err) => write!(f, "motor: {err}"),
            BotError::Kinematics(err) => write!(f, "kinematics: {err}"),
            BotError::Platform(err) => write!(f, "platform: {err}"),
        }
    }
}

//! Three-wheel ball drive
//!
//! Bundles the three brushless wheel drivers behind the kinematics
//! transform: callers command body-frame motion and read body-frame motion,
//! never individual wheels.

use crate::core::parameters::{MotorConfig, PhysicalConstants};
use crate::libraries::motor_driver::{BrushlessMotorDriver, MotorError};
use crate::log_error;
use crate::platform::traits::{Encoder, ThreePhasePwm, TimerInterface};
use crate::subsystems::kinematics::{Kinematics, KinematicsError};

#[derive(Debug)]
pub struct BallDrive<P: ThreePhasePwm, E: Encoder> {
    wheels: [BrushlessMotorDriver<P, E>; 3],
    kinematics: Kinematics,
}

impl<P: ThreePhasePwm, E: Encoder> BallDrive<P, E> {
    pub fn new(
        wheels: [BrushlessMotorDriver<P, E>; 3],
        physics: &PhysicalConstants,
    ) -> Result<Self, KinematicsError> {
        Ok(Self {
            wheels,
            kinematics: Kinematics::new(physics)?,
        })
    }

    pub fn is_enabled(&self) -> bool {
        self.wheels.iter().all(|w| w.is_enabled())
    }

    /// Calibrate and enable all three wheels
    ///
    /// All-or-nothing: if any wheel fails alignment, wheels already enabled
    /// are disabled again and the error is returned.
    pub fn enable<T: TimerInterface>(&mut self, timer: &mut T) -> Result<(), MotorError> {
        for index in 0..self.wheels.len() {
            if let Err(err) = self.wheels[index].enable(timer) {
                log_error!("wheel {} failed alignment", index);
                // The failed wheel is included: a platform fault can leave
                // its stage in need of another shutdown attempt.
                for wheel in &mut self.wheels[..=index] {
                    if wheel.disable().is_err() {
                        log_error!("wheel disable failed during rollback");
                    }
                }
                return Err(err);
            }
        }
        Ok(())
    }

    pub fn disable(&mut self) -> Result<(), MotorError> {
        let mut result = Ok(());
        for wheel in &mut self.wheels {
            if let Err(err) = wheel.disable() {
                result = Err(err);
            }
        }
        result
    }

    /// Run the commutation loops of all wheels
    pub fn update(&mut self, now_us: u64, config: &MotorConfig) -> Result<(), MotorError> {
        for wheel in &mut self.wheels {
            wheel.update(now_us, config)?;
        }
        Ok(())
    }

    /// Command a body-frame motion; inverse kinematics distributes it
    pub fn set_speed(
        &mut self,
        vx: f32,
        vy: f32,
        omega: f32,
        tilt_x: f32,
        tilt_y: f32,
        config: &MotorConfig,
    ) {
        let targets = self
            .kinematics
            .compute_wheel_speed(vx, vy, omega, tilt_x, tilt_y);
        for (wheel, target) in self.wheels.iter_mut().zip(targets) {
            wheel.set_speed(target, config.max_acceleration);
        }
    }

    /// Measured body-frame motion from forward kinematics
    pub fn get_speed(&mut self, tilt_x: f32, tilt_y: f32) -> (f32, f32, f32) {
        let measured = [
            self.wheels[0].get_speed(),
            self.wheels[1].get_speed(),
            self.wheels[2].get_speed(),
        ];
        self.kinematics.compute_actual_speed(measured, tilt_x, tilt_y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::mock::{MockTimer, SimMotor};

    const POLE_PAIRS: u32 = 7;
    const CPR: u32 = 1024;

    fn drive(
        motors: &[SimMotor; 3],
    ) -> BallDrive<crate::platform::mock::SimMotorPwm<'_>, crate::platform::mock::SimMotorEncoder<'_>>
    {
        let config = MotorConfig::default();
        let wheels = [
            BrushlessMotorDriver::new(
                motors[0].pwm(),
                motors[0].encoder(),
                POLE_PAIRS,
                CPR,
                config.gear_ratio,
            ),
            BrushlessMotorDriver::new(
                motors[1].pwm(),
                motors[1].encoder(),
                POLE_PAIRS,
                CPR,
                config.gear_ratio,
            ),
            BrushlessMotorDriver::new(
                motors[2].pwm(),
                motors[2].encoder(),
                POLE_PAIRS,
                CPR,
                config.gear_ratio,
            ),
        ];
        BallDrive::new(wheels, &PhysicalConstants::default()).unwrap()
    }

    #[test]
    fn test_enable_calibrates_all_wheels() {
        let motors = [
            SimMotor::new(0.3, 20),
            SimMotor::new(0.3, 20),
            SimMotor::new(0.3, 20),
        ];
        let mut drive = drive(&motors);
        let mut timer = MockTimer::new();
        drive.enable(&mut timer).unwrap();
        assert!(drive.is_enabled());
    }

    #[test]
    fn test_one_stuck_wheel_fails_the_whole_drive() {
        let motors = [
            SimMotor::new(0.3, 20),
            SimMotor::new(0.3, 20),
            SimMotor::stuck(),
        ];
        let mut drive = drive(&motors);
        let mut timer = MockTimer::new();
        assert_eq!(
            drive.enable(&mut timer),
            Err(MotorError::CalibrationFailed)
        );
        assert!(!drive.is_enabled(), "healthy wheels rolled back");
    }

    #[test]
    fn test_failed_enable_powers_every_wheel_down() {
        let motors = [
            SimMotor::new(0.3, 20),
            SimMotor::stuck(),
            SimMotor::new(0.3, 20),
        ];
        let mut drive = drive(&motors);
        let mut timer = MockTimer::new();
        assert!(drive.enable(&mut timer).is_err());
        for (index, motor) in motors.iter().enumerate() {
            assert!(
                !motor.is_powered(),
                "wheel {index} still powered after a failed enable"
            );
        }
    }

    #[test]
    fn test_spin_command_turns_the_wheels() {
        let motors = [
            SimMotor::new(0.05, 5),
            SimMotor::new(0.05, 5),
            SimMotor::new(0.05, 5),
        ];
        let mut drive = drive(&motors);
        let mut timer = MockTimer::new();
        let config = MotorConfig::default();
        drive.enable(&mut timer).unwrap();
        let before = [
            motors[0].position(),
            motors[1].position(),
            motors[2].position(),
        ];

        drive.set_speed(0.0, 0.0, 2.0, 0.0, 0.0, &config);
        let mut now = timer.now_us();
        for _ in 0..500 {
            now += 1_000;
            drive.update(now, &config).unwrap();
        }
        for (motor, start) in motors.iter().zip(before) {
            assert!(motor.position() != start, "every wheel moved under spin");
        }
    }
}

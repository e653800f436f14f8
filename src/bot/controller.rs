//! Top-level bot controller
//!
//! One cooperative `loop_once` runs the whole pipeline in the order the
//! data flows: motor loops first, then the orientation estimator, and when
//! a fresh fused sample is pending, one balance cycle. The estimator's
//! one-shot flag paces the balance loop at the sensor cadence.

use crate::core::parameters::Config;
use crate::log_error;
use crate::platform::traits::{Encoder, ImuSensor, PwmOutput, ThreePhasePwm, TimerInterface};
use crate::subsystems::balance::{BalanceController, TargetMovement};
use crate::subsystems::orientation::OrientationEstimator;

use super::ball_drive::BallDrive;
use super::BotError;
use crate::libraries::motor_driver::BrushedMotorDriver;

/// Operating mode of the bot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BotMode {
    /// Motors off, pipeline idle
    Off,
    /// Actively balancing on the ball
    Balancing,
}

/// The assembled robot
#[derive(Debug)]
pub struct BotController<I, P, E, F, R, LE>
where
    I: ImuSensor,
    P: ThreePhasePwm,
    E: Encoder,
    F: PwmOutput,
    R: PwmOutput,
    LE: Encoder,
{
    imu: I,
    drive: BallDrive<P, E>,
    lifter: BrushedMotorDriver<F, R, LE>,
    estimator: OrientationEstimator,
    balance: BalanceController,
    config: Config,
    mode: BotMode,
}

impl<I, P, E, F, R, LE> BotController<I, P, E, F, R, LE>
where
    I: ImuSensor,
    P: ThreePhasePwm,
    E: Encoder,
    F: PwmOutput,
    R: PwmOutput,
    LE: Encoder,
{
    pub fn new(
        imu: I,
        drive: BallDrive<P, E>,
        lifter: BrushedMotorDriver<F, R, LE>,
        config: Config,
    ) -> Self {
        let estimator = OrientationEstimator::new(&config.imu, &config.physical);
        let balance = BalanceController::new(&config);
        Self {
            imu,
            drive,
            lifter,
            estimator,
            balance,
            config,
            mode: BotMode::Off,
        }
    }

    pub fn mode(&self) -> BotMode {
        self.mode
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Tuning layer writes go here; the loop picks them up next cycle
    pub fn config_mut(&mut self) -> &mut Config {
        &mut self.config
    }

    /// Demanded movement while balancing
    pub fn target_movement_mut(&mut self) -> &mut TargetMovement {
        self.balance.target_mut()
    }

    pub fn lifter_mut(&mut self) -> &mut BrushedMotorDriver<F, R, LE> {
        &mut self.lifter
    }

    /// Switch the operating mode
    ///
    /// Entering `Balancing` calibrates and enables all wheels (blocking)
    /// and restarts estimator and controller state. Entering `Off` cuts
    /// motor power.
    pub fn set_mode<T: TimerInterface>(
        &mut self,
        mode: BotMode,
        timer: &mut T,
    ) -> Result<(), BotError> {
        match mode {
            BotMode::Balancing => {
                if self.mode == BotMode::Balancing {
                    return Ok(());
                }
                self.drive.enable(timer)?;
                self.estimator.apply_config(&self.config.imu);
                self.estimator.reset();
                self.balance.reset();
                self.mode = BotMode::Balancing;
            }
            BotMode::Off => {
                self.drive.disable()?;
                self.mode = BotMode::Off;
            }
        }
        Ok(())
    }

    /// Learn new IMU null offsets; the robot must be upright and still
    pub fn calibrate_imu<T: TimerInterface>(&mut self, timer: &mut T) -> Result<(), BotError> {
        let mut imu_config = self.config.imu;
        self.estimator
            .calibrate(&mut self.imu, timer, &mut imu_config)?;
        self.config.imu = imu_config;
        Ok(())
    }

    /// One pass of the cooperative control loop
    ///
    /// Safe to call at any rate; every stage paces itself. A validity
    /// violation of the fused orientation drops the bot to `Off` and cuts
    /// motor power before a bad sample can reach the wheels.
    pub fn loop_once(&mut self, now_us: u64) -> Result<(), BotError> {
        self.drive.update(now_us, &self.config.motor)?;
        self.lifter.update(now_us, &self.config.motor)?;
        self.estimator.update(&mut self.imu, now_us)?;

        if self.mode != BotMode::Balancing {
            // Keep the flag consumed so stale samples never carry over
            // into the next balancing session.
            self.estimator.consume_update();
            return Ok(());
        }

        let dt = match self.estimator.consume_update() {
            Some(dt) => dt,
            None => return Ok(()),
        };

        if !self.estimator.is_valid() {
            log_error!("orientation invalid, dropping to off");
            self.mode = BotMode::Off;
            self.drive.disable()?;
            return Ok(());
        }

        let sample = self.estimator.sample();
        let (vx, vy, _) = self.drive.get_speed(sample.tilt_x, sample.tilt_y);
        self.balance.update(dt, vx, vy, &sample, &self.config);
        self.drive.set_speed(
            self.balance.speed_x(),
            self.balance.speed_y(),
            self.balance.omega(),
            sample.tilt_x,
            sample.tilt_y,
            &self.config.motor,
        );
        Ok(())
    }
}

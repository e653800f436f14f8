//! Brushed motor driver for the lifter
//!
//! Plain position control over an H-bridge: one PWM pin per direction and a
//! quadrature encoder on the output shaft. Runs at 100 Hz, which is plenty
//! for a geared-down lifter spindle.

use core::f32::consts::PI;

use super::MotorError;
use crate::core::parameters::MotorConfig;
use crate::libraries::pid::{GainSchedule, GainScheduledPid};
use crate::platform::traits::{Encoder, PwmOutput};

/// Control loop period [µs]
const LOOP_PERIOD_US: u64 = 10_000;

#[derive(Debug)]
pub struct BrushedMotorDriver<F: PwmOutput, R: PwmOutput, E: Encoder> {
    forward: F,
    reverse: R,
    encoder: E,
    pid: GainScheduledPid,
    enabled: bool,

    /// Encoder lines per output revolution (counted 4x in quadrature)
    cpr: u32,
    last_count: i32,
    angle: f32,
    target_angle: f32,
    /// Rate the target angle ramps at [rev/s]
    speed: f32,
    last_update_us: Option<u64>,
}

impl<F: PwmOutput, R: PwmOutput, E: Encoder> BrushedMotorDriver<F, R, E> {
    pub fn new(forward: F, reverse: R, encoder: E, cpr: u32) -> Self {
        Self {
            forward,
            reverse,
            encoder,
            pid: GainScheduledPid::new(GainSchedule::Linear),
            enabled: false,
            cpr,
            last_count: 0,
            angle: 0.0,
            target_angle: 0.0,
            speed: 0.0,
            last_update_us: None,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Target angle of the output shaft [rad]
    pub fn set_position(&mut self, angle: f32) {
        self.target_angle = angle;
        self.speed = 0.0;
    }

    /// Run the output shaft at a constant rate [rev/s] until told otherwise
    pub fn set_speed(&mut self, rev_s: f32) {
        self.speed = rev_s;
    }

    /// Current angle of the output shaft [rad]
    pub fn get_position(&self) -> f32 {
        self.angle
    }

    fn track_encoder(&mut self) -> Result<f32, MotorError> {
        let count = self.encoder.read()?;
        let delta = count.wrapping_sub(self.last_count);
        self.last_count = count;
        self.angle += delta as f32 * 2.0 * PI / (4 * self.cpr) as f32;
        Ok(self.angle)
    }

    /// Bumpless start: the current position becomes the target
    pub fn enable(&mut self) -> Result<(), MotorError> {
        self.track_encoder()?;
        self.target_angle = self.angle;
        self.speed = 0.0;
        self.pid.reset();
        self.last_update_us = None;
        self.enabled = true;
        Ok(())
    }

    pub fn disable(&mut self) -> Result<(), MotorError> {
        self.forward.set_duty(0.0)?;
        self.reverse.set_duty(0.0)?;
        self.enabled = false;
        Ok(())
    }

    /// One control cycle, self-paced to 100 Hz
    pub fn update(&mut self, now_us: u64, config: &MotorConfig) -> Result<(), MotorError> {
        if !self.enabled {
            return Ok(());
        }
        let last = match self.last_update_us {
            Some(last) => last,
            None => {
                self.last_update_us = Some(now_us);
                return Ok(());
            }
        };
        if now_us.wrapping_sub(last) < LOOP_PERIOD_US {
            return Ok(());
        }
        let dt = now_us.wrapping_sub(last) as f32 * 1e-6;
        self.last_update_us = Some(now_us);

        self.target_angle += self.speed * 2.0 * PI * dt;
        let angle = self.track_encoder()?;
        let error = self.target_angle - angle;
        let out = self.pid.update(
            &config.pid_lifter,
            &config.pid_lifter,
            -1.0,
            1.0,
            0.0,
            error,
            dt,
        );

        if out >= 0.0 {
            self.forward.set_duty(out)?;
            self.reverse.set_duty(0.0)?;
        } else {
            self.forward.set_duty(0.0)?;
            self.reverse.set_duty(-out)?;
        }
        Ok(())
    }
}

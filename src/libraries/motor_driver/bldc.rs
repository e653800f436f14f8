//! Field-oriented brushless motor driver
//!
//! Closed-loop commutation for one gimbal-style BLDC wheel motor with a
//! quadrature encoder on the motor shaft. The driver tracks a reference
//! angle that ramps with bounded acceleration, runs a gain-scheduled PID on
//! the angle error and synthesizes the stator field from the space-vector
//! table, rotated ahead of the rotor by a speed-dependent advance angle.
//!
//! Before it can commutate, the driver has to learn where the electrical
//! zero sits relative to the encoder; [`BrushlessMotorDriver::enable`] runs
//! that one-shot alignment.

use core::f32::consts::PI;

use libm::powf;

use super::{svpwm::SvpwmTable, MotorError};
use crate::core::parameters::MotorConfig;
use crate::libraries::pid::{GainSchedule, GainScheduledPid};
use crate::{log_error, log_warn};
use crate::platform::traits::{Encoder, ThreePhasePwm, TimerInterface};

/// Commutation loop period [µs]
const LOOP_PERIOD_US: u64 = 1_000;
/// Reference angle never leads or trails the rotor by more than this [rad]
const MAX_ANGLE_ERROR: f32 = 30.0 * PI / 180.0;
/// Exponent shaping the advance angle over the control output
const ADVANCE_EXPONENT: f32 = 0.1;
/// Field shift compensating back-EMF at full speed [rad]
const BACK_EMF_SHIFT: f32 = 10.0 * PI / 180.0;

/// Torque ramp rate during rotor alignment [1/s]
const CAL_TORQUE_RAMP: f32 = 5.0;
/// Torque ramp-down rate once the rotor is moving [1/s]
const CAL_TORQUE_BACKOFF: f32 = 1.0;
/// Torque ceiling during rotor alignment
const CAL_MAX_TORQUE: f32 = 0.8;
/// Alignment attempts before giving up
const CAL_RETRIES: u32 = 5;
/// Per-attempt alignment timeout [ms]
const CAL_TIMEOUT_MS: u32 = 5_000;
/// Rotor excursion proving the field actually grips the rotor [rad]
const CAL_MIN_EXCURSION: f32 = 4.0 * PI / 180.0;
/// Field nudge cap per cycle while pulling the rotor to null [rad]
const CAL_NUDGE_MAX: f32 = 0.5 * PI / 180.0;
/// Proportional gain of the field nudge
const CAL_NUDGE_GAIN: f32 = 0.2;

/// Driver lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum MotorState {
    /// Power stage off, rotor freewheels
    Disabled,
    /// Rotor alignment in progress
    Calibrating,
    /// Commutating
    Enabled,
}

/// FOC driver for one brushless wheel motor
#[derive(Debug)]
pub struct BrushlessMotorDriver<P: ThreePhasePwm, E: Encoder> {
    pwm: P,
    encoder: E,
    table: SvpwmTable,
    pid: GainScheduledPid,
    state: MotorState,

    pole_pairs: u32,
    /// Encoder lines per motor revolution (counted 4x in quadrature)
    cpr: u32,
    /// Wheel revolutions per motor revolution
    gear_ratio: f32,

    last_count: i32,
    /// Accumulated mechanical rotor angle [rad]
    encoder_angle: f32,
    /// Electrical angle of the stator field when the rotor reads zero [rad]
    commutation_offset: f32,

    reference_angle: f32,
    /// Ramped reference speed [motor rev/s]
    current_speed: f32,
    target_speed: f32,
    target_acceleration: f32,
    measured_speed: f32,

    last_update_us: Option<u64>,
}

impl<P: ThreePhasePwm, E: Encoder> BrushlessMotorDriver<P, E> {
    pub fn new(pwm: P, encoder: E, pole_pairs: u32, cpr: u32, gear_ratio: f32) -> Self {
        Self {
            pwm,
            encoder,
            table: SvpwmTable::new(),
            pid: GainScheduledPid::new(GainSchedule::Linear),
            state: MotorState::Disabled,
            pole_pairs,
            cpr,
            gear_ratio,
            last_count: 0,
            encoder_angle: 0.0,
            commutation_offset: 0.0,
            reference_angle: 0.0,
            current_speed: 0.0,
            target_speed: 0.0,
            target_acceleration: 0.0,
            measured_speed: 0.0,
            last_update_us: None,
        }
    }

    pub fn state(&self) -> MotorState {
        self.state
    }

    pub fn is_enabled(&self) -> bool {
        self.state == MotorState::Enabled
    }

    /// Radians of mechanical rotor angle per quadrature count
    fn rad_per_count(&self) -> f32 {
        2.0 * PI / (4 * self.cpr) as f32
    }

    /// Set the wheel speed target [rev/s] with a bounded ramp [rev/s²]
    pub fn set_speed(&mut self, wheel_rev_s: f32, wheel_accel: f32) {
        self.set_motor_speed(wheel_rev_s / self.gear_ratio, wheel_accel / self.gear_ratio);
    }

    /// Set the motor speed target [rev/s] with a bounded ramp [rev/s²]
    pub fn set_motor_speed(&mut self, rev_s: f32, accel: f32) {
        self.target_speed = rev_s;
        self.target_acceleration = accel.abs();
    }

    /// Last measured wheel speed [rev/s]
    pub fn get_speed(&self) -> f32 {
        self.measured_speed * self.gear_ratio
    }

    /// Last measured motor speed [rev/s]
    pub fn get_motor_speed(&self) -> f32 {
        self.measured_speed
    }

    /// Accumulated wheel angle since power-up [rad]
    pub fn get_angle(&self) -> f32 {
        self.encoder_angle * self.gear_ratio
    }

    /// Accumulated mechanical rotor angle since power-up [rad]
    pub fn get_motor_angle(&self) -> f32 {
        self.encoder_angle
    }

    /// Fold new encoder counts into the accumulated rotor angle
    fn track_encoder(&mut self) -> Result<f32, MotorError> {
        let count = self.encoder.read()?;
        let delta = count.wrapping_sub(self.last_count);
        self.last_count = count;
        self.encoder_angle += delta as f32 * self.rad_per_count();
        Ok(self.encoder_angle)
    }

    /// One commutation cycle, self-paced to 1 kHz
    ///
    /// Call as often as convenient with the current monotonic time; cycles
    /// arriving early are skipped. Does nothing while the driver is not
    /// enabled.
    pub fn update(&mut self, now_us: u64, config: &MotorConfig) -> Result<(), MotorError> {
        if self.state != MotorState::Enabled {
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

        // Trapezoid speed ramp toward the target.
        let step = self.target_acceleration * dt;
        let diff = (self.target_speed - self.current_speed).clamp(-step, step);
        self.current_speed += diff;

        let last_reference = self.reference_angle;
        self.reference_angle += self.current_speed * 2.0 * PI * dt;

        let encoder_angle = self.track_encoder()?;

        // A stalled rotor must not let the reference run away.
        self.reference_angle = self.reference_angle.clamp(
            encoder_angle - MAX_ANGLE_ERROR,
            encoder_angle + MAX_ANGLE_ERROR,
        );
        self.measured_speed = (self.reference_angle - last_reference) / (2.0 * PI) / dt;

        let error = self.reference_angle - encoder_angle;
        let speed_ratio = (self.measured_speed.abs() / config.max_rev_speed).min(1.0);
        let out = self.pid.update(
            &config.pid_position,
            &config.pid_speed,
            -MAX_ANGLE_ERROR,
            MAX_ANGLE_ERROR,
            speed_ratio,
            error,
            dt,
        );

        let torque = out.abs() / MAX_ANGLE_ERROR;
        let advance = 0.5 * PI * sign(out) * powf(out.abs() / MAX_ANGLE_ERROR, ADVANCE_EXPONENT);
        let shift = speed_ratio * BACK_EMF_SHIFT * sign(self.measured_speed);
        let field =
            encoder_angle * self.pole_pairs as f32 + self.commutation_offset + advance + shift;

        let (a, b, c) = self.table.duties(torque, field);
        self.pwm.set_duty(a, b, c)?;
        Ok(())
    }

    /// Power up and align the stator field with the encoder
    ///
    /// Blocks for up to `CAL_RETRIES * CAL_TIMEOUT_MS`. The field is held at
    /// a seed angle while torque ramps up; once the rotor breaks free the
    /// field is nudged until the rotor sits on the electrical null. Success
    /// requires the rotor to have actually moved, which catches a dead
    /// encoder or an unpowered stage. On failure the driver disables itself.
    pub fn enable<T: TimerInterface>(&mut self, timer: &mut T) -> Result<(), MotorError> {
        self.pwm.set_enabled(true)?;
        self.state = MotorState::Calibrating;

        let result = self.run_alignment(timer);
        if result.is_err() {
            // No failure exit may leave torque on the windings, platform
            // faults included.
            let released = self.pwm.set_duty(0.0, 0.0, 0.0);
            let powered_off = self.pwm.set_enabled(false);
            if released.is_err() || powered_off.is_err() {
                log_error!("power stage shutdown failed after alignment error");
            }
            self.state = MotorState::Disabled;
        }
        result
    }

    fn run_alignment<T: TimerInterface>(&mut self, timer: &mut T) -> Result<(), MotorError> {
        for attempt in 0..CAL_RETRIES {
            // Different seed each attempt, in case the rotor starts on a
            // point of unstable equilibrium.
            let mut field = attempt as f32 * 2.0 * PI / 7.0;
            if self.align_rotor(timer, &mut field)? {
                self.finish_calibration(field)?;
                return Ok(());
            }
            log_warn!("rotor alignment attempt failed, retrying");
        }
        Err(MotorError::CalibrationFailed)
    }

    /// One alignment attempt. Returns true when the rotor locked onto the
    /// field.
    fn align_rotor<T: TimerInterface>(
        &mut self,
        timer: &mut T,
        field: &mut f32,
    ) -> Result<bool, MotorError> {
        let start_count = self.encoder.read()?;
        let settle_threshold = 2.0 * self.rad_per_count();

        let mut torque = 0.0_f32;
        let mut last_rotor = 0.0_f32;
        let mut max_excursion = 0.0_f32;
        let dt = 1e-3;

        for _ in 0..CAL_TIMEOUT_MS {
            let count = self.encoder.read()?;
            let rotor = count.wrapping_sub(start_count) as f32 * self.rad_per_count();
            let delta = rotor - last_rotor;
            last_rotor = rotor;
            max_excursion = max_excursion.max(rotor.abs());

            // Raise torque only while the rotor sits still; once it moves,
            // back off and let the nudge reel it in.
            let moving = delta.abs() >= settle_threshold;
            torque = alignment_torque(torque, moving, dt);
            if moving && max_excursion >= CAL_MIN_EXCURSION {
                return Ok(true);
            }

            *field -= sign(rotor) * (CAL_NUDGE_GAIN * rotor.abs()).min(CAL_NUDGE_MAX);

            let (a, b, c) = self.table.duties(torque, *field);
            self.pwm.set_duty(a, b, c)?;
            timer.delay_ms(1)?;
        }
        Ok(false)
    }

    /// Lock in the alignment result and hand over to the control loop
    fn finish_calibration(&mut self, field: f32) -> Result<(), MotorError> {
        self.track_encoder()?;
        self.commutation_offset = field - self.encoder_angle * self.pole_pairs as f32;
        self.reference_angle = self.encoder_angle;
        self.current_speed = 0.0;
        self.target_speed = 0.0;
        self.measured_speed = 0.0;
        self.last_update_us = None;
        self.pid.reset();
        self.state = MotorState::Enabled;
        Ok(())
    }

    /// Cut power to the stage; the rotor freewheels
    pub fn disable(&mut self) -> Result<(), MotorError> {
        self.pwm.set_duty(0.0, 0.0, 0.0)?;
        self.pwm.set_enabled(false)?;
        self.state = MotorState::Disabled;
        self.pid.reset();
        self.last_update_us = None;
        Ok(())
    }
}

/// Alignment torque for the next cycle: ramp up while the rotor holds,
/// back off once it breaks free
fn alignment_torque(torque: f32, moving: bool, dt: f32) -> f32 {
    if moving {
        (torque - CAL_TORQUE_BACKOFF * dt).max(0.0)
    } else {
        (torque + CAL_TORQUE_RAMP * dt).min(CAL_MAX_TORQUE)
    }
}

fn sign(value: f32) -> f32 {
    if value > 0.0 {
        1.0
    } else if value < 0.0 {
        -1.0
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::error::{EncoderError, PlatformError};
    use crate::platform::mock::{MockEncoder, MockThreePhasePwm, MockTimer, SimMotor};

    const POLE_PAIRS: u32 = 7;
    const CPR: u32 = 1024;
    const GEAR: f32 = 1.0 / 9.0;

    #[test]
    fn test_starts_disabled_and_update_is_noop() {
        let mut driver = BrushlessMotorDriver::new(
            MockThreePhasePwm::new(),
            MockEncoder::new(),
            POLE_PAIRS,
            CPR,
            GEAR,
        );
        let config = MotorConfig::default();
        driver.set_speed(1.0, 10.0);
        driver.update(0, &config).unwrap();
        driver.update(10_000, &config).unwrap();
        assert_eq!(driver.state(), MotorState::Disabled);
        assert_eq!(driver.get_speed(), 0.0);
    }

    #[test]
    fn test_calibration_succeeds_on_movable_rotor() {
        let motor = SimMotor::new(0.3, 20);
        let mut driver =
            BrushlessMotorDriver::new(motor.pwm(), motor.encoder(), POLE_PAIRS, CPR, GEAR);
        let mut timer = MockTimer::new();

        driver.enable(&mut timer).unwrap();
        assert_eq!(driver.state(), MotorState::Enabled);
        assert!(motor.position() != 0, "the rotor moved during alignment");
    }

    #[test]
    fn test_calibration_fails_on_stuck_rotor() {
        let motor = SimMotor::stuck();
        let mut driver =
            BrushlessMotorDriver::new(motor.pwm(), motor.encoder(), POLE_PAIRS, CPR, GEAR);
        let mut timer = MockTimer::new();

        let result = driver.enable(&mut timer);
        assert_eq!(result, Err(MotorError::CalibrationFailed));
        assert_eq!(driver.state(), MotorState::Disabled);
    }

    #[test]
    fn test_encoder_fault_during_enable_cuts_power() {
        let motor = SimMotor::new(0.3, 20);
        motor.fail_encoder_after(50);
        let mut driver =
            BrushlessMotorDriver::new(motor.pwm(), motor.encoder(), POLE_PAIRS, CPR, GEAR);
        let mut timer = MockTimer::new();

        let result = driver.enable(&mut timer);
        assert_eq!(
            result,
            Err(MotorError::Platform(PlatformError::Encoder(
                EncoderError::NotResponding
            )))
        );
        assert_eq!(driver.state(), MotorState::Disabled);
        assert!(!motor.is_powered(), "stage off after a mid-alignment fault");
        assert_eq!(motor.last_duties(), (0.0, 0.0, 0.0), "windings released");
    }

    #[test]
    fn test_alignment_torque_backs_off_once_the_rotor_moves() {
        let dt = 1e-3;
        let mut torque = 0.0;
        for _ in 0..500 {
            torque = alignment_torque(torque, false, dt);
        }
        assert_eq!(torque, CAL_MAX_TORQUE, "ramp saturates at the ceiling");

        let peak = torque;
        torque = alignment_torque(torque, true, dt);
        assert!(torque < peak, "torque drops once the rotor breaks free");

        for _ in 0..10_000 {
            torque = alignment_torque(torque, true, dt);
        }
        assert!(torque >= 0.0, "back-off never inverts the torque");
    }

    #[test]
    fn test_speed_command_moves_the_rotor() {
        let motor = SimMotor::new(0.05, 5);
        let mut driver =
            BrushlessMotorDriver::new(motor.pwm(), motor.encoder(), POLE_PAIRS, CPR, GEAR);
        let mut timer = MockTimer::new();
        let config = MotorConfig::default();

        driver.enable(&mut timer).unwrap();
        let start_angle = driver.get_angle();

        driver.set_speed(1.0, 100.0);
        let mut now = timer.now_us();
        for _ in 0..500 {
            now += 1_000;
            driver.update(now, &config).unwrap();
        }
        assert!(
            driver.get_angle() > start_angle,
            "wheel angle advanced under a positive speed command"
        );
    }

    #[test]
    fn test_reference_never_runs_away_from_stalled_rotor() {
        let motor = SimMotor::new(0.05, 5);
        let mut driver =
            BrushlessMotorDriver::new(motor.pwm(), motor.encoder(), POLE_PAIRS, CPR, GEAR);
        let mut timer = MockTimer::new();
        let config = MotorConfig::default();

        driver.enable(&mut timer).unwrap();
        driver.set_speed(5.0, 1_000.0);
        let mut now = timer.now_us();
        for _ in 0..2_000 {
            now += 1_000;
            driver.update(now, &config).unwrap();
        }
        let error = driver.reference_angle - driver.encoder_angle;
        assert!(
            error.abs() <= MAX_ANGLE_ERROR + 1e-5,
            "reference stays within the clamp window, error {error}"
        );
    }

    #[test]
    fn test_disable_cuts_power() {
        let motor = SimMotor::new(0.3, 20);
        let mut driver =
            BrushlessMotorDriver::new(motor.pwm(), motor.encoder(), POLE_PAIRS, CPR, GEAR);
        let mut timer = MockTimer::new();

        driver.enable(&mut timer).unwrap();
        driver.disable().unwrap();
        assert_eq!(driver.state(), MotorState::Disabled);

        let pos = motor.position();
        let config = MotorConfig::default();
        driver.set_speed(2.0, 100.0);
        driver.update(1_000_000, &config).unwrap();
        assert_eq!(motor.position(), pos, "no drive after disable");
    }
}

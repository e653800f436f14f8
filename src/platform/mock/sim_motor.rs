//! Simulated brushless motor for calibration tests
//!
//! Models the one mechanical property the rotor-alignment procedure depends
//! on: static friction. The rotor does not move until the commanded field
//! amplitude exceeds a stiction threshold; above it, the encoder creeps by a
//! fixed number of counts per PWM update. A threshold of `f32::INFINITY`
//! models a stuck rotor (or a dead encoder), which must drive the calibration
//! into its retry/failure path.

use core::cell::RefCell;

use crate::platform::{
    error::{EncoderError, PlatformError},
    traits::{Encoder, ThreePhasePwm},
    Result,
};

#[derive(Debug)]
struct SimState {
    stiction_amplitude: f32,
    counts_per_step: i32,
    position: i32,
    enabled: bool,
    last_duties: (f32, f32, f32),
    /// Successful encoder reads left before the sensor goes dark, if set
    encoder_reads_left: Option<u32>,
}

/// Shared simulated motor; hand out `pwm()` and `encoder()` to the driver
#[derive(Debug)]
pub struct SimMotor {
    state: RefCell<SimState>,
}

impl SimMotor {
    /// Rotor that breaks free once the phase-amplitude exceeds `stiction_amplitude`
    pub fn new(stiction_amplitude: f32, counts_per_step: i32) -> Self {
        Self {
            state: RefCell::new(SimState {
                stiction_amplitude,
                counts_per_step,
                position: 0,
                enabled: false,
                last_duties: (0.0, 0.0, 0.0),
                encoder_reads_left: None,
            }),
        }
    }

    /// Rotor that never moves regardless of torque
    pub fn stuck() -> Self {
        Self::new(f32::INFINITY, 0)
    }

    pub fn pwm(&self) -> SimMotorPwm<'_> {
        SimMotorPwm { motor: self }
    }

    pub fn encoder(&self) -> SimMotorEncoder<'_> {
        SimMotorEncoder { motor: self }
    }

    pub fn position(&self) -> i32 {
        self.state.borrow().position
    }

    /// Whether the power stage is currently enabled
    pub fn is_powered(&self) -> bool {
        self.state.borrow().enabled
    }

    /// Phase duties of the most recent PWM update
    pub fn last_duties(&self) -> (f32, f32, f32) {
        self.state.borrow().last_duties
    }

    /// Let the next `reads` encoder reads succeed, then fail every one after
    pub fn fail_encoder_after(&self, reads: u32) {
        self.state.borrow_mut().encoder_reads_left = Some(reads);
    }
}

/// PWM side of the simulated motor
#[derive(Debug)]
pub struct SimMotorPwm<'a> {
    motor: &'a SimMotor,
}

impl ThreePhasePwm for SimMotorPwm<'_> {
    fn set_duty(&mut self, phase_a: f32, phase_b: f32, phase_c: f32) -> Result<()> {
        let mut state = self.motor.state.borrow_mut();
        state.last_duties = (phase_a, phase_b, phase_c);
        if !state.enabled {
            return Ok(());
        }
        // Field amplitude seen by the rotor is the phase-to-phase swing.
        let max = phase_a.max(phase_b).max(phase_c);
        let min = phase_a.min(phase_b).min(phase_c);
        if max - min >= state.stiction_amplitude {
            let step = state.counts_per_step;
            state.position = state.position.wrapping_add(step);
        }
        Ok(())
    }

    fn set_enabled(&mut self, enabled: bool) -> Result<()> {
        self.motor.state.borrow_mut().enabled = enabled;
        Ok(())
    }
}

/// Encoder side of the simulated motor
#[derive(Debug)]
pub struct SimMotorEncoder<'a> {
    motor: &'a SimMotor,
}

impl Encoder for SimMotorEncoder<'_> {
    fn read(&mut self) -> Result<i32> {
        let mut state = self.motor.state.borrow_mut();
        if let Some(reads) = state.encoder_reads_left.as_mut() {
            if *reads == 0 {
                return Err(PlatformError::Encoder(EncoderError::NotResponding));
            }
            *reads -= 1;
        }
        Ok(state.position)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rotor_holds_below_stiction() {
        let motor = SimMotor::new(0.3, 20);
        let mut pwm = motor.pwm();
        pwm.set_enabled(true).unwrap();
        pwm.set_duty(0.55, 0.5, 0.45).unwrap();
        assert_eq!(motor.position(), 0, "amplitude 0.1 is below stiction 0.3");
    }

    #[test]
    fn test_rotor_creeps_above_stiction() {
        let motor = SimMotor::new(0.3, 20);
        let mut pwm = motor.pwm();
        let mut encoder = motor.encoder();
        pwm.set_enabled(true).unwrap();
        pwm.set_duty(0.9, 0.5, 0.1).unwrap();
        pwm.set_duty(0.9, 0.5, 0.1).unwrap();
        assert_eq!(encoder.read().unwrap(), 40);
    }

    #[test]
    fn test_encoder_goes_dark_after_budgeted_reads() {
        let motor = SimMotor::new(0.3, 20);
        motor.fail_encoder_after(2);
        let mut encoder = motor.encoder();
        assert!(encoder.read().is_ok());
        assert!(encoder.read().is_ok());
        assert!(encoder.read().is_err());
    }

    #[test]
    fn test_disabled_stage_produces_no_motion() {
        let motor = SimMotor::new(0.1, 20);
        let mut pwm = motor.pwm();
        pwm.set_duty(1.0, 0.5, 0.0).unwrap();
        assert_eq!(motor.position(), 0);
    }
}

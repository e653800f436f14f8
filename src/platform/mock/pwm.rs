//! Mock PWM implementations for testing

use crate::platform::{
    error::{PlatformError, PwmError},
    traits::{PwmOutput, ThreePhasePwm},
    Result,
};

/// Mock single-pin PWM output
///
/// Tracks the last commanded duty for test verification.
#[derive(Debug, Default)]
pub struct MockPwmOutput {
    duty: f32,
}

impl MockPwmOutput {
    pub fn new() -> Self {
        Self { duty: 0.0 }
    }

    pub fn duty(&self) -> f32 {
        self.duty
    }
}

impl PwmOutput for MockPwmOutput {
    fn set_duty(&mut self, duty: f32) -> Result<()> {
        if !(0.0..=1.0).contains(&duty) {
            return Err(PlatformError::Pwm(PwmError::InvalidDutyCycle));
        }
        self.duty = duty;
        Ok(())
    }
}

/// Mock three-phase PWM stage
///
/// Tracks phase duties and the enabled state for test verification.
#[derive(Debug, Default)]
pub struct MockThreePhasePwm {
    duties: (f32, f32, f32),
    enabled: bool,
}

impl MockThreePhasePwm {
    pub fn new() -> Self {
        Self {
            duties: (0.0, 0.0, 0.0),
            enabled: false,
        }
    }

    pub fn duties(&self) -> (f32, f32, f32) {
        self.duties
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }
}

impl ThreePhasePwm for MockThreePhasePwm {
    fn set_duty(&mut self, phase_a: f32, phase_b: f32, phase_c: f32) -> Result<()> {
        for duty in [phase_a, phase_b, phase_c] {
            if !(0.0..=1.0).contains(&duty) {
                return Err(PlatformError::Pwm(PwmError::InvalidDutyCycle));
            }
        }
        self.duties = (phase_a, phase_b, phase_c);
        Ok(())
    }

    fn set_enabled(&mut self, enabled: bool) -> Result<()> {
        self.enabled = enabled;
        Ok(())
    }
}

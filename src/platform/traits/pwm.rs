//! PWM output interfaces

use crate::platform::error::Result;

/// Single PWM output pin
///
/// Used in pairs by the brushed H-bridge driver. Duty cycles are normalized
/// fractions; the implementation maps them onto its own counter resolution.
pub trait PwmOutput {
    /// Set duty cycle as a fraction [0.0, 1.0]
    fn set_duty(&mut self, duty: f32) -> Result<()>;
}

/// Three-phase PWM output stage of one brushless motor driver
///
/// Each wheel owns its stage exclusively; there is no sharing across wheels.
/// The power stage is expected to start disabled with all phases at zero.
pub trait ThreePhasePwm {
    /// Set the duty cycle of all three phases at once, as fractions [0.0, 1.0]
    ///
    /// Implementations should latch all three values within the same PWM
    /// period so the synthesized field vector is never torn between phases.
    fn set_duty(&mut self, phase_a: f32, phase_b: f32, phase_c: f32) -> Result<()>;

    /// Enable or disable the power stage
    ///
    /// Disabling must force all phases to high impedance (motor freewheels).
    fn set_enabled(&mut self, enabled: bool) -> Result<()>;
}

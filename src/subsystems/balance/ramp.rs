//! Trapezoidal target ramping
//!
//! The controller must never see a step in its target; a step in demanded
//! speed excites exactly the body dynamics the balance loop is trying to
//! keep quiet. Speed targets ramp under an acceleration bound whose change
//! is itself jerk-bounded; omega ramps under a plain acceleration bound.

use crate::core::parameters::PhysicalConstants;

use super::TargetMovement;

/// One jerk-bounded scalar ramp
#[derive(Debug, Clone, Copy, Default)]
pub struct AxisRamp {
    speed: f32,
    accel: f32,
}

impl AxisRamp {
    pub fn speed(&self) -> f32 {
        self.speed
    }

    /// Acceleration currently applied by the ramp [m/s²]
    pub fn accel(&self) -> f32 {
        self.accel
    }

    pub fn reset(&mut self) {
        self.speed = 0.0;
        self.accel = 0.0;
    }

    /// Advance one cycle toward `target`
    pub fn update(&mut self, target: f32, max_speed: f32, max_accel: f32, max_jerk: f32, dt: f32) {
        let demanded_accel = ((target - self.speed) / dt).clamp(-max_accel, max_accel);
        let jerk_step = max_jerk * dt;
        self.accel += (demanded_accel - self.accel).clamp(-jerk_step, jerk_step);
        self.speed = (self.speed + self.accel * dt).clamp(-max_speed, max_speed);
    }
}

/// Ramped view of the externally demanded movement
#[derive(Debug, Clone, Copy, Default)]
pub struct TargetRamp {
    pub x: AxisRamp,
    pub y: AxisRamp,
    omega: f32,
}

impl TargetRamp {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn omega(&self) -> f32 {
        self.omega
    }

    pub fn reset(&mut self) {
        self.x.reset();
        self.y.reset();
        self.omega = 0.0;
    }

    /// Advance all three targets one cycle
    pub fn update(&mut self, target: &TargetMovement, physics: &PhysicalConstants, dt: f32) {
        if dt <= 0.0 {
            return;
        }
        self.x.update(
            target.x,
            physics.max_speed,
            physics.max_accel,
            physics.max_jerk,
            dt,
        );
        self.y.update(
            target.y,
            physics.max_speed,
            physics.max_accel,
            physics.max_jerk,
            dt,
        );
        let omega_step = physics.max_omega_accel * dt;
        self.omega += (target.omega - self.omega).clamp(-omega_step, omega_step);
        self.omega = self.omega.clamp(-physics.max_omega, physics.max_omega);
    }
}

//! Balance controller
//!
//! Turns the fused tilt state and the measured body motion into a corrective
//! body speed. Each horizontal axis runs its own [`plane::ControlPlane`], a
//! weighted multi-term error controller; the externally demanded movement is
//! first smoothed by a jerk-bounded [`ramp::TargetRamp`] so the planes only
//! ever see continuous targets. Omega is passed through the ramp unchanged
//! by the error model.

pub mod controller;
pub mod plane;
pub mod ramp;

pub use controller::BalanceController;

/// Externally demanded movement of the bot
#[derive(Debug, Clone, Copy, Default, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TargetMovement {
    /// Speed in the x direction [m/s]
    pub x: f32,
    /// Speed in the y direction [m/s]
    pub y: f32,
    /// Turn rate [rad/s]
    pub omega: f32,
}

//! Whole-bot balance controller
//!
//! Owns the two control planes and the target ramp and presents one
//! `update` per fused orientation sample. Output is the corrective body
//! speed (x, y) plus the ramped omega; the caller feeds those to inverse
//! kinematics.

use crate::core::parameters::Config;
use crate::subsystems::orientation::OrientationSample;

use super::plane::{AxisSensor, AxisTarget, ControlPlane};
use super::ramp::TargetRamp;
use super::TargetMovement;

#[derive(Debug)]
pub struct BalanceController {
    plane_x: ControlPlane,
    plane_y: ControlPlane,
    ramp: TargetRamp,
    target: TargetMovement,
}

impl BalanceController {
    pub fn new(config: &Config) -> Self {
        Self {
            plane_x: ControlPlane::new(&config.physical),
            plane_y: ControlPlane::new(&config.physical),
            ramp: TargetRamp::new(),
            target: TargetMovement::default(),
        }
    }

    /// Externally demanded movement; mutate freely between cycles
    pub fn target_mut(&mut self) -> &mut TargetMovement {
        &mut self.target
    }

    pub fn set_target(&mut self, target: TargetMovement) {
        self.target = target;
    }

    /// Corrective speed in the x direction [m/s]
    pub fn speed_x(&self) -> f32 {
        self.plane_x.speed()
    }

    /// Corrective speed in the y direction [m/s]
    pub fn speed_y(&self) -> f32 {
        self.plane_y.speed()
    }

    /// Ramped turn rate [rad/s]; omega is not error-corrected
    pub fn omega(&self) -> f32 {
        self.ramp.omega()
    }

    /// Drop all controller state; targets are kept
    pub fn reset(&mut self) {
        self.plane_x.reset();
        self.plane_y.reset();
        self.ramp.reset();
    }

    /// One balance cycle
    ///
    /// `(vx, vy)` is the measured body speed from forward kinematics for
    /// this cycle, `sample` the fused orientation. A non-positive `dt` is a
    /// no-op.
    pub fn update(
        &mut self,
        dt: f32,
        vx: f32,
        vy: f32,
        sample: &OrientationSample,
        config: &Config,
    ) {
        if dt <= 0.0 {
            return;
        }
        self.ramp.update(&self.target, &config.physical, dt);
        let omega = self.ramp.omega();

        let target_x = AxisTarget {
            speed: self.ramp.x.speed(),
            accel: self.ramp.x.accel(),
        };
        let target_y = AxisTarget {
            speed: self.ramp.y.speed(),
            accel: self.ramp.y.accel(),
        };

        self.plane_x.update(
            dt,
            vx,
            &target_x,
            &AxisSensor {
                tilt: sample.tilt_x,
                rate: sample.rate_x,
            },
            omega,
            &config.balance,
            &config.physical,
        );
        self.plane_y.update(
            dt,
            vy,
            &target_y,
            &AxisSensor {
                tilt: sample.tilt_y,
                rate: sample.rate_y,
            },
            omega,
            &config.balance,
            &config.physical,
        );
    }
}

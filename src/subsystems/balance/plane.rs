//! Per-axis balance plane
//!
//! One `ControlPlane` stabilizes one horizontal axis. It tracks ball and
//! body motion against the ramped target, folds the differences into a
//! single weighted error interpreted as a corrective acceleration, and
//! integrates that into the commanded speed. The fall dynamics of the two
//! axes are independent at the tilt angles where the robot is still
//! recoverable; the coupling through the ball is handled downstream by
//! kinematics.

use crate::core::parameters::{BalanceConfig, PhysicalConstants};
use crate::libraries::filter::Fir;

/// Cutoff of the output speed filter [Hz]
const OUTPUT_CUTOFF_HZ: f32 = 15.0;
/// Cutoff of the acceleration input filters [Hz]
const INPUT_CUTOFF_HZ: f32 = 50.0;
/// FIR design parameters shared by all balance filters
const PASSBAND_RIPPLE: f32 = 1e-3;
const STOPBAND_LEAKAGE: f32 = 1e-6;

/// Tilt state of one axis, from the orientation estimator
#[derive(Debug, Clone, Copy, Default)]
pub struct AxisSensor {
    /// Tilt angle [rad]
    pub tilt: f32,
    /// Tilt rate [rad/s]
    pub rate: f32,
}

/// Ramped target of one axis
#[derive(Debug, Clone, Copy, Default)]
pub struct AxisTarget {
    /// Target speed [m/s]
    pub speed: f32,
    /// Acceleration the ramp is currently applying [m/s²]
    pub accel: f32,
}

#[derive(Debug)]
pub struct ControlPlane {
    // Previous-cycle memory for the derivative terms.
    last_target_angle: f32,
    last_ball_speed: f32,
    last_body_speed: f32,

    ball_position: f32,
    target_ball_position: f32,
    position_error_integral: f32,

    /// Commanded speed before output filtering [m/s]
    speed: f32,
    filtered_speed: f32,

    ball_accel_filter: Fir,
    body_accel_filter: Fir,
    output_filter: Fir,
}

impl ControlPlane {
    pub fn new(physics: &PhysicalConstants) -> Self {
        let fs = physics.sample_frequency;
        Self {
            last_target_angle: 0.0,
            last_ball_speed: 0.0,
            last_body_speed: 0.0,
            ball_position: 0.0,
            target_ball_position: 0.0,
            position_error_integral: 0.0,
            speed: 0.0,
            filtered_speed: 0.0,
            ball_accel_filter: Fir::lowpass(PASSBAND_RIPPLE, STOPBAND_LEAKAGE, fs, INPUT_CUTOFF_HZ),
            body_accel_filter: Fir::lowpass(PASSBAND_RIPPLE, STOPBAND_LEAKAGE, fs, INPUT_CUTOFF_HZ),
            output_filter: Fir::lowpass(PASSBAND_RIPPLE, STOPBAND_LEAKAGE, fs, OUTPUT_CUTOFF_HZ),
        }
    }

    /// Commanded speed after output filtering [m/s]
    pub fn speed(&self) -> f32 {
        self.filtered_speed
    }

    pub fn reset(&mut self) {
        self.last_target_angle = 0.0;
        self.last_ball_speed = 0.0;
        self.last_body_speed = 0.0;
        self.ball_position = 0.0;
        self.target_ball_position = 0.0;
        self.position_error_integral = 0.0;
        self.speed = 0.0;
        self.filtered_speed = 0.0;
        self.ball_accel_filter.reset();
        self.body_accel_filter.reset();
        self.output_filter.reset();
    }

    /// One control cycle
    ///
    /// `ball_speed` is the measured speed of this axis from forward
    /// kinematics; `target_omega` and `target_speed` of the other ramp feed
    /// the centripetal term. A non-positive `dt` leaves all state untouched.
    pub fn update(
        &mut self,
        dt: f32,
        ball_speed: f32,
        target: &AxisTarget,
        sensor: &AxisSensor,
        target_omega: f32,
        config: &BalanceConfig,
        physics: &PhysicalConstants,
    ) -> f32 {
        if dt <= 0.0 {
            return self.filtered_speed;
        }

        // Target tilt from the commanded acceleration, small-angle.
        let target_angle = target.accel / physics.gravity;
        let target_rate = (target_angle - self.last_target_angle) / dt;
        self.last_target_angle = target_angle;

        // Ball motion, measured vs. target.
        self.ball_position += ball_speed * dt;
        self.target_ball_position += target.speed * dt;
        let ball_accel = self
            .ball_accel_filter
            .update((ball_speed - self.last_ball_speed) / dt);
        self.last_ball_speed = ball_speed;

        // Body motion: the center of gravity leads the ball by the tilt
        // lever arm.
        let lever = physics.cog_height;
        let body_position = self.ball_position + sensor.tilt * lever;
        let target_body_position = self.target_ball_position + target_angle * lever;
        let body_speed = ball_speed + sensor.rate * lever;
        let target_body_speed = target.speed + target_rate * lever;
        let body_accel = self
            .body_accel_filter
            .update((body_speed - self.last_body_speed) / dt);
        self.last_body_speed = body_speed;

        let error_angle = sensor.tilt - target_angle;
        let error_rate = sensor.rate - target_rate;
        let error_ball_position = clamp_position_error(
            self.ball_position - self.target_ball_position,
            config.ball_position_weight,
            config,
            physics,
        );
        let error_ball_velocity = ball_speed - target.speed;
        let error_ball_accel = ball_accel - target.accel;
        let error_body_position = clamp_position_error(
            body_position - target_body_position,
            config.body_position_weight,
            config,
            physics,
        );
        let error_body_velocity = body_speed - target_body_speed;
        let error_body_accel = body_accel - target.accel;
        let centripetal = target_omega * target.speed;

        // Accumulate only while the weight is active, so turning the weight
        // on mid-run starts from a clean integral.
        if config.position_integral_weight > 0.0 {
            self.position_error_integral += error_ball_position * dt;
        } else {
            self.position_error_integral = 0.0;
        }

        let error = config.angle_weight * error_angle
            + config.angular_speed_weight * error_rate
            + config.ball_position_weight * error_ball_position
            + config.ball_velocity_weight * error_ball_velocity
            + config.ball_accel_weight * error_ball_accel
            + config.body_position_weight * error_body_position
            + config.body_velocity_weight * error_body_velocity
            + config.body_accel_weight * error_body_accel
            + config.omega_weight * centripetal
            + config.position_integral_weight * self.position_error_integral;
        let accel = error.clamp(-physics.max_accel, physics.max_accel);

        // Integrate into the commanded speed. The limit never blocks
        // braking: a step that shrinks the magnitude is always taken.
        let new_speed = self.speed - accel * dt;
        self.speed = if new_speed.abs() <= physics.max_speed
            || new_speed.abs() < self.speed.abs()
        {
            new_speed
        } else {
            new_speed.clamp(-physics.max_speed, physics.max_speed)
        };

        self.filtered_speed = self.output_filter.update(self.speed);
        self.filtered_speed
    }
}

/// A far-away position target must not demand more tilt than the angle
/// term can counteract; cap the position error so its weighted
/// contribution stays below the tilt authority.
fn clamp_position_error(
    error: f32,
    weight: f32,
    config: &BalanceConfig,
    physics: &PhysicalConstants,
) -> f32 {
    if weight <= 0.0 {
        return error;
    }
    let limit = config.angle_weight * physics.max_tilt_angle() / weight;
    error.clamp(-limit, limit)
}

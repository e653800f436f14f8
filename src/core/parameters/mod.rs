//! Configuration layer
//!
//! Typed configuration structs consumed by the control subsystems, plus a
//! name-indexed [`registry::ParameterRegistry`] that exposes the tunable
//! subset to an external tuning collaborator (serial menu, ground station).
//!
//! Defaults reproduce a tune that balanced the physical robot; they are
//! usable with no stored configuration. The core reads gains each cycle and
//! tolerates them changing between any two cycles without a reset.
//! Persistence and interactive mutation live outside this crate.

pub mod registry;

pub use registry::{ParamMetadata, ParameterRegistry, RegistryError};

use crate::libraries::pid::PidGains;

/// Orientation estimator configuration
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ImuConfig {
    /// Tilt reading of the physically upright robot, X axis [rad]
    pub null_offset_x: f32,
    /// Tilt reading of the physically upright robot, Y axis [rad]
    pub null_offset_y: f32,
    /// Accelerometer measurement variance of the tilt Kalman filter.
    /// Higher values trust the gyro longer and filter more noise.
    pub kalman_noise_variance: f32,
}

impl Default for ImuConfig {
    fn default() -> Self {
        Self {
            null_offset_x: -1.7_f32.to_radians(),
            null_offset_y: -1.0_f32.to_radians(),
            kalman_noise_variance: 0.03,
        }
    }
}

/// Motor driver configuration (all three wheels share one set)
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct MotorConfig {
    /// Position-loop gains, used at standstill (aggressive, holds position)
    pub pid_position: PidGains,
    /// Speed-loop gains, used at revolution speed (gentler)
    pub pid_speed: PidGains,
    /// Lifter axis gains (brushed motor, coarse encoder, low gains)
    pub pid_lifter: PidGains,
    /// Wheel revolutions per motor revolution (two 18/54 timing belts)
    pub gear_ratio: f32,
    /// Electrical no-load speed limit [rev/s], motor side
    pub max_rev_speed: f32,
    /// Default acceleration for wheel speed commands [rev/s^2]
    pub max_acceleration: f32,
}

impl Default for MotorConfig {
    fn default() -> Self {
        Self {
            pid_position: PidGains::new(2.1, 1.2, 0.0),
            pid_speed: PidGains::new(0.8, 0.5, 0.02),
            pid_lifter: PidGains::new(0.4, 0.001, 0.0),
            gear_ratio: (18.0 / 54.0) * (18.0 / 54.0),
            max_rev_speed: 60.0,
            max_acceleration: 1000.0,
        }
    }
}

/// Balance controller weights
///
/// One weight per error term of the state controller. A weight of zero
/// disables its term entirely.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct BalanceConfig {
    pub angle_weight: f32,
    pub angular_speed_weight: f32,
    pub ball_position_weight: f32,
    pub ball_velocity_weight: f32,
    pub ball_accel_weight: f32,
    pub body_position_weight: f32,
    pub body_velocity_weight: f32,
    pub body_accel_weight: f32,
    /// Weight of the centripetal term (target omega x target speed)
    pub omega_weight: f32,
    /// Weight of the integrated ball-position error; zero disables the integral
    pub position_integral_weight: f32,
}

impl Default for BalanceConfig {
    fn default() -> Self {
        Self {
            angle_weight: 39.0,
            angular_speed_weight: 21.0,
            ball_position_weight: 1.5,
            ball_velocity_weight: 0.0,
            ball_accel_weight: 1.3,
            body_position_weight: 0.0,
            body_velocity_weight: 9.0,
            body_accel_weight: 0.0,
            omega_weight: 0.0,
            position_integral_weight: 0.0,
        }
    }
}

/// Mechanical constants of the robot
///
/// Not tunable at runtime; changing these means the hardware changed.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PhysicalConstants {
    /// Gravitational acceleration [m/s^2]
    pub gravity: f32,
    /// Height of the centre of gravity above the ground [m]
    pub cog_height: f32,
    /// Maximum bot translation speed [m/s]
    pub max_speed: f32,
    /// Maximum bot acceleration [m/s^2]
    pub max_accel: f32,
    /// Maximum rate of change of acceleration [m/s^3]
    pub max_jerk: f32,
    /// Maximum yaw rate [rad/s]
    pub max_omega: f32,
    /// Maximum yaw acceleration [rad/s^2]
    pub max_omega_accel: f32,
    /// IMU/control loop frequency [Hz]
    pub sample_frequency: f32,
    /// Omniwheel radius [m]
    pub wheel_radius: f32,
    /// Rake angle of the wheel axes against the horizontal [rad]
    pub wheel_rake_angle: f32,
    /// Radius of the ball the robot rides on [m]
    pub ball_radius: f32,
}

impl Default for PhysicalConstants {
    fn default() -> Self {
        Self {
            gravity: 9.81,
            cog_height: 0.18,
            max_speed: 1.8,
            max_accel: 1.0,
            max_jerk: 0.1,
            max_omega: 6.0,
            max_omega_accel: 0.1,
            sample_frequency: 200.0,
            wheel_radius: 0.03,
            wheel_rake_angle: core::f32::consts::FRAC_PI_4,
            ball_radius: 0.1,
        }
    }
}

impl PhysicalConstants {
    /// Nominal time between control cycles [s]
    pub fn sampling_time(&self) -> f32 {
        1.0 / self.sample_frequency
    }

    /// Tip-over limit: the tilt the maximum acceleration can still catch [rad]
    pub fn max_tilt_angle(&self) -> f32 {
        libm::atanf(self.max_accel / self.gravity)
    }
}

/// Aggregate configuration passed through the control pipeline
#[derive(Debug, Clone, Copy, Default, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Config {
    pub imu: ImuConfig,
    pub motor: MotorConfig,
    pub balance: BalanceConfig,
    pub physical: PhysicalConstants,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_sane() {
        let config = Config::default();
        assert!(config.physical.max_tilt_angle() > 0.0);
        assert!(config.physical.max_tilt_angle() < 0.2, "tip-over limit ~5.8 deg");
        assert!((config.motor.gear_ratio - 1.0 / 9.0).abs() < 1e-6);
        assert_eq!(config.balance.angle_weight, 39.0);
        assert!((config.physical.sampling_time() - 0.005).abs() < 1e-9);
    }
}

//! IMU sensor interface

use crate::platform::error::Result;

/// One raw accelerometer + gyroscope reading, in sensor axes
///
/// Acceleration in m/s^2, angular rate in rad/s. No axis remapping or offset
/// correction happens at this level; the orientation estimator owns both.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RawImuSample {
    pub accel_x: f32,
    pub accel_y: f32,
    pub accel_z: f32,
    pub gyro_x: f32,
    pub gyro_y: f32,
    pub gyro_z: f32,
}

/// Accelerometer/gyroscope combo sensor
///
/// On hardware the data-ready line raises an interrupt that increments a
/// counter; `data_ready()` consumes that counter. The sensor sets the cadence
/// of the whole balance loop, so callers poll `data_ready()` rather than
/// pacing themselves by wall clock.
pub trait ImuSensor {
    /// True if at least one unread sample is pending; consumes the flag
    fn data_ready(&mut self) -> bool;

    /// Read the latest raw sample
    ///
    /// Must be non-blocking and return the most recent measurement.
    fn read(&mut self) -> Result<RawImuSample>;
}

//! Mock IMU implementation for testing

use crate::platform::{
    traits::{ImuSensor, RawImuSample},
    Result,
};

/// Mock accelerometer/gyroscope
///
/// Tests set the current raw sample and arm the data-ready counter; each call
/// to `data_ready()` consumes one pending sample, mirroring the interrupt
/// counter a real sensor drives.
#[derive(Debug, Default)]
pub struct MockImu {
    sample: RawImuSample,
    pending: u32,
}

impl MockImu {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a mock resting flat (gravity on +Z, no rotation)
    pub fn level() -> Self {
        Self {
            sample: RawImuSample {
                accel_z: 9.81,
                ..Default::default()
            },
            pending: 0,
        }
    }

    /// Replace the sample returned by `read()`
    pub fn set_sample(&mut self, sample: RawImuSample) {
        self.sample = sample;
    }

    /// Arm `count` data-ready events
    pub fn raise_data_ready(&mut self, count: u32) {
        self.pending = self.pending.saturating_add(count);
    }
}

impl ImuSensor for MockImu {
    fn data_ready(&mut self) -> bool {
        if self.pending > 0 {
            self.pending -= 1;
            true
        } else {
            false
        }
    }

    fn read(&mut self) -> Result<RawImuSample> {
        Ok(self.sample)
    }
}

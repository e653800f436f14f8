//! Orientation estimation
//!
//! Fuses the accelerometer tilt (absolute but noisy) with the gyro rate
//! (quiet but drifting) into a drift-corrected tilt angle and rate per
//! horizontal axis, one Kalman filter each. The estimator is the pacemaker
//! of the balance loop: a new fused sample raises a one-shot flag the
//! controller consumes, so the loop runs at the sensor's cadence rather
//! than wall-clock polling.

use libm::asinf;

use crate::core::parameters::{ImuConfig, PhysicalConstants};
use crate::core::time::DeltaTimer;
use crate::platform::{
    error::{ImuError, PlatformError},
    traits::{ImuSensor, RawImuSample, TimerInterface},
    Result,
};
use crate::{log_info, log_warn};

/// Calibration gives up if the sensor stays silent this long [ms]
const CALIBRATION_TIMEOUT_MS: u32 = 10_000;

/// Fused tilt state of both horizontal axes
#[derive(Debug, Clone, Copy, Default, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct OrientationSample {
    /// Tilt in the x direction [rad]
    pub tilt_x: f32,
    /// Tilt in the y direction [rad]
    pub tilt_y: f32,
    /// Tilt rate in the x direction [rad/s]
    pub rate_x: f32,
    /// Tilt rate in the y direction [rad/s]
    pub rate_y: f32,
}

/// Per-axis tilt estimator over a raw accel/gyro stream
#[derive(Debug)]
pub struct OrientationEstimator {
    filter_x: crate::libraries::filter::KalmanTiltFilter,
    filter_y: crate::libraries::filter::KalmanTiltFilter,
    timer: DeltaTimer,

    gravity: f32,
    max_tilt: f32,
    max_rate: f32,
    nominal_dt: f32,
    null_x: f32,
    null_y: f32,

    /// Samples still to discard before the filters are trusted
    warmup_remaining: u32,
    warmup_samples: u32,
    sample: OrientationSample,
    pending_dt: Option<f32>,
}

impl OrientationEstimator {
    pub fn new(config: &ImuConfig, physics: &PhysicalConstants) -> Self {
        let warmup = (2.0 * physics.sample_frequency) as u32;
        let mut estimator = Self {
            filter_x: Default::default(),
            filter_y: Default::default(),
            timer: DeltaTimer::new(),
            gravity: physics.gravity,
            max_tilt: physics.max_tilt_angle(),
            max_rate: physics.max_tilt_angle() / physics.sampling_time(),
            nominal_dt: physics.sampling_time(),
            null_x: config.null_offset_x,
            null_y: config.null_offset_y,
            warmup_remaining: warmup,
            warmup_samples: warmup,
            sample: OrientationSample::default(),
            pending_dt: None,
        };
        estimator.apply_config(config);
        estimator
    }

    /// Pick up hot-swapped tuning values
    pub fn apply_config(&mut self, config: &ImuConfig) {
        self.null_x = config.null_offset_x;
        self.null_y = config.null_offset_y;
        self.filter_x.set_noise_variance(config.kalman_noise_variance);
        self.filter_y.set_noise_variance(config.kalman_noise_variance);
    }

    /// Discard all filter state and restart the warm-up
    pub fn reset(&mut self) {
        self.filter_x.setup(0.0);
        self.filter_y.setup(0.0);
        self.timer.reset();
        self.warmup_remaining = self.warmup_samples;
        self.sample = OrientationSample::default();
        self.pending_dt = None;
    }

    /// Latest fused sample
    pub fn sample(&self) -> OrientationSample {
        self.sample
    }

    /// True once the warm-up is over and both axes are inside the tip-over
    /// envelope. A violation is the fail-safe signal for the caller, not an
    /// error.
    pub fn is_valid(&self) -> bool {
        if self.warmup_remaining > 0 {
            return false;
        }
        let s = &self.sample;
        let tilt_ok = s.tilt_x.abs() < self.max_tilt && s.tilt_y.abs() < self.max_tilt;
        let rate_ok = s.rate_x.abs() < self.max_rate && s.rate_y.abs() < self.max_rate;
        if !tilt_ok || !rate_ok {
            log_warn!(
                "orientation outside envelope: tilt ({}, {}) rate ({}, {})",
                s.tilt_x,
                s.tilt_y,
                s.rate_x,
                s.rate_y
            );
        }
        tilt_ok && rate_ok
    }

    /// One-shot: the `dT` of the newest fused sample, once per sample
    pub fn consume_update(&mut self) -> Option<f32> {
        self.pending_dt.take()
    }

    /// Poll the sensor and fuse a pending sample, if any
    pub fn update<I: ImuSensor>(&mut self, imu: &mut I, now_us: u64) -> Result<()> {
        if !imu.data_ready() {
            return Ok(());
        }
        let raw = imu.read()?;
        let dt = self.timer.dt(now_us);
        self.fuse(&raw, dt);
        Ok(())
    }

    /// Tilt angle implied by one accelerometer axis, small-angle safe
    fn accel_tilt(&self, accel: f32) -> f32 {
        asinf(-accel.clamp(-self.gravity, self.gravity) / self.gravity)
    }

    fn fuse(&mut self, raw: &RawImuSample, dt: f32) {
        let tilt_raw_x = self.accel_tilt(raw.accel_x);
        let tilt_raw_y = self.accel_tilt(raw.accel_y);
        // The filter keeps each tilt rate in the same axis slot as its
        // angle, hence the gyro axis swap.
        let rate_x = raw.gyro_y;
        let rate_y = -raw.gyro_x;

        if dt <= 0.0 {
            // First sample since reset: seed the filters, nothing to fuse.
            self.filter_x.setup(tilt_raw_x);
            self.filter_y.setup(tilt_raw_y);
            return;
        }

        self.filter_x.update(tilt_raw_x, rate_x, dt);
        self.filter_y.update(tilt_raw_y, rate_y, dt);
        self.sample = OrientationSample {
            tilt_x: self.filter_x.angle() - self.null_x,
            tilt_y: self.filter_y.angle() - self.null_y,
            rate_x: self.filter_x.rate(),
            rate_y: self.filter_y.rate(),
        };

        if self.warmup_remaining > 0 {
            self.warmup_remaining -= 1;
            return;
        }
        self.pending_dt = Some(dt);
    }

    /// Learn new null offsets with the robot held upright and still
    ///
    /// Runs the fusion with zero offsets until the filters converge, adopts
    /// the converged angles as the new nulls and writes them into `config`.
    /// Blocks; the filters restart their warm-up afterwards.
    pub fn calibrate<I: ImuSensor, T: TimerInterface>(
        &mut self,
        imu: &mut I,
        timer: &mut T,
        config: &mut ImuConfig,
    ) -> Result<()> {
        self.null_x = 0.0;
        self.null_y = 0.0;
        self.reset();

        if let Err(err) = self.converge(imu, timer) {
            // A failed run must not leave the zeroed nulls behind.
            self.apply_config(config);
            self.reset();
            return Err(err);
        }

        config.null_offset_x = self.filter_x.angle();
        config.null_offset_y = self.filter_y.angle();
        log_info!(
            "imu null offsets calibrated: ({}, {})",
            config.null_offset_x,
            config.null_offset_y
        );
        self.apply_config(config);
        self.reset();
        Ok(())
    }

    /// Fuse samples until the filters have seen a full warm-up
    fn converge<I: ImuSensor, T: TimerInterface>(
        &mut self,
        imu: &mut I,
        timer: &mut T,
    ) -> Result<()> {
        // The sensor cadence defines dT here; the robot is held still, so
        // the nominal sampling time is exact enough.
        let dt = self.nominal_dt;
        let mut fused: u32 = 0;
        let mut idle_ms: u32 = 0;
        while fused < self.warmup_samples + 1 {
            if imu.data_ready() {
                let raw = imu.read()?;
                self.fuse(&raw, if fused == 0 { 0.0 } else { dt });
                fused += 1;
                idle_ms = 0;
            } else {
                timer.delay_ms(1)?;
                idle_ms += 1;
                if idle_ms > CALIBRATION_TIMEOUT_MS {
                    return Err(PlatformError::Imu(ImuError::BadSample));
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::mock::{MockImu, MockTimer};

    fn estimator() -> OrientationEstimator {
        let config = ImuConfig {
            null_offset_x: 0.0,
            null_offset_y: 0.0,
            ..Default::default()
        };
        OrientationEstimator::new(&config, &PhysicalConstants::default())
    }

    fn run_samples(
        est: &mut OrientationEstimator,
        imu: &mut MockImu,
        start_us: u64,
        n: u32,
    ) -> u64 {
        let mut now = start_us;
        for _ in 0..n {
            now += 5_000;
            imu.raise_data_ready(1);
            est.update(imu, now).unwrap();
        }
        now
    }

    #[test]
    fn test_no_sample_without_data_ready() {
        let mut est = estimator();
        let mut imu = MockImu::level();
        est.update(&mut imu, 5_000).unwrap();
        assert_eq!(est.consume_update(), None);
    }

    #[test]
    fn test_warmup_withholds_updates() {
        let mut est = estimator();
        let mut imu = MockImu::level();
        run_samples(&mut est, &mut imu, 0, 10);
        assert_eq!(est.consume_update(), None, "still warming up");
        assert!(!est.is_valid());
    }

    #[test]
    fn test_update_flag_is_one_shot() {
        let mut est = estimator();
        let mut imu = MockImu::level();
        run_samples(&mut est, &mut imu, 0, 402);
        let dt = est.consume_update();
        assert!(dt.is_some());
        assert!((dt.unwrap() - 0.005).abs() < 1e-6);
        assert_eq!(est.consume_update(), None, "flag consumed");
    }

    #[test]
    fn test_level_robot_reads_zero_tilt() {
        let mut est = estimator();
        let mut imu = MockImu::level();
        run_samples(&mut est, &mut imu, 0, 402);
        let s = est.sample();
        assert!(s.tilt_x.abs() < 0.01, "tilt_x {}", s.tilt_x);
        assert!(s.tilt_y.abs() < 0.01, "tilt_y {}", s.tilt_y);
        assert!(est.is_valid());
    }

    #[test]
    fn test_excessive_tilt_reported_invalid() {
        let mut est = estimator();
        let mut imu = MockImu::level();
        let now = run_samples(&mut est, &mut imu, 0, 402);
        assert!(est.is_valid());

        // Accel reading of a body tilted far past the envelope.
        imu.set_sample(RawImuSample {
            accel_x: -9.81,
            accel_z: 0.5,
            ..Default::default()
        });
        run_samples(&mut est, &mut imu, now, 200);
        assert!(!est.is_valid(), "tilt beyond the envelope must flag");
    }

    #[test]
    fn test_calibrate_adopts_null_offsets() {
        let mut est = estimator();
        let mut timer = MockTimer::new();
        let mut config = ImuConfig::default();
        // Robot "upright" with a slightly skewed sensor.
        let mut imu = MockImu::level();
        imu.set_sample(RawImuSample {
            accel_x: -0.5,
            accel_z: 9.8,
            ..Default::default()
        });
        imu.raise_data_ready(500);

        est.calibrate(&mut imu, &mut timer, &mut config).unwrap();
        assert!(
            config.null_offset_x > 0.03,
            "converged skew became the null offset, got {}",
            config.null_offset_x
        );
    }

    #[test]
    fn test_failed_calibration_restores_null_offsets() {
        let mut config = ImuConfig::default();
        let mut est = OrientationEstimator::new(&config, &PhysicalConstants::default());
        let mut timer = MockTimer::new();
        // Sensor never signals data ready, so the calibration times out.
        let mut imu = MockImu::level();
        assert!(est.calibrate(&mut imu, &mut timer, &mut config).is_err());

        // A level stream must read the configured nulls again, not zero.
        run_samples(&mut est, &mut imu, 0, 402);
        let expected = -config.null_offset_x;
        let s = est.sample();
        assert!(
            (s.tilt_x - expected).abs() < 0.01,
            "configured null offsets back in effect, tilt_x {}",
            s.tilt_x
        );
    }
}

//! Two-state Kalman filter for one tilt axis
//!
//! State is the tilt angle and the gyro bias. The gyro rate drives the
//! prediction, the accelerometer-derived angle corrects it. One instance per
//! axis.

/// Process noise of the angle state [rad²/s]
const Q_ANGLE: f32 = 0.001;
/// Process noise of the gyro bias state [rad²/s]
const Q_BIAS: f32 = 0.003;
/// Default accelerometer measurement variance [rad²]
const DEFAULT_R_MEASURE: f32 = 0.03;

#[derive(Debug, Clone, Copy)]
pub struct KalmanTiltFilter {
    angle: f32,
    bias: f32,
    rate: f32,
    r_measure: f32,
    p: [[f32; 2]; 2],
}

impl Default for KalmanTiltFilter {
    fn default() -> Self {
        Self::new()
    }
}

impl KalmanTiltFilter {
    pub fn new() -> Self {
        Self {
            angle: 0.0,
            bias: 0.0,
            rate: 0.0,
            r_measure: DEFAULT_R_MEASURE,
            p: [[0.0; 2]; 2],
        }
    }

    /// Re-seed the filter at a known angle, discarding covariance and bias
    pub fn setup(&mut self, angle: f32) {
        self.angle = angle;
        self.bias = 0.0;
        self.rate = 0.0;
        self.p = [[0.0; 2]; 2];
    }

    /// Set the accelerometer measurement variance. Higher values trust the
    /// gyro longer.
    pub fn set_noise_variance(&mut self, variance: f32) {
        self.r_measure = variance;
    }

    /// Current angle estimate [rad]
    pub fn angle(&self) -> f32 {
        self.angle
    }

    /// Bias-corrected rate of the last update [rad/s]
    pub fn rate(&self) -> f32 {
        self.rate
    }

    /// Fuse one accelerometer angle and gyro rate sample. Returns the new
    /// angle estimate.
    pub fn update(&mut self, new_angle: f32, new_rate: f32, dt: f32) -> f32 {
        // Predict
        self.rate = new_rate - self.bias;
        self.angle += dt * self.rate;

        self.p[0][0] += dt * (dt * self.p[1][1] - self.p[0][1] - self.p[1][0] + Q_ANGLE);
        self.p[0][1] -= dt * self.p[1][1];
        self.p[1][0] -= dt * self.p[1][1];
        self.p[1][1] += Q_BIAS * dt;

        // Correct
        let s = self.p[0][0] + self.r_measure;
        let k0 = self.p[0][0] / s;
        let k1 = self.p[1][0] / s;

        let y = new_angle - self.angle;
        self.angle += k0 * y;
        self.bias += k1 * y;

        let p00 = self.p[0][0];
        let p01 = self.p[0][1];
        self.p[0][0] -= k0 * p00;
        self.p[0][1] -= k0 * p01;
        self.p[1][0] -= k1 * p00;
        self.p[1][1] -= k1 * p01;

        self.angle
    }
}

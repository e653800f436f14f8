//! Signal filters
//!
//! The tilt estimator fuses gyro and accelerometer through a two-state
//! Kalman filter; the balance controller smooths its noisy acceleration
//! inputs and its output with FIR low-pass filters.

pub mod fir;
pub mod kalman;

pub use fir::Fir;
pub use kalman::KalmanTiltFilter;

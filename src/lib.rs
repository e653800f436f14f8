#![cfg_attr(not(test), no_std)]

//! pico_ball - Balance-control core for a single-wheel (ball-riding) robot
//!
//! This library fuses tilt/rate measurements into a drift-corrected
//! orientation estimate, runs a weighted-error state controller that keeps
//! the robot upright, maps body-frame velocity to three omniwheel speeds
//! through a tilt-compensated kinematics transform, and commutates each
//! wheel's brushless motor with space-vector PWM behind a cascaded,
//! gain-scheduled PID loop.
//!
//! The crate is a library invoked from an outer real-time loop. It owns no
//! peripherals directly; hardware is reached through the traits in
//! [`platform`], with mock implementations for host-side testing.

// Platform abstraction layer (encoder, PWM, IMU and timer traits + mocks)
pub mod platform;

// Ambient infrastructure (logging, delta timing, configuration)
pub mod core;

// Reusable numeric blocks (filters, PID, motor drivers)
pub mod libraries;

// Control subsystems (orientation estimation, kinematics, balance)
pub mod subsystems;

// Vehicle layer wiring the pipeline together
pub mod bot;

//! Reusable control-theory building blocks
//!
//! Domain-independent pieces shared by the subsystems: PID controllers,
//! filters, and the motor drivers built on top of them.

pub mod filter;
pub mod motor_driver;
pub mod pid;

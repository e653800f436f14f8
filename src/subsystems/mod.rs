//! Control subsystems
//!
//! The balance pipeline, leaves first: orientation estimation, the
//! omniwheel kinematics transform and the balance controller. The vehicle
//! layer in [`crate::bot`] wires them together with the motor drivers.

pub mod balance;
pub mod kinematics;
pub mod orientation;

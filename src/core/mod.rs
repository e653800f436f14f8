//! Core infrastructure
//!
//! This module contains the ambient services the control subsystems rely on:
//! logging, delta-time bookkeeping and the configuration/parameter layer.

pub mod logging;
pub mod parameters;
pub mod time;

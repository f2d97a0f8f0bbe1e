//! Core emulator logic for oxidized-psp
//!
//! This crate provides the pieces shared by every subsystem: error types,
//! configuration, and the virtual-time event scheduler that paces HLE work.

pub mod config;
pub mod error;
pub mod timing;

pub use config::{CompatConfig, Config, SystemParamConfig};
pub use error::{EmulatorError, MemoryError, Result};
pub use timing::{CoreTiming, EventType, FiredEvent};

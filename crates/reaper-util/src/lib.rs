//! Shared utilities for gpu-reaper
//!
//! This crate provides:
//! - ID types (WorkloadId, CycleId)
//! - Termination window parsing and formatting
//! - Time utilities (injectable clocks, duration helpers)
//! - Default paths for the policy file and log directory

mod ids;
mod paths;
mod time;
mod window;

pub use ids::*;
pub use paths::*;
pub use time::*;
pub use window::*;

//! Cluster adapter trait interfaces for gpu-reaper
//!
//! This crate defines the interface between the reconciler and the cluster:
//! discovering GPU-sharing workloads and terminating them. It contains no
//! cluster client code itself.

mod mock;
mod traits;
mod workload;

pub use mock::*;
pub use traits::*;
pub use workload::*;

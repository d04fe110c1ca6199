//! Core reconciliation logic for gpu-reaper
//!
//! This crate contains:
//! - The age cache memoizing first-seen creation times
//! - Per-cycle reports and workload verdicts
//! - The reconciliation loop that reloads policy, discovers, evaluates and terminates

mod age_cache;
mod reconciler;
mod report;

pub use age_cache::*;
pub use reconciler::*;
pub use report::*;

//! kubectl-backed cluster adapter for gpu-reaper
//!
//! Provides:
//! - GPU-share discovery via `kubectl inspect gpushare`
//! - Creation timestamps via `kubectl get pods -o json`
//! - Notebook-first termination with pod fallback

mod adapter;
mod command;
mod gpushare;
mod notebook;
mod pods;

pub use adapter::*;
pub use command::*;
pub use gpushare::*;
pub use notebook::*;
pub use pods::*;

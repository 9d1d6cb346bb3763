//! Periodic trigger adapters
//!
//! - `IntervalTrigger`: tokio interval timers for real runs
//! - `ManualTrigger`: stepped by hand, for deterministic tests

pub mod interval;
pub mod manual;

pub use interval::IntervalTrigger;
pub use manual::ManualTrigger;

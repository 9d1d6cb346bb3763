//! Domain errors for the eventual reconciliation system.
//!
//! Dropped deliveries and stale acknowledgments are not errors: they leave no
//! trace beyond the absence of a state transition. The variants here cover
//! construction faults and the driver-level convergence timeout.

use std::time::Duration;

use thiserror::Error;

/// Domain-level errors that can occur while building or driving the registries.
#[derive(Debug, Error)]
pub enum DomainError {
    #[error("Invalid fail rate: {0}. fail_every must be at least 1")]
    InvalidFailRate(u64),

    #[error("Invalid target field count: {0}. Must be at least 1")]
    InvalidTargetCount(u64),

    #[error("Invalid interval for {name}: must be greater than zero")]
    InvalidInterval { name: &'static str },

    #[error("Cannot schedule trigger '{label}': {reason}")]
    SchedulerUnavailable { label: String, reason: String },

    #[error(
        "Convergence not reached after {elapsed:?}: {field_count}/{target} fields, \
         {unannotated} unannotated, {unacknowledged} unacknowledged"
    )]
    ConvergenceTimeout {
        elapsed: Duration,
        field_count: u64,
        target: u64,
        unannotated: usize,
        unacknowledged: usize,
    },
}

pub type DomainResult<T> = Result<T, DomainError>;

/// Reject zero-length intervals, which would spin a trigger.
pub fn require_interval(name: &'static str, interval: Duration) -> DomainResult<Duration> {
    if interval.is_zero() {
        return Err(DomainError::InvalidInterval { name });
    }
    Ok(interval)
}

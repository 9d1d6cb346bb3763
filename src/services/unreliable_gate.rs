//! Deterministic failure injection.
//!
//! The gate drops every Nth attempt of each operation class. Dropping is a
//! plain `false`: no error value exists, and callers recover only through
//! the periodic sweeps.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, PoisonError};

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::ports::{AlwaysDeliver, ChannelReliability, Operation};

/// Drops every `fail_every`-th attempt, counted per operation.
///
/// `fail_every == 1` drops everything; intermittent failure needs at least 2.
#[derive(Debug)]
pub struct UnreliableGate {
    fail_every: u64,
    counters: Mutex<HashMap<Operation, u64>>,
}

impl UnreliableGate {
    pub fn new(fail_every: u64) -> DomainResult<Self> {
        if fail_every == 0 {
            return Err(DomainError::InvalidFailRate(fail_every));
        }
        Ok(Self {
            fail_every,
            counters: Mutex::new(HashMap::new()),
        })
    }

    pub fn fail_every(&self) -> u64 {
        self.fail_every
    }

    /// Attempts made so far for `operation`, dropped ones included.
    pub fn attempts(&self, operation: Operation) -> u64 {
        let counters = self.counters.lock().unwrap_or_else(PoisonError::into_inner);
        counters.get(&operation).copied().unwrap_or(0)
    }
}

impl ChannelReliability for UnreliableGate {
    fn attempt(&self, operation: Operation) -> bool {
        let attempt = {
            let mut counters = self.counters.lock().unwrap_or_else(PoisonError::into_inner);
            let counter = counters.entry(operation).or_insert(0);
            *counter += 1;
            *counter
        };

        let delivered = attempt % self.fail_every != 0;
        if !delivered {
            tracing::debug!(
                operation = %operation,
                attempt,
                fail_every = self.fail_every,
                "Dropping attempt"
            );
        }
        delivered
    }
}

/// Build the gate for an optional fail rate; `None` never drops.
pub fn gate_for(fail_every: Option<u64>) -> DomainResult<Arc<dyn ChannelReliability>> {
    match fail_every {
        Some(n) => Ok(Arc::new(UnreliableGate::new(n)?)),
        None => Ok(Arc::new(AlwaysDeliver::new())),
    }
}

/// Replays a fixed sequence of outcomes, then delivers everything.
///
/// Shared by all operations; useful for pinning exactly which attempt drops.
#[derive(Debug, Default)]
pub struct ScriptedReliability {
    script: Mutex<VecDeque<bool>>,
}

impl ScriptedReliability {
    pub fn new(outcomes: impl IntoIterator<Item = bool>) -> Self {
        Self {
            script: Mutex::new(outcomes.into_iter().collect()),
        }
    }

    /// Outcomes not yet consumed.
    pub fn remaining(&self) -> usize {
        self.script.lock().unwrap_or_else(PoisonError::into_inner).len()
    }
}

impl ChannelReliability for ScriptedReliability {
    fn attempt(&self, operation: Operation) -> bool {
        let next = self
            .script
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop_front();
        let delivered = next.unwrap_or(true);
        if !delivered {
            tracing::debug!(operation = %operation, "Dropping scripted attempt");
        }
        delivered
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_fail_rate_rejected() {
        let err = UnreliableGate::new(0).unwrap_err();
        assert!(matches!(err, DomainError::InvalidFailRate(0)));
    }

    #[test]
    fn test_every_nth_attempt_drops() {
        let gate = UnreliableGate::new(3).unwrap();
        let outcomes: Vec<bool> = (0..7).map(|_| gate.attempt(Operation::Annotate)).collect();
        assert_eq!(outcomes, vec![true, true, false, true, true, false, true]);
        assert_eq!(gate.attempts(Operation::Annotate), 7);
    }

    #[test]
    fn test_fail_every_one_drops_everything() {
        let gate = UnreliableGate::new(1).unwrap();
        assert!((0..10).all(|_| !gate.attempt(Operation::Acknowledge)));
    }

    #[test]
    fn test_counters_are_per_operation() {
        let gate = UnreliableGate::new(2).unwrap();
        assert!(gate.attempt(Operation::Annotate));
        assert!(gate.attempt(Operation::Acknowledge));
        assert!(!gate.attempt(Operation::Annotate));
        assert!(!gate.attempt(Operation::Acknowledge));
        assert_eq!(gate.attempts(Operation::Annotate), 2);
        assert_eq!(gate.attempts(Operation::AnnotateField), 0);
    }

    #[test]
    fn test_large_fail_rate_effectively_never_drops() {
        let gate = UnreliableGate::new(1_000_000).unwrap();
        assert!((0..10_000).all(|_| gate.attempt(Operation::Annotate)));
    }

    #[test]
    fn test_scripted_replays_then_delivers() {
        let script = ScriptedReliability::new([false, true, false]);
        assert!(!script.attempt(Operation::Annotate));
        assert!(script.attempt(Operation::Acknowledge));
        assert_eq!(script.remaining(), 1);
        assert!(!script.attempt(Operation::Annotate));
        assert!(script.attempt(Operation::Annotate));
        assert_eq!(script.remaining(), 0);
    }

    #[test]
    fn test_gate_for_none_always_delivers() {
        let gate = gate_for(None).unwrap();
        assert!((0..100).all(|_| gate.attempt(Operation::AnnotateField)));
        assert!(gate_for(Some(0)).is_err());
    }
}

//! Manually stepped trigger.
//!
//! Nothing fires on its own: callers advance scheduled actions with
//! [`ManualTrigger::tick`] or [`ManualTrigger::tick_all`], which makes sweep
//! cadence fully deterministic in tests.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use crate::domain::errors::DomainResult;
use crate::domain::ports::{PeriodicTrigger, TickAction, TickOutcome, TriggerHandle};

struct Entry {
    label: String,
    every: Duration,
    action: TickAction,
    cancelled: Arc<AtomicBool>,
}

impl Entry {
    fn is_live(&self) -> bool {
        !self.cancelled.load(Ordering::Acquire)
    }
}

/// Trigger whose actions fire only when stepped.
#[derive(Default)]
pub struct ManualTrigger {
    entries: Mutex<Vec<Entry>>,
}

impl ManualTrigger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fire every live action registered under `label` once, in registration
    /// order. Returns how many fired.
    pub async fn tick(&self, label: &str) -> usize {
        self.fire(|entry| entry.label == label).await
    }

    /// Fire every live action once, in registration order.
    pub async fn tick_all(&self) -> usize {
        self.fire(|_| true).await
    }

    async fn fire(&self, select: impl Fn(&Entry) -> bool) -> usize {
        let due: Vec<(TickAction, Arc<AtomicBool>)> = {
            let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
            entries.retain(Entry::is_live);
            entries
                .iter()
                .filter(|entry| select(entry))
                .map(|entry| (entry.action.clone(), entry.cancelled.clone()))
                .collect()
        };

        let mut fired = 0;
        for (action, cancelled) in due {
            // An earlier action in this round may have cancelled this one.
            if cancelled.load(Ordering::Acquire) {
                continue;
            }
            fired += 1;
            if action().await == TickOutcome::Stop {
                cancelled.store(true, Ordering::Release);
            }
        }
        fired
    }

    /// Number of live scheduled actions.
    pub fn active(&self) -> usize {
        let entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries.iter().filter(|e| e.is_live()).count()
    }

    pub fn is_scheduled(&self, label: &str) -> bool {
        let entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries.iter().any(|e| e.is_live() && e.label == label)
    }

    /// Interval a live action was scheduled with.
    pub fn interval_of(&self, label: &str) -> Option<Duration> {
        let entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries
            .iter()
            .find(|e| e.is_live() && e.label == label)
            .map(|e| e.every)
    }
}

impl PeriodicTrigger for ManualTrigger {
    fn schedule(
        &self,
        label: &str,
        every: Duration,
        action: TickAction,
    ) -> DomainResult<TriggerHandle> {
        let cancelled = Arc::new(AtomicBool::new(false));
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(Entry {
                label: label.to_string(),
                every,
                action,
                cancelled: cancelled.clone(),
            });
        Ok(TriggerHandle::new(label, cancelled, None))
    }
}

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::runtime::Handle;
use tokio::time::MissedTickBehavior;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::ports::{PeriodicTrigger, TickAction, TickOutcome, TriggerHandle};

/// Wall-clock trigger backed by `tokio::time::interval`.
///
/// Each scheduled action runs in its own task. The first firing happens one
/// full interval after scheduling, and a slow action delays the next tick
/// rather than bunching missed ones.
#[derive(Debug, Clone, Copy, Default)]
pub struct IntervalTrigger;

impl IntervalTrigger {
    pub fn new() -> Self {
        Self
    }
}

impl PeriodicTrigger for IntervalTrigger {
    fn schedule(
        &self,
        label: &str,
        every: Duration,
        action: TickAction,
    ) -> DomainResult<TriggerHandle> {
        let runtime = Handle::try_current().map_err(|e| DomainError::SchedulerUnavailable {
            label: label.to_string(),
            reason: e.to_string(),
        })?;

        let cancelled = Arc::new(AtomicBool::new(false));
        let stop_flag = cancelled.clone();
        let name = label.to_string();

        let task = runtime.spawn(async move {
            let mut ticker = tokio::time::interval(every);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            // Skip first tick (fires immediately)
            ticker.tick().await;

            tracing::debug!(
                trigger = %name,
                interval_ms = every.as_millis(),
                "Trigger started"
            );

            loop {
                ticker.tick().await;
                if stop_flag.load(Ordering::Acquire) {
                    break;
                }
                if action().await == TickOutcome::Stop {
                    stop_flag.store(true, Ordering::Release);
                    break;
                }
            }

            tracing::debug!(trigger = %name, "Trigger stopped");
        });

        Ok(TriggerHandle::new(label, cancelled, Some(task.abort_handle())))
    }
}

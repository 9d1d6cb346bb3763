//! Repeating trigger port.
//!
//! Registries never touch a clock directly. They hand an action to a
//! `PeriodicTrigger`, which fires it at a fixed interval until the returned
//! handle is cancelled or the action asks to stop.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use futures::future::BoxFuture;
use tokio::task::AbortHandle;

use crate::domain::errors::DomainResult;

/// What a trigger should do after running its action once.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Keep firing
    Continue,
    /// Suppress further ticks
    Stop,
}

/// Future produced by one firing of a trigger action.
pub type TickFuture = BoxFuture<'static, TickOutcome>;

/// Action run on every tick.
pub type TickAction = Arc<dyn Fn() -> TickFuture + Send + Sync>;

/// Schedules repeating actions.
pub trait PeriodicTrigger: Send + Sync {
    /// Start firing `action` every `every` until cancelled.
    fn schedule(&self, label: &str, every: Duration, action: TickAction)
        -> DomainResult<TriggerHandle>;
}

/// Handle to cancel a scheduled action.
#[derive(Debug)]
pub struct TriggerHandle {
    label: String,
    cancelled: Arc<AtomicBool>,
    abort: Option<AbortHandle>,
}

impl TriggerHandle {
    pub fn new(label: impl Into<String>, cancelled: Arc<AtomicBool>, abort: Option<AbortHandle>) -> Self {
        Self {
            label: label.into(),
            cancelled,
            abort,
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    /// Stop firing. Idempotent; an in-progress action is aborted at its next
    /// await point.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
        if let Some(abort) = &self.abort {
            abort.abort();
        }
    }

    /// True once cancelled, or once the action returned [`TickOutcome::Stop`].
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }
}

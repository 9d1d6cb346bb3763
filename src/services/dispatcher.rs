//! Fire-and-forget task dispatch.
//!
//! Outbound deliveries are spawned onto the tokio runtime without awaiting
//! them. Their handles are kept so finished ones can be reaped on the next
//! spawn, and so tests and shutdown can wait for or abort what is in flight.
//! The pool is unbounded.

use std::future::Future;
use std::sync::{Mutex, PoisonError};

use tokio::task::JoinHandle;

/// Unbounded pool of spawned deliveries.
#[derive(Debug, Default)]
pub struct Dispatcher {
    handles: Mutex<Vec<JoinHandle<()>>>,
}

impl Dispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Spawn `task` without waiting for it. Must be called within a tokio
    /// runtime.
    pub fn spawn<F>(&self, task: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let handle = tokio::spawn(task);
        let mut handles = self.handles.lock().unwrap_or_else(PoisonError::into_inner);
        handles.retain(|h| !h.is_finished());
        handles.push(handle);
    }

    /// Deliveries spawned and not yet finished.
    pub fn in_flight(&self) -> usize {
        let handles = self.handles.lock().unwrap_or_else(PoisonError::into_inner);
        handles.iter().filter(|h| !h.is_finished()).count()
    }

    /// Wait until nothing is in flight, including deliveries spawned while
    /// waiting.
    pub async fn flush(&self) {
        loop {
            let pending: Vec<JoinHandle<()>> = {
                let mut handles = self.handles.lock().unwrap_or_else(PoisonError::into_inner);
                std::mem::take(&mut *handles)
            };
            if pending.is_empty() {
                return;
            }
            for handle in pending {
                if let Err(e) = handle.await {
                    if e.is_panic() {
                        tracing::warn!(error = %e, "Dispatched delivery panicked");
                    }
                }
            }
        }
    }

    /// Abort everything in flight.
    pub fn abort_all(&self) {
        let mut handles = self.handles.lock().unwrap_or_else(PoisonError::into_inner);
        for handle in handles.drain(..) {
            handle.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    #[tokio::test]
    async fn test_flush_waits_for_spawned_tasks() {
        let dispatcher = Dispatcher::new();
        let done = Arc::new(AtomicUsize::new(0));

        for _ in 0..5 {
            let done = done.clone();
            dispatcher.spawn(async move {
                tokio::time::sleep(Duration::from_millis(5)).await;
                done.fetch_add(1, Ordering::SeqCst);
            });
        }

        dispatcher.flush().await;
        assert_eq!(done.load(Ordering::SeqCst), 5);
        assert_eq!(dispatcher.in_flight(), 0);
    }

    #[tokio::test]
    async fn test_flush_includes_tasks_spawned_during_flush() {
        let dispatcher = Arc::new(Dispatcher::new());
        let done = Arc::new(AtomicUsize::new(0));

        let inner_dispatcher = dispatcher.clone();
        let inner_done = done.clone();
        dispatcher.spawn(async move {
            let nested_done = inner_done.clone();
            inner_dispatcher.spawn(async move {
                nested_done.fetch_add(1, Ordering::SeqCst);
            });
            inner_done.fetch_add(1, Ordering::SeqCst);
        });

        dispatcher.flush().await;
        assert_eq!(done.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_abort_all_cancels_pending() {
        let dispatcher = Dispatcher::new();
        let done = Arc::new(AtomicUsize::new(0));

        let flag = done.clone();
        dispatcher.spawn(async move {
            tokio::time::sleep(Duration::from_secs(60)).await;
            flag.fetch_add(1, Ordering::SeqCst);
        });

        dispatcher.abort_all();
        dispatcher.flush().await;
        assert_eq!(done.load(Ordering::SeqCst), 0);
        assert_eq!(dispatcher.in_flight(), 0);
    }
}

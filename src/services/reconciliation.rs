//! Wiring of the two registries and convergence observation.
//!
//! The field registry publishes into `AnnotationRegistry::annotate`, the
//! annotation registry publishes into `FieldRegistry::annotate_field`, and the
//! field registry acknowledges through `AnnotationRegistry::acknowledge`. Any
//! other wiring cannot converge. The registries only ever see each other
//! through the port traits.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::info;

use crate::domain::errors::{require_interval, DomainError, DomainResult};
use crate::domain::models::{FieldId, ReconciliationConfig};
use crate::domain::ports::PeriodicTrigger;
use crate::services::annotation_registry::AnnotationRegistry;
use crate::services::field_registry::FieldRegistry;

/// Aggregate counters read from both registries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConvergenceSnapshot {
    pub field_count: u64,
    pub target: u64,
    pub unannotated: usize,
    pub annotations: usize,
    pub acknowledged: usize,
    pub unacknowledged: usize,
    pub taken_at: DateTime<Utc>,
}

impl ConvergenceSnapshot {
    /// Every field minted, every field annotated, nothing left unacknowledged.
    pub fn is_converged(&self) -> bool {
        self.field_count == self.target && self.unannotated == 0 && self.unacknowledged == 0
    }
}

/// Both registries, wired together.
///
/// Dropping the wiring shuts both registries down, which also breaks the
/// reference cycle between them.
pub struct Reconciliation {
    fields: Arc<FieldRegistry>,
    annotations: Arc<AnnotationRegistry>,
}

impl Reconciliation {
    /// Build both registries from `config` and wire them together.
    pub fn wire(
        config: &ReconciliationConfig,
        trigger: Arc<dyn PeriodicTrigger>,
    ) -> DomainResult<Self> {
        let fields = FieldRegistry::new(config, trigger.clone())?;
        let annotations = AnnotationRegistry::new(fields.clone(), config, trigger.as_ref())?;
        let wiring = Self::connect(fields, annotations, config.field_republish_interval())?;

        info!(
            target = config.target_field_count,
            annotate_fail_every = config.annotate_fail_every,
            acknowledge_fail_every = config.acknowledge_fail_every,
            "Registries wired"
        );
        Ok(wiring)
    }

    /// Wire registries built by the caller. `annotations` must already
    /// publish into `fields`.
    pub fn connect(
        fields: Arc<FieldRegistry>,
        annotations: Arc<AnnotationRegistry>,
        field_republish_interval: Duration,
    ) -> DomainResult<Self> {
        fields.start_publications(
            annotations.clone(),
            annotations.clone(),
            field_republish_interval,
        )?;
        Ok(Self {
            fields,
            annotations,
        })
    }

    pub fn fields(&self) -> &Arc<FieldRegistry> {
        &self.fields
    }

    pub fn annotations(&self) -> &Arc<AnnotationRegistry> {
        &self.annotations
    }

    pub async fn snapshot(&self) -> ConvergenceSnapshot {
        let field_count = self.fields.field_count().await;
        let unannotated = self.fields.unannotated_fields().await.len();
        let acknowledged = self.annotations.acknowledged_annotations().await.len();
        let unacknowledged = self.annotations.unacknowledged_annotations().await.len();

        ConvergenceSnapshot {
            field_count,
            target: self.fields.target_count(),
            unannotated,
            annotations: acknowledged + unacknowledged,
            acknowledged,
            unacknowledged,
            taken_at: Utc::now(),
        }
    }

    pub async fn is_converged(&self) -> bool {
        self.snapshot().await.is_converged()
    }

    /// Fields holding the annotation their registry counterpart has
    /// acknowledged, ordered by id.
    pub async fn settled_fields(&self) -> Vec<FieldId> {
        let acknowledged: BTreeMap<FieldId, u64> = self
            .annotations
            .acknowledged_annotations()
            .await
            .into_iter()
            .map(|(field_id, annotation)| (field_id, annotation.id))
            .collect();

        self.fields
            .fields()
            .await
            .into_iter()
            .filter(|field| {
                field
                    .annotation
                    .as_ref()
                    .is_some_and(|a| acknowledged.get(&field.id) == Some(&a.id))
            })
            .map(|field| field.id)
            .collect()
    }

    /// Poll both registries every `poll_interval` until converged, giving up
    /// after `timeout`.
    pub async fn await_convergence(
        &self,
        poll_interval: Duration,
        timeout: Duration,
    ) -> DomainResult<ConvergenceSnapshot> {
        let poll_interval = require_interval("poll_interval", poll_interval)?;
        let started = Instant::now();
        let mut ticker = tokio::time::interval(poll_interval);
        let mut poll: u64 = 0;

        loop {
            ticker.tick().await;
            poll += 1;

            let snapshot = self.snapshot().await;
            info!(
                poll,
                field_count = snapshot.field_count,
                annotations = snapshot.annotations,
                unannotated = snapshot.unannotated,
                unacknowledged = snapshot.unacknowledged,
                "Convergence check"
            );

            if snapshot.is_converged() {
                info!(
                    poll,
                    elapsed_ms = started.elapsed().as_millis(),
                    "Convergence reached"
                );
                return Ok(snapshot);
            }

            let elapsed = started.elapsed();
            if elapsed >= timeout {
                return Err(DomainError::ConvergenceTimeout {
                    elapsed,
                    field_count: snapshot.field_count,
                    target: snapshot.target,
                    unannotated: snapshot.unannotated,
                    unacknowledged: snapshot.unacknowledged,
                });
            }
        }
    }

    /// Wait for in-flight annotation deliveries.
    pub async fn flush(&self) {
        self.annotations.flush().await;
    }

    /// Cancel every trigger and in-flight delivery. Idempotent.
    pub fn shutdown(&self) {
        self.fields.shutdown();
        self.annotations.shutdown();
    }
}

impl Drop for Reconciliation {
    fn drop(&mut self) {
        self.shutdown();
    }
}

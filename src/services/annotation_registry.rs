//! Annotation registry.
//!
//! Owns one annotation per field id and its acknowledgment flag. Annotations
//! are handed back to the field side fire-and-forget; anything that never
//! gets acknowledged is re-offered by the republish sweep until it does.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex as StdMutex, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::{debug, instrument};

use crate::domain::errors::{require_interval, DomainResult};
use crate::domain::models::{
    Annotation, AnnotationId, AnnotationStatus, Field, FieldId, ReconciliationConfig,
};
use crate::domain::ports::{
    Acknowledger, AnnotationPublisher, ChannelReliability, FieldPublisher, Operation,
    PeriodicTrigger, TickAction, TickOutcome, TriggerHandle,
};
use crate::services::dispatcher::Dispatcher;
use crate::services::unreliable_gate::UnreliableGate;

/// Trigger label of the unacknowledged-annotation sweep.
pub const ANNOTATION_REPUBLISH: &str = "annotation-republish";

#[derive(Debug)]
struct AnnotationRecord {
    annotation: Annotation,
    offers: u32,
}

impl AnnotationRecord {
    fn status(&self) -> AnnotationStatus {
        if self.annotation.acknowledged {
            AnnotationStatus::Acknowledged
        } else if self.offers > 0 {
            AnnotationStatus::OfferedForAck
        } else {
            AnnotationStatus::Created
        }
    }
}

#[derive(Debug, Default)]
struct AnnotationTable {
    records: BTreeMap<FieldId, AnnotationRecord>,
    last_id: AnnotationId,
}

/// Registry of annotations keyed by the field they were minted for.
pub struct AnnotationRegistry {
    table: Mutex<AnnotationTable>,
    annotate_gate: Arc<dyn ChannelReliability>,
    acknowledge_gate: Arc<dyn ChannelReliability>,
    publisher: Arc<dyn AnnotationPublisher>,
    dispatcher: Dispatcher,
    sweep: StdMutex<Option<TriggerHandle>>,
}

impl AnnotationRegistry {
    /// Build a registry with unreliable gates from `config` and start its
    /// republish sweep.
    pub fn new(
        publisher: Arc<dyn AnnotationPublisher>,
        config: &ReconciliationConfig,
        trigger: &dyn PeriodicTrigger,
    ) -> DomainResult<Arc<Self>> {
        let annotate_gate = Arc::new(UnreliableGate::new(config.annotate_fail_every)?);
        let acknowledge_gate = Arc::new(UnreliableGate::new(config.acknowledge_fail_every)?);
        Self::with_gates(
            publisher,
            annotate_gate,
            acknowledge_gate,
            config.annotation_republish_interval(),
            trigger,
        )
    }

    /// Build a registry with caller-supplied reliability strategies.
    pub fn with_gates(
        publisher: Arc<dyn AnnotationPublisher>,
        annotate_gate: Arc<dyn ChannelReliability>,
        acknowledge_gate: Arc<dyn ChannelReliability>,
        republish_interval: Duration,
        trigger: &dyn PeriodicTrigger,
    ) -> DomainResult<Arc<Self>> {
        let interval = require_interval("annotation_republish_interval", republish_interval)?;

        let registry = Arc::new(Self {
            table: Mutex::new(AnnotationTable::default()),
            annotate_gate,
            acknowledge_gate,
            publisher,
            dispatcher: Dispatcher::new(),
            sweep: StdMutex::new(None),
        });

        let weak = Arc::downgrade(&registry);
        let action: TickAction = Arc::new(move || {
            let weak = weak.clone();
            Box::pin(async move {
                match weak.upgrade() {
                    Some(registry) => {
                        registry.republish().await;
                        TickOutcome::Continue
                    }
                    None => TickOutcome::Stop,
                }
            })
        });
        let handle = trigger.schedule(ANNOTATION_REPUBLISH, interval, action)?;
        *registry.sweep.lock().unwrap_or_else(PoisonError::into_inner) = Some(handle);

        Ok(registry)
    }

    /// Mint or reuse the annotation for `field` and hand it back to the
    /// field side without waiting. A dropped attempt does nothing at all.
    #[instrument(skip(self, field), fields(field_id = field.id))]
    pub async fn annotate(&self, field: Field) {
        if !self.annotate_gate.attempt(Operation::Annotate) {
            return;
        }

        let field_id = field.id;
        let annotation = {
            let mut table = self.table.lock().await;
            let AnnotationTable { records, last_id } = &mut *table;
            let record = records.entry(field_id).or_insert_with(|| {
                *last_id += 1;
                debug!(annotation_id = *last_id, "Minted annotation");
                AnnotationRecord {
                    annotation: Annotation::new(*last_id, field_id),
                    offers: 0,
                }
            });
            record.offers += 1;
            record.annotation.clone()
        };

        let publisher = self.publisher.clone();
        self.dispatcher.spawn(async move {
            publisher.publish_annotation(field_id, annotation).await;
        });
    }

    /// Mark the stored annotation for `field_id` acknowledged if its id
    /// matches. Stale ids, unknown fields, and dropped attempts are ignored.
    #[instrument(skip(self, annotation), fields(annotation_id = annotation.id))]
    pub async fn acknowledge(&self, field_id: FieldId, annotation: Annotation) {
        if !self.acknowledge_gate.attempt(Operation::Acknowledge) {
            return;
        }

        let mut table = self.table.lock().await;
        match table.records.get_mut(&field_id) {
            Some(record) if record.annotation.id == annotation.id => {
                if !record.annotation.acknowledged {
                    record.annotation.acknowledged = true;
                    debug!("Annotation acknowledged");
                }
            }
            Some(record) => {
                debug!(
                    stored_id = record.annotation.id,
                    "Ignoring acknowledgment for superseded annotation"
                );
            }
            None => debug!("Ignoring acknowledgment for unknown field"),
        }
    }

    /// Re-offer every unacknowledged annotation. Returns how many were
    /// re-offered.
    pub async fn republish(&self) -> usize {
        let pending: Vec<(FieldId, Annotation)> = {
            let mut table = self.table.lock().await;
            table
                .records
                .iter_mut()
                .filter(|(_, record)| !record.annotation.acknowledged)
                .map(|(field_id, record)| {
                    record.offers += 1;
                    (*field_id, record.annotation.clone())
                })
                .collect()
        };

        let count = pending.len();
        if count > 0 {
            debug!(count, "Republishing unacknowledged annotations");
        }
        for (field_id, annotation) in pending {
            self.publisher.publish_annotation(field_id, annotation).await;
        }
        count
    }

    pub async fn acknowledged_annotations(&self) -> BTreeMap<FieldId, Annotation> {
        self.partition(true).await
    }

    pub async fn unacknowledged_annotations(&self) -> BTreeMap<FieldId, Annotation> {
        self.partition(false).await
    }

    async fn partition(&self, acknowledged: bool) -> BTreeMap<FieldId, Annotation> {
        let table = self.table.lock().await;
        table
            .records
            .iter()
            .filter(|(_, record)| record.annotation.acknowledged == acknowledged)
            .map(|(field_id, record)| (*field_id, record.annotation.clone()))
            .collect()
    }

    pub async fn annotation_count(&self) -> usize {
        self.table.lock().await.records.len()
    }

    pub async fn annotation_for(&self, field_id: FieldId) -> Option<Annotation> {
        let table = self.table.lock().await;
        table.records.get(&field_id).map(|r| r.annotation.clone())
    }

    pub async fn annotation_status(&self, field_id: FieldId) -> Option<AnnotationStatus> {
        let table = self.table.lock().await;
        table.records.get(&field_id).map(AnnotationRecord::status)
    }

    /// Dispatched deliveries not yet finished.
    pub fn in_flight(&self) -> usize {
        self.dispatcher.in_flight()
    }

    /// Wait for every dispatched delivery to finish.
    pub async fn flush(&self) {
        self.dispatcher.flush().await;
    }

    /// Cancel the sweep and abort in-flight deliveries.
    pub fn shutdown(&self) {
        if let Some(sweep) = self.sweep.lock().unwrap_or_else(PoisonError::into_inner).take() {
            sweep.cancel();
        }
        self.dispatcher.abort_all();
    }
}

#[async_trait]
impl FieldPublisher for AnnotationRegistry {
    async fn publish(&self, field: Field) {
        self.annotate(field).await;
    }
}

#[async_trait]
impl Acknowledger for AnnotationRegistry {
    async fn acknowledge(&self, field_id: FieldId, annotation: Annotation) {
        Self::acknowledge(self, field_id, annotation).await;
    }
}

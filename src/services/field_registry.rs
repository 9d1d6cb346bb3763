//! Field registry.
//!
//! Mints fields on a timer up to a target count, stores whichever annotation
//! the annotation side hands back, and re-publishes every field that still
//! lacks one.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex as StdMutex, PoisonError, RwLock};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::{debug, info, instrument};

use crate::domain::errors::{require_interval, DomainError, DomainResult};
use crate::domain::models::{Annotation, Field, FieldId, FieldStatus, ReconciliationConfig};
use crate::domain::ports::{
    Acknowledger, AnnotationPublisher, ChannelReliability, FieldPublisher, Operation,
    PeriodicTrigger, TickAction, TickOutcome, TriggerHandle,
};
use crate::services::unreliable_gate::gate_for;

/// Trigger label of the creation timer.
pub const FIELD_CREATION: &str = "field-creation";

/// Trigger label of the unannotated-field sweep.
pub const FIELD_REPUBLISH: &str = "field-republish";

#[derive(Debug)]
struct FieldRecord {
    field: Field,
    published: bool,
}

impl FieldRecord {
    fn status(&self) -> FieldStatus {
        if self.field.is_annotated() {
            FieldStatus::Annotated
        } else if self.published {
            FieldStatus::Published
        } else {
            FieldStatus::Unpublished
        }
    }
}

#[derive(Debug, Default)]
struct FieldTable {
    records: BTreeMap<FieldId, FieldRecord>,
    last_id: FieldId,
}

/// Outbound callbacks, bound late by `start_publications`.
#[derive(Clone)]
struct Publications {
    publisher: Arc<dyn FieldPublisher>,
    acknowledger: Arc<dyn Acknowledger>,
}

/// Registry of fields and their current annotation.
pub struct FieldRegistry {
    target_count: u64,
    table: Mutex<FieldTable>,
    gate: Arc<dyn ChannelReliability>,
    publications: RwLock<Option<Publications>>,
    trigger: Arc<dyn PeriodicTrigger>,
    creation: StdMutex<Option<TriggerHandle>>,
    sweep: StdMutex<Option<TriggerHandle>>,
}

impl FieldRegistry {
    /// Build a registry from `config` and start the creation timer.
    pub fn new(
        config: &ReconciliationConfig,
        trigger: Arc<dyn PeriodicTrigger>,
    ) -> DomainResult<Arc<Self>> {
        let gate = gate_for(config.annotate_field_fail_every)?;
        Self::with_gate(
            config.target_field_count,
            config.create_interval(),
            gate,
            trigger,
        )
    }

    /// Build a registry with a caller-supplied `annotate_field` gate.
    pub fn with_gate(
        target_count: u64,
        create_interval: Duration,
        gate: Arc<dyn ChannelReliability>,
        trigger: Arc<dyn PeriodicTrigger>,
    ) -> DomainResult<Arc<Self>> {
        if target_count == 0 {
            return Err(DomainError::InvalidTargetCount(target_count));
        }
        let interval = require_interval("create_interval", create_interval)?;

        let registry = Arc::new(Self {
            target_count,
            table: Mutex::new(FieldTable::default()),
            gate,
            publications: RwLock::new(None),
            trigger,
            creation: StdMutex::new(None),
            sweep: StdMutex::new(None),
        });

        let weak = Arc::downgrade(&registry);
        let action: TickAction = Arc::new(move || {
            let weak = weak.clone();
            Box::pin(async move {
                match weak.upgrade() {
                    Some(registry) => registry.create_field().await,
                    None => TickOutcome::Stop,
                }
            })
        });
        let handle = registry.trigger.schedule(FIELD_CREATION, interval, action)?;
        *registry.creation.lock().unwrap_or_else(PoisonError::into_inner) = Some(handle);

        Ok(registry)
    }

    /// Bind the outbound callbacks and start the unannotated sweep.
    ///
    /// Fields minted before this call are not published by the creation
    /// timer; the sweep picks them up. Calling again replaces the callbacks
    /// and restarts the sweep.
    pub fn start_publications(
        self: &Arc<Self>,
        publisher: Arc<dyn FieldPublisher>,
        acknowledger: Arc<dyn Acknowledger>,
        interval: Duration,
    ) -> DomainResult<()> {
        let interval = require_interval("field_republish_interval", interval)?;

        *self.publications.write().unwrap_or_else(PoisonError::into_inner) = Some(Publications {
            publisher,
            acknowledger,
        });

        let weak = Arc::downgrade(self);
        let action: TickAction = Arc::new(move || {
            let weak = weak.clone();
            Box::pin(async move {
                match weak.upgrade() {
                    Some(registry) => {
                        registry.republish_unannotated().await;
                        TickOutcome::Continue
                    }
                    None => TickOutcome::Stop,
                }
            })
        });
        let handle = self.trigger.schedule(FIELD_REPUBLISH, interval, action)?;
        let previous = self
            .sweep
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .replace(handle);
        if let Some(previous) = previous {
            previous.cancel();
        }

        info!(interval_ms = interval.as_millis(), "Field publications started");
        Ok(())
    }

    /// Cancel the sweep and unbind the callbacks.
    pub fn stop_publications(&self) {
        if let Some(sweep) = self.sweep.lock().unwrap_or_else(PoisonError::into_inner).take() {
            sweep.cancel();
        }
        self.publications
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
    }

    /// Stop publications and the creation timer.
    pub fn shutdown(&self) {
        self.stop_publications();
        if let Some(creation) = self
            .creation
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
        {
            creation.cancel();
        }
    }

    fn publications(&self) -> Option<Publications> {
        self.publications
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// One creation tick: mint the next field if below target and publish it
    /// before returning.
    async fn create_field(&self) -> TickOutcome {
        let publications = self.publications();

        let (field, reached) = {
            let mut table = self.table.lock().await;
            if table.records.len() as u64 >= self.target_count {
                return TickOutcome::Stop;
            }
            table.last_id += 1;
            let field = Field::new(table.last_id);
            table.records.insert(
                field.id,
                FieldRecord {
                    field: field.clone(),
                    published: publications.is_some(),
                },
            );
            (field, table.records.len() as u64 >= self.target_count)
        };

        debug!(field_id = field.id, "Created field");
        if let Some(publications) = publications {
            publications.publisher.publish(field).await;
        }

        if reached {
            info!(target = self.target_count, "Field target reached, creation stopped");
            TickOutcome::Stop
        } else {
            TickOutcome::Continue
        }
    }

    /// Store `annotation` on its field and acknowledge it back. A dropped
    /// attempt does nothing; an unknown field id is ignored.
    #[instrument(skip(self, annotation), fields(annotation_id = annotation.id))]
    pub async fn annotate_field(&self, field_id: FieldId, annotation: Annotation) {
        if !self.gate.attempt(Operation::AnnotateField) {
            return;
        }

        let stored = {
            let mut table = self.table.lock().await;
            match table.records.get_mut(&field_id) {
                Some(record) => {
                    record.field.annotation = Some(annotation.clone());
                    true
                }
                None => false,
            }
        };
        if !stored {
            debug!("Ignoring annotation for unknown field");
            return;
        }

        if let Some(publications) = self.publications() {
            publications.acknowledger.acknowledge(field_id, annotation).await;
        }
    }

    /// Re-publish every field still lacking an annotation. Returns how many
    /// were re-published.
    pub async fn republish_unannotated(&self) -> usize {
        let Some(publications) = self.publications() else {
            return 0;
        };

        let pending: Vec<Field> = {
            let mut table = self.table.lock().await;
            table
                .records
                .values_mut()
                .filter(|record| !record.field.is_annotated())
                .map(|record| {
                    record.published = true;
                    record.field.clone()
                })
                .collect()
        };

        let count = pending.len();
        if count > 0 {
            debug!(count, "Republishing unannotated fields");
        }
        for field in pending {
            publications.publisher.publish(field).await;
        }
        count
    }

    /// Fields without an annotation, ordered by id.
    pub async fn unannotated_fields(&self) -> Vec<Field> {
        let table = self.table.lock().await;
        table
            .records
            .values()
            .filter(|record| !record.field.is_annotated())
            .map(|record| record.field.clone())
            .collect()
    }

    pub async fn field_count(&self) -> u64 {
        self.table.lock().await.records.len() as u64
    }

    pub fn target_count(&self) -> u64 {
        self.target_count
    }

    pub async fn field(&self, field_id: FieldId) -> Option<Field> {
        let table = self.table.lock().await;
        table.records.get(&field_id).map(|r| r.field.clone())
    }

    pub async fn field_status(&self, field_id: FieldId) -> Option<FieldStatus> {
        let table = self.table.lock().await;
        table.records.get(&field_id).map(FieldRecord::status)
    }

    /// Snapshot of every field, ordered by id.
    pub async fn fields(&self) -> Vec<Field> {
        let table = self.table.lock().await;
        table.records.values().map(|r| r.field.clone()).collect()
    }
}

#[async_trait]
impl AnnotationPublisher for FieldRegistry {
    async fn publish_annotation(&self, field_id: FieldId, annotation: Annotation) {
        self.annotate_field(field_id, annotation).await;
    }
}

//! Eventual - eventual consistency through periodic republish
//!
//! Two in-memory registries hand work back and forth through callbacks that
//! may silently drop any attempt. Nothing is retried by the caller; instead
//! each registry periodically re-offers whatever it still considers
//! unsettled, and the pair converges:
//!
//! 1. The field registry mints fields on a timer and publishes each one.
//! 2. The annotation registry mints (or reuses) an annotation for the field
//!    and hands it back fire-and-forget.
//! 3. The field registry stores the annotation and acknowledges it.
//! 4. Sweeps on both sides re-publish unannotated fields and
//!    unacknowledged annotations until none remain.
//!
//! # Architecture
//!
//! - **Domain Layer** (`domain`): models, errors, and port traits
//! - **Service Layer** (`services`): the registries, failure gates, dispatch, and wiring
//! - **Infrastructure Layer** (`infrastructure`): configuration, logging, triggers
//! - **CLI Layer** (`cli`): the driver that runs to convergence
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use eventual::domain::models::ReconciliationConfig;
//! use eventual::infrastructure::scheduling::IntervalTrigger;
//! use eventual::services::Reconciliation;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = ReconciliationConfig::default();
//!     let wiring = Reconciliation::wire(&config, Arc::new(IntervalTrigger::new()))?;
//!     let snapshot = wiring
//!         .await_convergence(std::time::Duration::from_secs(1), std::time::Duration::from_secs(60))
//!         .await?;
//!     println!("{} fields settled", snapshot.field_count);
//!     Ok(())
//! }
//! ```

pub mod cli;
pub mod domain;
pub mod infrastructure;
pub mod services;

// Re-export commonly used types for convenience
pub use domain::models::{
    Annotation, AnnotationId, AnnotationStatus, Config, Field, FieldId, FieldStatus,
    ReconciliationConfig,
};
pub use domain::ports::{
    Acknowledger, AnnotationPublisher, ChannelReliability, FieldPublisher, Operation,
    PeriodicTrigger,
};
pub use domain::{DomainError, DomainResult};
pub use infrastructure::config::{ConfigError, ConfigLoader};
pub use services::{
    AnnotationRegistry, ConvergenceSnapshot, FieldRegistry, Reconciliation, UnreliableGate,
};

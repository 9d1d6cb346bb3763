pub mod annotation;
pub mod config;
pub mod field;

pub use annotation::{Annotation, AnnotationId, AnnotationStatus};
pub use config::{Config, DriverConfig, LoggingConfig, ReconciliationConfig, RotationPolicy};
pub use field::{Field, FieldId, FieldStatus};

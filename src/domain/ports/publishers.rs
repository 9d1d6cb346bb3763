use async_trait::async_trait;

use crate::domain::models::{Annotation, Field, FieldId};

/// Receives fields that still need an annotation.
///
/// Bound to the annotation registry's `annotate`.
#[async_trait]
pub trait FieldPublisher: Send + Sync {
    /// Deliver a field for annotation. Completes when the attempt is over,
    /// whether or not it got through.
    async fn publish(&self, field: Field);
}

/// Receives annotations to be stored on their field.
///
/// Bound to the field registry's `annotate_field`.
#[async_trait]
pub trait AnnotationPublisher: Send + Sync {
    async fn publish_annotation(&self, field_id: FieldId, annotation: Annotation);
}

/// Receives acknowledgments for annotations that reached their field.
///
/// Bound to the annotation registry's `acknowledge`.
#[async_trait]
pub trait Acknowledger: Send + Sync {
    async fn acknowledge(&self, field_id: FieldId, annotation: Annotation);
}

//! Annotation domain model.
//!
//! An annotation is the result artifact minted for a field. Only the
//! annotation registry mints them; every other holder has a copy.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::field::FieldId;

/// Identifier minted by the annotation registry, unique across the system.
pub type AnnotationId = u64;

/// Result artifact for a field, carrying its acknowledgment flag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Annotation {
    /// Monotonic identifier, starts at 1
    pub id: AnnotationId,
    /// Opaque payload
    pub data: serde_json::Value,
    /// Set once a matching acknowledgment arrives; never reverts
    pub acknowledged: bool,
    /// When the registry minted it
    pub created_at: DateTime<Utc>,
}

impl Annotation {
    /// Mint a fresh, unacknowledged annotation for a field.
    pub fn new(id: AnnotationId, field_id: FieldId) -> Self {
        Self {
            id,
            data: serde_json::json!({ "field_id": field_id }),
            acknowledged: false,
            created_at: Utc::now(),
        }
    }

    pub fn is_settled(&self) -> bool {
        self.acknowledged
    }
}

/// Lifecycle of an annotation as seen by its owning registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnnotationStatus {
    /// Minted but never handed to the publisher
    Created,
    /// Handed to the publisher at least once, still unacknowledged
    OfferedForAck,
    /// Terminal
    Acknowledged,
}

impl AnnotationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::OfferedForAck => "offered_for_ack",
            Self::Acknowledged => "acknowledged",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Acknowledged)
    }
}

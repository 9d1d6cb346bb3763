//! Field domain model.
//!
//! Fields are the units of work that need an annotation. The field registry
//! mints them on a timer and they live for the whole process.

use serde::{Deserialize, Serialize};

use super::annotation::Annotation;

/// Identifier minted by the field registry.
pub type FieldId = u64;

/// A unit of work that holds at most one current annotation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Field {
    /// Monotonic identifier, starts at 1
    pub id: FieldId,
    /// Current annotation; a later assignment replaces it
    ///
    /// This is the copy delivered to the field, so its `acknowledged` flag is
    /// never updated. `Reconciliation::settled_fields` reports settlement.
    pub annotation: Option<Annotation>,
}

impl Field {
    pub fn new(id: FieldId) -> Self {
        Self {
            id,
            annotation: None,
        }
    }

    pub fn is_annotated(&self) -> bool {
        self.annotation.is_some()
    }
}

/// Lifecycle of a field as seen by its owning registry.
///
/// Acknowledgment lives in the annotation registry, so the terminal
/// settled state is derived by joining both sides.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldStatus {
    /// Minted, never handed to a publisher
    Unpublished,
    /// Handed to the publisher, no annotation yet
    Published,
    /// Holds an annotation
    Annotated,
}

impl FieldStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unpublished => "unpublished",
            Self::Published => "published",
            Self::Annotated => "annotated",
        }
    }
}

use std::fmt;

use serde::{Deserialize, Serialize};

/// Operation classes that pass through a reliability gate.
///
/// Each class keeps its own attempt counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    /// Annotation registry minting or reusing an annotation
    Annotate,
    /// Annotation registry flipping the acknowledged flag
    Acknowledge,
    /// Field registry storing an annotation on a field
    AnnotateField,
}

impl Operation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Annotate => "annotate",
            Self::Acknowledge => "acknowledge",
            Self::AnnotateField => "annotate_field",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Decides whether a single attempt of an operation gets through.
///
/// A `false` outcome means the attempt is silently dropped: the caller must
/// not change state, must not invoke any downstream callback, and must not
/// report an error. Recovery is left to the periodic sweeps.
pub trait ChannelReliability: Send + Sync {
    fn attempt(&self, operation: Operation) -> bool;
}

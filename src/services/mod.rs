pub mod annotation_registry;
pub mod dispatcher;
pub mod field_registry;
pub mod reconciliation;
pub mod unreliable_gate;

pub use annotation_registry::{AnnotationRegistry, ANNOTATION_REPUBLISH};
pub use dispatcher::Dispatcher;
pub use field_registry::{FieldRegistry, FIELD_CREATION, FIELD_REPUBLISH};
pub use reconciliation::{ConvergenceSnapshot, Reconciliation};
pub use unreliable_gate::{gate_for, ScriptedReliability, UnreliableGate};

//! Port trait definitions (Hexagonal Architecture)
//!
//! This module defines the seams between the registries and everything they
//! talk to:
//! - FieldPublisher / AnnotationPublisher / Acknowledger: the callbacks the
//!   two registries exchange
//! - ChannelReliability: the failure-injection strategy guarding an operation
//! - PeriodicTrigger: the repeating timer driving creation and sweeps
//!
//! Registries depend only on these traits, never on each other's types.

pub mod null_reliability;
pub mod publishers;
pub mod reliability;
pub mod trigger;

pub use null_reliability::AlwaysDeliver;
pub use publishers::{Acknowledger, AnnotationPublisher, FieldPublisher};
pub use reliability::{ChannelReliability, Operation};
pub use trigger::{PeriodicTrigger, TickAction, TickFuture, TickOutcome, TriggerHandle};

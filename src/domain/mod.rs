//! Domain layer for the eventual reconciliation system
//!
//! This module contains the field and annotation models, configuration
//! models, errors, and the port traits the services are written against.

pub mod errors;
pub mod models;
pub mod ports;

pub use errors::{DomainError, DomainResult};

//! Infrastructure layer module
//!
//! This module contains the adapters around the core registries:
//! - Configuration management
//! - Logging infrastructure
//! - Periodic trigger implementations
//!
//! Infrastructure implementations satisfy the port traits defined in the domain layer.

pub mod config;
pub mod logging;
pub mod scheduling;

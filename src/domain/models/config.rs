use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Main configuration structure for eventual
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Config {
    /// Registry sizing, timing, and failure injection
    #[serde(default)]
    pub reconciliation: ReconciliationConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Convergence polling performed by the CLI driver
    #[serde(default)]
    pub driver: DriverConfig,
}

/// Registry configuration, immutable once the registries are built
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ReconciliationConfig {
    /// Number of fields the creation timer mints before stopping
    #[serde(default = "default_target_field_count")]
    pub target_field_count: u64,

    /// Interval between field creation ticks in milliseconds
    #[serde(default = "default_create_interval_ms")]
    pub create_interval_ms: u64,

    /// Interval between unannotated-field sweeps in milliseconds
    #[serde(default = "default_republish_interval_ms")]
    pub field_republish_interval_ms: u64,

    /// Interval between unacknowledged-annotation sweeps in milliseconds
    #[serde(default = "default_republish_interval_ms")]
    pub annotation_republish_interval_ms: u64,

    /// Every Nth annotate attempt is dropped
    #[serde(default = "default_fail_every")]
    pub annotate_fail_every: u64,

    /// Every Nth acknowledge attempt is dropped
    #[serde(default = "default_fail_every")]
    pub acknowledge_fail_every: u64,

    /// Every Nth annotate_field attempt is dropped; unset means never
    #[serde(default)]
    pub annotate_field_fail_every: Option<u64>,
}

const fn default_target_field_count() -> u64 {
    1000
}

const fn default_create_interval_ms() -> u64 {
    1
}

const fn default_republish_interval_ms() -> u64 {
    1000
}

const fn default_fail_every() -> u64 {
    100
}

impl Default for ReconciliationConfig {
    fn default() -> Self {
        Self {
            target_field_count: default_target_field_count(),
            create_interval_ms: default_create_interval_ms(),
            field_republish_interval_ms: default_republish_interval_ms(),
            annotation_republish_interval_ms: default_republish_interval_ms(),
            annotate_fail_every: default_fail_every(),
            acknowledge_fail_every: default_fail_every(),
            annotate_field_fail_every: None,
        }
    }
}

impl ReconciliationConfig {
    pub fn create_interval(&self) -> Duration {
        Duration::from_millis(self.create_interval_ms)
    }

    pub fn field_republish_interval(&self) -> Duration {
        Duration::from_millis(self.field_republish_interval_ms)
    }

    pub fn annotation_republish_interval(&self) -> Duration {
        Duration::from_millis(self.annotation_republish_interval_ms)
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct LoggingConfig {
    /// Log level: trace, debug, info, warn, error
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log format: json or pretty
    #[serde(default = "default_log_format")]
    pub format: String,

    /// Directory for rolling log files; stderr only when unset
    #[serde(default)]
    pub log_dir: Option<String>,

    /// How often the log file in `log_dir` rolls over
    #[serde(default)]
    pub rotation: RotationPolicy,
}

/// Rolling policy for the log file
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RotationPolicy {
    #[default]
    Daily,
    Hourly,
    Never,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
            log_dir: None,
            rotation: RotationPolicy::default(),
        }
    }
}

/// Driver polling configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct DriverConfig {
    /// Interval between convergence checks in milliseconds
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// Give up after this many seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

const fn default_poll_interval_ms() -> u64 {
    1000
}

const fn default_timeout_secs() -> u64 {
    300
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: default_poll_interval_ms(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl DriverConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

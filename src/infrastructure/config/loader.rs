use std::path::Path;

use anyhow::{Context, Result};
use figment::providers::{Env, Format, Serialized, Yaml};
use figment::Figment;
use thiserror::Error;

use crate::domain::models::config::Config;

/// Configuration error types
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid target_field_count: {0}. Must be at least 1")]
    InvalidTargetCount(u64),

    #[error("Invalid {name}: {value}. Must be at least 1")]
    InvalidFailEvery { name: &'static str, value: u64 },

    #[error("Invalid {name}: must be greater than zero")]
    ZeroInterval { name: &'static str },

    #[error("Invalid log level: {0}. Must be one of: trace, debug, info, warn, error")]
    InvalidLogLevel(String),

    #[error("Invalid log format: {0}. Must be one of: json, pretty")]
    InvalidLogFormat(String),
}

/// Configuration loader with hierarchical merging
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration with hierarchical merging
    ///
    /// Precedence (lowest to highest):
    /// 1. Programmatic defaults (Serialized)
    /// 2. .eventual/config.yaml (project config)
    /// 3. .eventual/local.yaml (local overrides, optional)
    /// 4. Environment variables (EVENTUAL_* prefix, highest priority)
    pub fn load() -> Result<Config> {
        let config: Config = Self::figment(&[
            Path::new(".eventual/config.yaml"),
            Path::new(".eventual/local.yaml"),
        ])
        .extract()
        .context("Failed to extract configuration from figment")?;

        Self::validate(&config)?;
        Ok(config)
    }

    /// Load configuration from a specific file, still honoring environment
    /// overrides
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Config> {
        let path = path.as_ref();
        let config: Config = Self::figment(&[path])
            .extract()
            .with_context(|| format!("Failed to load config from {}", path.display()))?;

        Self::validate(&config)?;
        Ok(config)
    }

    /// Defaults, then each YAML file in order, then `EVENTUAL_*` variables.
    /// Nested keys use `__`, e.g. `EVENTUAL_RECONCILIATION__TARGET_FIELD_COUNT`.
    pub fn figment(files: &[&Path]) -> Figment {
        let figment = files.iter().fold(
            Figment::new().merge(Serialized::defaults(Config::default())),
            |figment, file| figment.merge(Yaml::file(file)),
        );
        figment.merge(Env::prefixed("EVENTUAL_").split("__"))
    }

    /// Validate configuration after loading
    pub fn validate(config: &Config) -> Result<(), ConfigError> {
        let reconciliation = &config.reconciliation;

        if reconciliation.target_field_count == 0 {
            return Err(ConfigError::InvalidTargetCount(
                reconciliation.target_field_count,
            ));
        }

        let intervals = [
            ("create_interval_ms", reconciliation.create_interval_ms),
            (
                "field_republish_interval_ms",
                reconciliation.field_republish_interval_ms,
            ),
            (
                "annotation_republish_interval_ms",
                reconciliation.annotation_republish_interval_ms,
            ),
            ("poll_interval_ms", config.driver.poll_interval_ms),
            ("timeout_secs", config.driver.timeout_secs),
        ];
        if let Some((name, _)) = intervals.into_iter().find(|(_, value)| *value == 0) {
            return Err(ConfigError::ZeroInterval { name });
        }

        let fail_rates = [
            ("annotate_fail_every", Some(reconciliation.annotate_fail_every)),
            (
                "acknowledge_fail_every",
                Some(reconciliation.acknowledge_fail_every),
            ),
            (
                "annotate_field_fail_every",
                reconciliation.annotate_field_fail_every,
            ),
        ];
        for (name, value) in fail_rates {
            if value == Some(0) {
                return Err(ConfigError::InvalidFailEvery { name, value: 0 });
            }
        }

        let valid_log_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_log_levels.contains(&config.logging.level.to_lowercase().as_str()) {
            return Err(ConfigError::InvalidLogLevel(config.logging.level.clone()));
        }

        let valid_log_formats = ["json", "pretty"];
        if !valid_log_formats.contains(&config.logging.format.as_str()) {
            return Err(ConfigError::InvalidLogFormat(config.logging.format.clone()));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.reconciliation.target_field_count, 1000);
        assert_eq!(config.reconciliation.create_interval_ms, 1);
        assert_eq!(config.reconciliation.annotate_fail_every, 100);
        assert_eq!(config.reconciliation.acknowledge_fail_every, 100);
        assert_eq!(config.reconciliation.annotate_field_fail_every, None);
        assert_eq!(config.logging.level, "info");
        ConfigLoader::validate(&config).expect("Default config should be valid");
    }

    #[test]
    fn test_yaml_parsing() {
        let yaml = r"
reconciliation:
  target_field_count: 50
  annotate_fail_every: 2
  acknowledge_fail_every: 3
  annotate_field_fail_every: 7
  field_republish_interval_ms: 20
logging:
  level: debug
  format: json
driver:
  timeout_secs: 10
";

        let config: Config = serde_yaml::from_str(yaml).expect("YAML should parse");

        assert_eq!(config.reconciliation.target_field_count, 50);
        assert_eq!(config.reconciliation.annotate_fail_every, 2);
        assert_eq!(config.reconciliation.acknowledge_fail_every, 3);
        assert_eq!(config.reconciliation.annotate_field_fail_every, Some(7));
        assert_eq!(config.reconciliation.field_republish_interval_ms, 20);
        assert_eq!(config.reconciliation.annotation_republish_interval_ms, 1000);
        assert_eq!(config.logging.format, "json");
        assert_eq!(config.driver.timeout_secs, 10);
        assert_eq!(config.driver.poll_interval_ms, 1000);

        ConfigLoader::validate(&config).expect("Parsed config should be valid");
    }

    #[test]
    fn test_validate_zero_target() {
        let mut config = Config::default();
        config.reconciliation.target_field_count = 0;

        assert!(matches!(
            ConfigLoader::validate(&config),
            Err(ConfigError::InvalidTargetCount(0))
        ));
    }

    #[test]
    fn test_validate_zero_fail_every() {
        let mut config = Config::default();
        config.reconciliation.acknowledge_fail_every = 0;

        match ConfigLoader::validate(&config) {
            Err(ConfigError::InvalidFailEvery { name, value }) => {
                assert_eq!(name, "acknowledge_fail_every");
                assert_eq!(value, 0);
            }
            other => panic!("Expected InvalidFailEvery, got {other:?}"),
        }
    }

    #[test]
    fn test_validate_zero_annotate_field_fail_every() {
        let mut config = Config::default();
        config.reconciliation.annotate_field_fail_every = Some(0);

        assert!(matches!(
            ConfigLoader::validate(&config),
            Err(ConfigError::InvalidFailEvery {
                name: "annotate_field_fail_every",
                ..
            })
        ));
    }

    #[test]
    fn test_validate_zero_interval() {
        let mut config = Config::default();
        config.reconciliation.annotation_republish_interval_ms = 0;

        assert!(matches!(
            ConfigLoader::validate(&config),
            Err(ConfigError::ZeroInterval {
                name: "annotation_republish_interval_ms"
            })
        ));
    }

    #[test]
    fn test_validate_invalid_log_level() {
        let mut config = Config::default();
        config.logging.level = "verbose".to_string();

        match ConfigLoader::validate(&config) {
            Err(ConfigError::InvalidLogLevel(level)) => assert_eq!(level, "verbose"),
            other => panic!("Expected InvalidLogLevel error, got {other:?}"),
        }
    }

    #[test]
    fn test_validate_invalid_log_format() {
        let mut config = Config::default();
        config.logging.format = "xml".to_string();

        assert!(matches!(
            ConfigLoader::validate(&config),
            Err(ConfigError::InvalidLogFormat(_))
        ));
    }

    #[test]
    fn test_hierarchical_merging() {
        let mut base_file = NamedTempFile::new().unwrap();
        writeln!(
            base_file,
            "reconciliation:\n  target_field_count: 5\n  annotate_fail_every: 4\nlogging:\n  level: info\n  format: json"
        )
        .unwrap();
        base_file.flush().unwrap();

        let mut override_file = NamedTempFile::new().unwrap();
        writeln!(
            override_file,
            "reconciliation:\n  target_field_count: 15\nlogging:\n  level: debug"
        )
        .unwrap();
        override_file.flush().unwrap();

        let config: Config = ConfigLoader::figment(&[base_file.path(), override_file.path()])
            .extract()
            .unwrap();

        assert_eq!(config.reconciliation.target_field_count, 15, "Override should win");
        assert_eq!(
            config.reconciliation.annotate_fail_every, 4,
            "Base value should persist when not overridden"
        );
        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.logging.format, "json");
    }

    #[test]
    fn test_env_override() {
        temp_env::with_vars(
            [
                ("EVENTUAL_RECONCILIATION__TARGET_FIELD_COUNT", Some("25")),
                ("EVENTUAL_LOGGING__LEVEL", Some("warn")),
            ],
            || {
                let config: Config = ConfigLoader::figment(&[]).extract().unwrap();
                assert_eq!(config.reconciliation.target_field_count, 25);
                assert_eq!(config.logging.level, "warn");
            },
        );
    }

    #[test]
    fn test_rotation_reaches_log_config() {
        use crate::infrastructure::logging::{LogConfig, RotationPolicy};

        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            "logging:\n  log_dir: /tmp/eventual-logs\n  rotation: hourly"
        )
        .unwrap();
        file.flush().unwrap();

        let config = ConfigLoader::load_from_file(file.path()).unwrap();
        assert_eq!(config.logging.rotation, RotationPolicy::Hourly);

        let log = LogConfig::from(&config.logging);
        assert_eq!(log.rotation, RotationPolicy::Hourly);
        assert_eq!(log.log_dir, Some(std::path::PathBuf::from("/tmp/eventual-logs")));
    }

    #[test]
    fn test_rotation_defaults_to_daily() {
        let config: Config = ConfigLoader::figment(&[]).extract().unwrap();
        assert_eq!(
            config.logging.rotation,
            crate::domain::models::RotationPolicy::Daily
        );
    }

    #[test]
    fn test_load_from_file_rejects_invalid() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "reconciliation:\n  annotate_fail_every: 0").unwrap();
        file.flush().unwrap();

        let err = ConfigLoader::load_from_file(file.path()).unwrap_err();
        assert!(err.to_string().contains("annotate_fail_every"));
    }
}

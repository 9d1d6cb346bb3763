//! Effective configuration display.

use anyhow::{Context, Result};
use serde::Serialize;

use crate::cli::output::{output, CommandOutput};
use crate::domain::models::Config;

#[derive(Debug, Serialize)]
#[serde(transparent)]
pub struct ConfigOutput {
    pub config: Config,
}

impl CommandOutput for ConfigOutput {
    fn to_human(&self) -> String {
        serde_yaml::to_string(&self.config).unwrap_or_default()
    }

    fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(&self.config).unwrap_or_default()
    }
}

pub fn execute(config: Config, json_mode: bool) -> Result<()> {
    // Surface serialization problems instead of printing an empty document.
    serde_yaml::to_string(&config).context("Failed to serialize configuration")?;
    output(&ConfigOutput { config }, json_mode);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_human_output_is_yaml() {
        let rendered = ConfigOutput {
            config: Config::default(),
        }
        .to_human();
        assert!(rendered.contains("target_field_count: 1000"));
        assert!(rendered.contains("annotate_field_fail_every: null"));
    }

    #[test]
    fn test_json_output_nests_sections() {
        let json = ConfigOutput {
            config: Config::default(),
        }
        .to_json();
        assert_eq!(json["reconciliation"]["acknowledge_fail_every"], 100);
        assert_eq!(json["driver"]["poll_interval_ms"], 1000);
    }
}

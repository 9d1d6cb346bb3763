//! Reconciliation run command.
//!
//! Wires both registries on wall-clock triggers, polls the aggregate
//! counters until everything settles, and reports the final state.

use std::sync::Arc;
use std::time::Instant;

use anyhow::Result;
use clap::Args;
use serde::Serialize;
use tracing::Instrument;
use uuid::Uuid;

use crate::cli::output::{key_value_table, output, CommandOutput};
use crate::domain::errors::DomainError;
use crate::domain::models::{Config, ReconciliationConfig};
use crate::infrastructure::config::ConfigLoader;
use crate::infrastructure::scheduling::IntervalTrigger;
use crate::services::{ConvergenceSnapshot, Reconciliation};

#[derive(Args, Debug, Default)]
pub struct RunArgs {
    /// Number of fields to create
    #[arg(long)]
    pub target: Option<u64>,

    /// Drop every Nth annotate attempt
    #[arg(long)]
    pub annotate_fail_every: Option<u64>,

    /// Drop every Nth acknowledge attempt
    #[arg(long)]
    pub ack_fail_every: Option<u64>,

    /// Drop every Nth annotate_field attempt
    #[arg(long)]
    pub annotate_field_fail_every: Option<u64>,

    /// Interval between sweeps of both registries, in milliseconds
    #[arg(long)]
    pub republish_interval_ms: Option<u64>,

    /// Interval between convergence checks, in milliseconds
    #[arg(long)]
    pub poll_interval_ms: Option<u64>,

    /// Give up after this many seconds
    #[arg(long)]
    pub timeout_secs: Option<u64>,
}

impl RunArgs {
    /// Overlay command-line overrides onto loaded configuration.
    pub fn apply(&self, config: &mut Config) {
        let reconciliation = &mut config.reconciliation;
        if let Some(target) = self.target {
            reconciliation.target_field_count = target;
        }
        if let Some(n) = self.annotate_fail_every {
            reconciliation.annotate_fail_every = n;
        }
        if let Some(n) = self.ack_fail_every {
            reconciliation.acknowledge_fail_every = n;
        }
        if let Some(n) = self.annotate_field_fail_every {
            reconciliation.annotate_field_fail_every = Some(n);
        }
        if let Some(ms) = self.republish_interval_ms {
            reconciliation.field_republish_interval_ms = ms;
            reconciliation.annotation_republish_interval_ms = ms;
        }
        if let Some(ms) = self.poll_interval_ms {
            config.driver.poll_interval_ms = ms;
        }
        if let Some(secs) = self.timeout_secs {
            config.driver.timeout_secs = secs;
        }
    }
}

/// Final state of a run.
#[derive(Debug, Serialize)]
pub struct RunReport {
    pub run_id: Uuid,
    pub converged: bool,
    pub elapsed_ms: u128,
    pub snapshot: ConvergenceSnapshot,
    pub settings: ReconciliationConfig,
}

impl CommandOutput for RunReport {
    fn to_human(&self) -> String {
        let s = &self.snapshot;
        let table = key_value_table(&[
            ("Run", self.run_id.to_string()),
            ("Converged", if self.converged { "yes" } else { "no" }.to_string()),
            ("Fields", format!("{}/{}", s.field_count, s.target)),
            ("Unannotated fields", s.unannotated.to_string()),
            ("Annotations", s.annotations.to_string()),
            ("Acknowledged", s.acknowledged.to_string()),
            ("Unacknowledged", s.unacknowledged.to_string()),
            (
                "Fail every (annotate/ack)",
                format!(
                    "{}/{}",
                    self.settings.annotate_fail_every, self.settings.acknowledge_fail_every
                ),
            ),
            ("Elapsed", format!("{} ms", self.elapsed_ms)),
        ]);
        table.to_string()
    }

    fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_default()
    }
}

pub async fn execute(args: RunArgs, mut config: Config, json_mode: bool) -> Result<()> {
    args.apply(&mut config);
    ConfigLoader::validate(&config)?;

    let run_id = Uuid::new_v4();
    let span = tracing::info_span!("run", %run_id);
    run(run_id, config, json_mode).instrument(span).await
}

async fn run(run_id: Uuid, config: Config, json_mode: bool) -> Result<()> {
    let wiring = Reconciliation::wire(&config.reconciliation, Arc::new(IntervalTrigger::new()))?;
    let started = Instant::now();

    let outcome = wiring
        .await_convergence(config.driver.poll_interval(), config.driver.timeout())
        .await;
    wiring.shutdown();

    let (converged, snapshot, failure) = match outcome {
        Ok(snapshot) => (true, snapshot, None),
        Err(err @ DomainError::ConvergenceTimeout { .. }) => {
            (false, wiring.snapshot().await, Some(err))
        }
        Err(err) => return Err(err.into()),
    };

    let report = RunReport {
        run_id,
        converged,
        elapsed_ms: started.elapsed().as_millis(),
        snapshot,
        settings: config.reconciliation,
    };
    output(&report, json_mode);

    match failure {
        Some(err) => Err(err.into()),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_apply_overrides() {
        let args = RunArgs {
            target: Some(10),
            ack_fail_every: Some(3),
            republish_interval_ms: Some(25),
            timeout_secs: Some(5),
            ..Default::default()
        };
        let mut config = Config::default();
        args.apply(&mut config);

        assert_eq!(config.reconciliation.target_field_count, 10);
        assert_eq!(config.reconciliation.annotate_fail_every, 100);
        assert_eq!(config.reconciliation.acknowledge_fail_every, 3);
        assert_eq!(config.reconciliation.field_republish_interval_ms, 25);
        assert_eq!(config.reconciliation.annotation_republish_interval_ms, 25);
        assert_eq!(config.driver.timeout_secs, 5);
    }

    #[test]
    fn test_apply_without_overrides_keeps_config() {
        let mut config = Config::default();
        RunArgs::default().apply(&mut config);
        assert_eq!(config.reconciliation, ReconciliationConfig::default());
    }

    #[tokio::test]
    async fn test_execute_converges_small_run() {
        let args = RunArgs {
            target: Some(10),
            annotate_fail_every: Some(3),
            ack_fail_every: Some(3),
            republish_interval_ms: Some(5),
            poll_interval_ms: Some(10),
            timeout_secs: Some(10),
            ..Default::default()
        };

        execute(args, Config::default(), true).await.unwrap();
    }

    #[tokio::test]
    async fn test_execute_rejects_invalid_override() {
        let args = RunArgs {
            annotate_fail_every: Some(0),
            ..Default::default()
        };
        assert!(execute(args, Config::default(), true).await.is_err());
    }
}

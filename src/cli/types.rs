//! CLI type definitions
//!
//! This module contains clap command structures that define the CLI interface.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use super::commands::run::RunArgs;

#[derive(Parser, Debug)]
#[command(name = "eventual")]
#[command(about = "Eventual - two registries converging through periodic republish", long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Output in JSON format
    #[arg(short, long, global = true)]
    pub json: bool,

    /// Configuration file (defaults to .eventual/config.yaml + .eventual/local.yaml)
    #[arg(short, long, global = true, env = "EVENTUAL_CONFIG")]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Wire both registries and run until every field settles
    Run(RunArgs),

    /// Show the effective configuration
    Config,
}

//! Eventual CLI entry point.

use clap::Parser;

use eventual::cli::{handle_error, load_config, Cli, Commands};
use eventual::infrastructure::logging::{LogConfig, LoggerImpl};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match load_config(cli.config.as_deref()) {
        Ok(config) => config,
        Err(err) => handle_error(err, cli.json),
    };

    let _logger = match LoggerImpl::init(&LogConfig::from(&config.logging)) {
        Ok(logger) => logger,
        Err(err) => handle_error(err, cli.json),
    };

    let result = match cli.command {
        Commands::Run(args) => eventual::cli::commands::run::execute(args, config, cli.json).await,
        Commands::Config => eventual::cli::commands::config::execute(config, cli.json),
    };

    if let Err(err) = result {
        handle_error(err, cli.json);
    }
}

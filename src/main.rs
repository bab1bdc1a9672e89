//! Overlord CLI entry point.

use std::process::ExitCode;

use clap::Parser;

use overlord::cli::{Cli, Commands};
use overlord::domain::models::Config;
use overlord::infrastructure::config::ConfigLoader;
use overlord::infrastructure::logging::Logger;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let config: Config = match cli.config.as_deref() {
        Some(path) => ConfigLoader::load_from_file(path),
        None => ConfigLoader::load(),
    }
    .unwrap_or_else(|err| {
        eprintln!("configuration error: {err:#}");
        std::process::exit(1);
    });

    let _logger = match Logger::init(&config.logging) {
        Ok(logger) => logger,
        Err(err) => {
            eprintln!("failed to initialize logging: {err:#}");
            return ExitCode::FAILURE;
        }
    };

    let result = match cli.command {
        Commands::Run(args) => overlord::cli::commands::run::execute(args, config, cli.json).await,
        Commands::Govern(args) => {
            overlord::cli::commands::govern::execute(args, config, cli.json).await
        }
        Commands::Kpi(args) => overlord::cli::commands::kpi::execute(args, config, cli.json).await,
        Commands::Memory(args) => {
            overlord::cli::commands::memory::execute(args, config, cli.json).await
        }
    };

    match result {
        Ok(code) => ExitCode::from(code),
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

//! The entry point for the `printbatch` binary.

use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use printbatch_cli::{Cli, Commands};

fn main() -> Result<ExitCode> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_target(false).with_writer(std::io::stderr))
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    let cli = Cli::parse();

    match &cli.command {
        Commands::Run(args) => printbatch_cli::commands::run::execute(args, &cli),
        Commands::Printers(args) => printbatch_cli::commands::printers::execute(args, &cli),
        Commands::InitConfig(args) => printbatch_cli::commands::config::execute(args, &cli),
    }
}

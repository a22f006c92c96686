//! Init-config command - write a default settings file.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Args;

use printbatch::config::{save_config, BatchConfiguration};

use crate::Cli;

/// Arguments for the init-config command.
#[derive(Debug, Args)]
pub struct InitConfigArgs {
    /// Source directory to print from.
    #[arg(long)]
    pub source: PathBuf,

    /// Printer for priority documents.
    #[arg(long)]
    pub priority_printer: Option<String>,

    /// Overwrite an existing settings file.
    #[arg(long)]
    pub force: bool,
}

/// Execute the init-config command.
///
/// # Errors
///
/// Returns an error if the file exists (without `--force`) or cannot be written.
pub fn execute(args: &InitConfigArgs, cli: &Cli) -> Result<ExitCode> {
    let path = cli.config_path()?;
    if path.exists() && !args.force {
        anyhow::bail!("{} already exists. Use --force to overwrite", path.display());
    }

    let mut config = BatchConfiguration::new(&args.source);
    if let Some(printer) = &args.priority_printer {
        config.priority_printer_name.clone_from(printer);
    }
    config.validate()?;

    save_config(&path, &config).with_context(|| format!("Failed to write {}", path.display()))?;
    println!("Wrote {}", path.display());
    Ok(ExitCode::SUCCESS)
}

//! # printbatch-cli
//!
//! Command-line runner for the printbatch orchestrator.
//!
//! ## Commands
//!
//! - `printbatch run` - Print and archive everything under the source directory
//! - `printbatch printers` - List installed printers and their paper sizes
//! - `printbatch init-config` - Write a default settings file
//!
//! ## Configuration
//!
//! - `PRINTBATCH_CONFIG` - settings file (default: the platform config directory)

#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]

pub mod commands;
pub mod prompt;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Batch print-and-archive runner.
#[derive(Debug, Parser)]
#[command(name = "printbatch")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Settings file.
    #[arg(long, global = true, env = "PRINTBATCH_CONFIG")]
    pub config: Option<PathBuf>,

    /// Output format.
    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,

    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// The settings file to read or write.
    ///
    /// # Errors
    ///
    /// Returns an error if no path was given and the platform has no config directory.
    pub fn config_path(&self) -> anyhow::Result<PathBuf> {
        match &self.config {
            Some(path) => Ok(path.clone()),
            None => printbatch::config::default_config_path().ok_or_else(|| {
                anyhow::anyhow!(
                    "No config directory on this platform. Use --config or PRINTBATCH_CONFIG"
                )
            }),
        }
    }
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Run one print-and-archive pass.
    Run(commands::run::RunArgs),
    /// List printers and supported paper sizes.
    Printers(commands::printers::PrintersArgs),
    /// Write a default settings file.
    InitConfig(commands::config::InitConfigArgs),
}

/// Output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text output.
    #[default]
    Text,
    /// JSON lines.
    Json,
}

//! Printers command - list printers and paper sizes.

use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Args;

use printbatch::config::load_config;
use printbatch::{CupsPrinter, PrinterDirectory};

use crate::{Cli, OutputFormat};

/// Arguments for the printers command.
#[derive(Debug, Args)]
pub struct PrintersArgs {
    /// Also query each printer's supported paper sizes.
    #[arg(long, short = 'p')]
    pub paper: bool,
}

/// Execute the printers command.
///
/// # Errors
///
/// Returns an error if the printer list cannot be read.
pub fn execute(args: &PrintersArgs, cli: &Cli) -> Result<ExitCode> {
    // Custom paper names come from the settings file when there is one.
    let paper_names = cli
        .config_path()
        .ok()
        .and_then(|path| load_config(path).ok())
        .map(|config| config.paper_names)
        .unwrap_or_default();
    let host = CupsPrinter::new().with_paper_names(paper_names);
    let printers = host.list_printers().context("Failed to list printers")?;

    let mut rows = Vec::with_capacity(printers.len());
    for printer in &printers {
        let sizes = if args.paper {
            match host.supported_paper_sizes(&printer.name) {
                Ok(sizes) => sizes,
                Err(e) => {
                    log::warn!("Paper sizes for {} unavailable: {}", printer.name, e);
                    Vec::new()
                }
            }
        } else {
            Vec::new()
        };
        rows.push((printer, sizes));
    }

    match cli.format {
        OutputFormat::Json => {
            let value: Vec<serde_json::Value> = rows
                .iter()
                .map(|(printer, sizes)| {
                    serde_json::json!({
                        "name": printer.name,
                        "is_default": printer.is_default,
                        "paper_sizes": sizes.iter().map(|s| serde_json::json!({
                            "id": s.id,
                            "name": s.display_name,
                            "width": s.width,
                            "height": s.height,
                        })).collect::<Vec<_>>(),
                    })
                })
                .collect();
            println!("{}", serde_json::to_string_pretty(&value)?);
        }
        OutputFormat::Text => {
            if rows.is_empty() {
                println!("No printers installed");
            }
            for (printer, sizes) in &rows {
                let marker = if printer.is_default { " (default)" } else { "" };
                println!("{}{}", printer.name, marker);
                for size in sizes {
                    println!(
                        "    {:>3}  {} ({:.1} x {:.1} mm)",
                        size.id,
                        size.display_name,
                        f64::from(size.width) / 10.0,
                        f64::from(size.height) / 10.0
                    );
                }
            }
        }
    }

    Ok(ExitCode::SUCCESS)
}

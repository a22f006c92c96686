//! Run command - one print-and-archive pass.

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Args;
use crossbeam_channel::bounded;

use printbatch::config::{load_config, BatchConfiguration};
use printbatch::orchestrator::{Orchestrator, PassOutcome, PassServices, PassState, StopResult};
use printbatch::{CupsPrinter, LogLine};

use crate::prompt::ConsolePrompt;
use crate::{Cli, OutputFormat};

/// Arguments for the run command.
#[derive(Debug, Args)]
pub struct RunArgs {
    /// Source directory; overrides `source_dir` from the settings file.
    #[arg(long)]
    pub source: Option<PathBuf>,

    /// Never prompt at checkpoints.
    #[arg(long)]
    pub unattended: bool,

    /// Seconds to wait after Ctrl-C before forcing the pass to stop.
    #[arg(long, default_value = "2")]
    pub grace_secs: u64,
}

/// Execute the run command.
///
/// # Errors
///
/// Returns an error if the settings cannot be loaded or the pass cannot start.
pub fn execute(args: &RunArgs, cli: &Cli) -> Result<ExitCode> {
    let config = resolve_config(args, cli)?;
    let format = cli.format;

    let host = Arc::new(CupsPrinter::new().with_paper_names(config.paper_names.clone()));
    let mut services = PassServices::new(host.clone(), host);
    if !args.unattended {
        let prompt = ConsolePrompt::spawn().context("Failed to start the console prompt")?;
        services = services.with_prompt(Arc::new(prompt));
    }

    let orchestrator = Arc::new(Orchestrator::new(config, services)?);

    let (interrupt_tx, interrupt_rx) = bounded::<()>(1);
    let presses = AtomicUsize::new(0);
    let handler_target = Arc::clone(&orchestrator);
    ctrlc::set_handler(move || {
        if presses.fetch_add(1, Ordering::SeqCst) == 0 {
            let _ = interrupt_tx.try_send(());
        } else {
            handler_target.terminate();
        }
    })
    .context("Failed to install Ctrl-C handler")?;

    orchestrator.start(move |line: &LogLine| print_line(line, format), |_| {})?;

    let grace = Duration::from_secs(args.grace_secs);
    let outcome = loop {
        if let Some(outcome) = orchestrator.wait_timeout(Duration::from_millis(200)) {
            break Some(outcome);
        }
        if interrupt_rx.try_recv().is_ok() {
            eprintln!("Stopping after the current directory (Ctrl-C again to force)...");
            match orchestrator.stop_and_wait(grace) {
                StopResult::Finished(outcome) => break Some(outcome),
                StopResult::Terminated => {
                    eprintln!("Pass did not stop in time and was terminated");
                    // The worker still reports once its in-flight job returns.
                    break orchestrator.wait_timeout(grace);
                }
                StopResult::NotRunning => break None,
            }
        }
    };

    Ok(report(outcome.as_ref(), format))
}

fn resolve_config(args: &RunArgs, cli: &Cli) -> Result<BatchConfiguration> {
    let path = cli.config_path()?;

    let mut config = if path.exists() {
        load_config(&path).with_context(|| format!("Failed to load {}", path.display()))?
    } else if let Some(source) = &args.source {
        BatchConfiguration::new(source)
    } else {
        anyhow::bail!(
            "No settings file at {}. Run `printbatch init-config --source DIR` or pass --source",
            path.display()
        );
    };

    if let Some(source) = &args.source {
        config.source_dir.clone_from(source);
    }
    Ok(config)
}

fn print_line(line: &LogLine, format: OutputFormat) {
    match format {
        OutputFormat::Text => println!("{}", line.format_line()),
        OutputFormat::Json => match serde_json::to_string(line) {
            Ok(json) => println!("{json}"),
            Err(e) => log::warn!("Failed to encode log line: {}", e),
        },
    }
}

fn report(outcome: Option<&PassOutcome>, format: OutputFormat) -> ExitCode {
    let Some(outcome) = outcome else {
        eprintln!("Pass ended without reporting an outcome");
        return ExitCode::from(2);
    };

    let s = &outcome.summary;
    match format {
        OutputFormat::Json => {
            let value = serde_json::json!({
                "pass_id": outcome.pass_id,
                "state": outcome.state,
                "error": outcome.error.as_ref().map(ToString::to_string),
                "abnormal_termination": outcome.abnormal_termination,
                "summary": s,
            });
            println!("{value}");
        }
        OutputFormat::Text => {
            println!();
            println!("Pass {}: {}", outcome.pass_id, outcome.state);
            println!(
                "  {} directories, {} printed, {} archived, {} skipped, {} pruned, {} checkpoints",
                s.directories, s.printed, s.archived, s.skipped, s.pruned, s.checkpoints
            );
            for warning in &s.warnings {
                println!("  warning: {warning}");
            }
            if let Some(e) = &outcome.error {
                println!("  error: {e}");
            }
        }
    }

    match outcome.state {
        _ if outcome.abnormal_termination => ExitCode::from(2),
        PassState::Aborted => ExitCode::FAILURE,
        _ => ExitCode::SUCCESS,
    }
}

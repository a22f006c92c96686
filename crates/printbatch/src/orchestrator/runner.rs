use std::sync::{Arc, RwLock};

use chrono::Local;
use tracing::info_span;

use crate::config::BatchConfiguration;
use crate::error::PassError;
use crate::events::{PassLog, PassLogFile};
use crate::orchestrator::cancel::CancellationToken;
use crate::orchestrator::gate::{GateDecision, PromptResponse, WaitGate};
use crate::orchestrator::handle::PassServices;
use crate::orchestrator::state::{PassOutcome, PassState, PassStatus, PassSummary, PassWarning};
use crate::printer::profile::{select_default_printer, PrinterProfileResolver};
use crate::storage::archive::{ArchiveMapping, ArchiveMover};
use crate::worker::job::{DocumentKind, Job};
use crate::worker::scanner::{DirectoryBatch, DirectoryWalker};

/// Everything the worker thread owns for one pass.
pub(crate) struct PassRunner {
    pub pass_id: String,
    pub config: BatchConfiguration,
    pub mapping: ArchiveMapping,
    pub gate: WaitGate,
    pub services: PassServices,
    pub token: CancellationToken,
    pub status: Arc<RwLock<PassStatus>>,
    pub log: PassLog,
}

/// How the directory loop ended, before it becomes a `PassOutcome`.
enum Finish {
    Completed,
    Cancelled,
    Failed(PassError),
}

impl PassRunner {
    pub fn run(mut self) -> PassOutcome {
        let _span = info_span!("pass", pass_id = %self.pass_id).entered();
        let mut summary = PassSummary::default();

        self.update_status(|s| s.state = PassState::Running);
        self.open_log_file(&mut summary);
        self.log_configuration();

        let finish = self.run_directories(&mut summary);
        self.finish(finish, summary)
    }

    fn run_directories(&self, summary: &mut PassSummary) -> Finish {
        let source_root = self.mapping.source_root().to_path_buf();
        if !source_root.is_dir() {
            return Finish::Failed(PassError::SourceNotFound(source_root));
        }

        let setup = select_default_printer(
            &self.config.default_printer_name,
            self.services.printers.as_ref(),
        );
        for warning in setup.warnings {
            self.warn(summary, warning);
        }
        if setup.printer.is_empty() {
            self.log.info("Default printer: system default");
        } else {
            self.log.info(format!("Default printer: {}", setup.printer));
        }

        let mut resolver = PrinterProfileResolver::new(&self.config, setup.printer);
        let mover = ArchiveMover::new(self.mapping.clone());

        let mut walk = match DirectoryWalker::new(&source_root).walk() {
            Ok(walk) => walk,
            Err(e) => return Finish::Failed(e.into()),
        };

        loop {
            if self.token.is_cancelled() {
                return Finish::Cancelled;
            }

            let batch = match walk.next() {
                None => break,
                Some(Ok(batch)) => batch,
                Some(Err(e)) => return Finish::Failed(e.into()),
            };

            if let Err(e) = self.run_directory(&batch, &mut resolver, &mover, summary) {
                return Finish::Failed(e);
            }
        }

        if self.token.is_cancelled() {
            Finish::Cancelled
        } else {
            Finish::Completed
        }
    }

    fn run_directory(
        &self,
        batch: &DirectoryBatch,
        resolver: &mut PrinterProfileResolver,
        mover: &ArchiveMover,
        summary: &mut PassSummary,
    ) -> Result<(), PassError> {
        let name = batch.name();
        let _span = info_span!("directory", name = %name, files = batch.files.len()).entered();

        self.update_status(|s| s.current_directory = Some(batch.directory.clone()));
        summary.directories += 1;
        self.log.info(format!(
            "Entering directory {} ({} files)",
            batch.directory.display(),
            batch.files.len()
        ));

        let mut printed_here = 0usize;

        for path in &batch.files {
            if self.token.is_terminated() {
                return Err(PassError::Terminated);
            }

            let job = Job::new(path.clone(), &self.config.priority_marker);
            let file_name = job.file_name();
            let _job_span = info_span!("job", filename = %file_name, kind = %job.kind).entered();

            self.log.info(format!(
                "Classified {} as {}{}",
                file_name,
                job.kind,
                if job.is_priority { " (priority)" } else { "" }
            ));

            match job.kind {
                DocumentKind::PageDocument | DocumentKind::SpreadsheetDocument => {}
                DocumentKind::Unrecognized => {
                    self.log.info(format!("Skipping {}: unsupported file type", file_name));
                    summary.skipped += 1;
                    continue;
                }
            }

            let resolved = resolver.resolve(&job, self.services.printers.as_ref());
            if let Some(warning) = resolved.warning {
                self.warn(summary, warning);
            }
            let profile = resolved.profile;

            self.log.info(format!(
                "Printing {} on {}",
                file_name,
                if profile.printer.is_empty() {
                    "system default"
                } else {
                    profile.printer.as_str()
                }
            ));

            let result = self.services.renderer.print(&job, &profile);
            self.token.sleep(self.config.delay());

            if let Err(e) = result {
                self.log.error(format!("Printing {} failed: {}", file_name, e));
                return Err(PassError::RenderFailure {
                    path: job.source_path,
                    source: e,
                });
            }

            self.log.info(format!("Printed {}", file_name));
            summary.printed += 1;
            printed_here += 1;
            self.update_status(|s| s.printed += 1);

            let receipt = mover
                .archive(&job.source_path)
                .map_err(|e| PassError::ArchiveMoveFailure {
                    path: job.source_path.clone(),
                    source: e,
                })?;
            summary.archived += 1;
            self.log.info(format!("Archived to {}", receipt.destination.display()));

            for dir in &receipt.pruned {
                self.log.info(format!("Removed empty directory {}", dir.display()));
            }
            summary.pruned += receipt.pruned.len();

            for failure in receipt.prune_failures {
                self.warn(
                    summary,
                    PassWarning::PruneFailed {
                        directory: failure.directory,
                        error: failure.error,
                    },
                );
            }
        }

        self.checkpoint(batch, &name, printed_here > 0, summary);
        Ok(())
    }

    fn checkpoint(
        &self,
        batch: &DirectoryBatch,
        name: &str,
        printed_any: bool,
        summary: &mut PassSummary,
    ) {
        if !self.gate.is_checkpoint(name, printed_any) {
            return;
        }
        // A cancelled pass ends at this boundary.
        if self.token.is_cancelled() {
            self.log.info(format!(
                "Skipping checkpoint for {}: stop requested",
                batch.directory.display()
            ));
            return;
        }

        summary.checkpoints += 1;
        self.log.info(format!(
            "Directory {} finished, checkpoint reached",
            batch.directory.display()
        ));

        let decision = self.gate.evaluate(
            &batch.directory,
            name,
            printed_any,
            self.services.prompt.as_ref(),
            &self.token,
        );

        match decision {
            GateDecision::NotTriggered => {}
            GateDecision::Continued(PromptResponse::TimedOut) => {
                self.log.info("Checkpoint timed out, continuing");
            }
            GateDecision::Continued(_) => self.log.info("Checkpoint acknowledged, continuing"),
            GateDecision::Waited { interrupted: false } => {
                self.log.info("Checkpoint wait finished, continuing");
            }
            GateDecision::Waited { interrupted: true } => {
                self.log.info("Checkpoint wait interrupted by stop request");
            }
        }
    }

    fn finish(&self, finish: Finish, summary: PassSummary) -> PassOutcome {
        let abnormal = self.token.is_terminated();

        let (state, error) = match finish {
            Finish::Completed => (PassState::Completed, None),
            Finish::Cancelled if abnormal => (PassState::Cancelled, Some(PassError::Terminated)),
            Finish::Cancelled => (PassState::Cancelled, None),
            Finish::Failed(PassError::Terminated) => {
                (PassState::Cancelled, Some(PassError::Terminated))
            }
            Finish::Failed(e) => (PassState::Aborted, Some(e)),
        };

        match (&state, &error) {
            (PassState::Completed, _) => self.log.info(format!(
                "Pass completed: {} printed, {} archived, {} skipped",
                summary.printed, summary.archived, summary.skipped
            )),
            (PassState::Cancelled, Some(e)) => self.log.warn(format!("Pass stopped: {}", e)),
            (PassState::Cancelled, None) => self.log.info("Pass cancelled by user"),
            (_, Some(e)) => self.log.error(format!("Pass aborted: {}", e)),
            (_, None) => {}
        }

        let last_error = error.as_ref().map(ToString::to_string);
        self.update_status(|s| {
            s.state = state;
            s.current_directory = None;
            s.last_error = last_error;
            s.abnormal_termination = abnormal;
        });

        PassOutcome {
            pass_id: self.pass_id.clone(),
            state,
            error,
            summary,
            abnormal_termination: abnormal,
        }
    }

    fn open_log_file(&mut self, summary: &mut PassSummary) {
        if !self.config.persist_log {
            return;
        }
        let Some(directory) = self.config.resolved_log_directory() else {
            self.warn(
                summary,
                PassWarning::LogFileUnavailable {
                    error: "no log directory available".to_string(),
                },
            );
            return;
        };

        match PassLogFile::create(&directory, Local::now()) {
            Ok(file) => {
                let path = file.path().to_path_buf();
                self.log.attach(Arc::new(file));
                self.log.debug(format!("Writing pass log to {}", path.display()));
            }
            Err(e) => self.warn(
                summary,
                PassWarning::LogFileUnavailable {
                    error: e.to_string(),
                },
            ),
        }
    }

    fn log_configuration(&self) {
        let c = &self.config;
        self.log.info(format!("Pass {} starting", self.pass_id));
        self.log.info(format!("Source: {}", c.source_dir.display()));
        self.log.info(format!("Archive: {}", self.mapping.archive_root().display()));
        self.log.info(format!(
            "Paper size {}, zoom {}%, delay {}s, {}, {}",
            c.default_paper_size,
            c.default_paper_zoom,
            c.delay_seconds,
            if c.bw_print { "monochrome" } else { "color" },
            if c.duplex_print { "duplex" } else { "simplex" },
        ));
        if !c.priority_printer_name.is_empty() {
            self.log.info(format!(
                "Priority documents ('{}') print on {}",
                c.priority_marker, c.priority_printer_name
            ));
        }
        if c.enable_wait_prompt {
            self.log.info(format!(
                "Checkpoints on directories matching '{}', pause {}s ({:?})",
                c.checkpoint_pattern,
                c.wait_prompt_sleep,
                self.gate.mode()
            ));
        }
    }

    fn warn(&self, summary: &mut PassSummary, warning: PassWarning) {
        self.log.warn(warning.to_string());
        summary.warnings.push(warning);
    }

    fn update_status(&self, f: impl FnOnce(&mut PassStatus)) {
        if let Ok(mut status) = self.status.write() {
            f(&mut status);
        }
    }
}

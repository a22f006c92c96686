//! Test harness for isolated passes.
//!
//! The `TestHarness` struct owns a temporary directory holding:
//! - `outbox/`, the source tree files are created in
//! - `logs/`, where persisted pass logs go
//!
//! The dated archive tree is created next to `outbox/` by the pass itself.

#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use tempfile::TempDir;

use printbatch::events::{ChannelSink, LogLine};
use printbatch::orchestrator::{Orchestrator, PassOutcome, PassServices};
use printbatch::BatchConfiguration;

use super::fakes::{FakePrinterDirectory, FakeRenderer};

/// Result of running one pass through the harness.
pub struct RunResult {
    pub outcome: PassOutcome,
    pub lines: Vec<LogLine>,
    pub archive_root: PathBuf,
}

impl RunResult {
    pub fn messages(&self) -> Vec<String> {
        self.lines.iter().map(|l| l.message.clone()).collect()
    }

    pub fn position(&self, needle: &str) -> Option<usize> {
        self.lines.iter().position(|l| l.message.contains(needle))
    }
}

pub struct TestHarness {
    temp_dir: TempDir,
    pub source: PathBuf,
    pub log_dir: PathBuf,
}

impl TestHarness {
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let source = temp_dir.path().join("outbox");
        let log_dir = temp_dir.path().join("logs");
        std::fs::create_dir_all(&source).expect("Failed to create source directory");

        Self {
            temp_dir,
            source,
            log_dir,
        }
    }

    pub fn root(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Creates `relative` under the source tree with its name as content.
    pub fn file(&self, relative: &str) -> PathBuf {
        let path = self.source.join(relative);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, relative.as_bytes()).unwrap();
        path
    }

    pub fn dir(&self, relative: &str) -> PathBuf {
        let path = self.source.join(relative);
        std::fs::create_dir_all(&path).unwrap();
        path
    }

    /// Settings for fast, unattended passes.
    pub fn config(&self) -> BatchConfiguration {
        let mut config = BatchConfiguration::new(&self.source);
        config.delay_seconds = 0.0;
        config.enable_wait_prompt = false;
        config.wait_prompt_sleep = 0.05;
        config.priority_marker = "STATEMENT".to_string();
        config.priority_printer_name = "Statements".to_string();
        config.log_directory = Some(self.log_dir.clone());
        config
    }

    pub fn services(
        &self,
        renderer: &Arc<FakeRenderer>,
        printers: &Arc<FakePrinterDirectory>,
    ) -> PassServices {
        PassServices::new(renderer.clone(), printers.clone())
    }

    /// Starts a pass and returns the orchestrator plus its log receiver.
    pub fn start(
        &self,
        config: BatchConfiguration,
        services: PassServices,
    ) -> (Orchestrator, crossbeam_channel::Receiver<LogLine>) {
        let orchestrator = Orchestrator::new(config, services).expect("valid configuration");
        let (sink, lines) = ChannelSink::unbounded();
        assert!(orchestrator.start(sink, |_| {}).expect("worker spawned"));
        (orchestrator, lines)
    }

    /// Runs a pass to its terminal state.
    pub fn run(&self, config: BatchConfiguration, services: PassServices) -> RunResult {
        let (orchestrator, lines) = self.start(config, services);
        let outcome = orchestrator
            .wait_timeout(Duration::from_secs(30))
            .expect("pass finished");

        RunResult {
            outcome,
            lines: lines.try_iter().collect(),
            archive_root: orchestrator.archive_root().to_path_buf(),
        }
    }

    pub fn run_default(&self, renderer: &Arc<FakeRenderer>) -> RunResult {
        let printers = Arc::new(FakePrinterDirectory::new());
        self.run(self.config(), self.services(renderer, &printers))
    }
}

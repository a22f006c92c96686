//! Recording fakes for the collaborators a pass talks to.

#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::Mutex;
use std::time::Duration;

use crossbeam_channel::{unbounded, Receiver, Sender};

use printbatch::error::{PrinterError, RenderError};
use printbatch::orchestrator::{Checkpoint, CheckpointPrompt, PromptResponse};
use printbatch::printer::{PaperSize, PrinterInfo};
use printbatch::{DocumentRenderer, Job, PrinterDirectory, PrinterProfile};

/// Renderer that records every submission and fails on chosen file names.
#[derive(Default)]
pub struct FakeRenderer {
    calls: Mutex<Vec<(PathBuf, PrinterProfile)>>,
    fail_names: Vec<String>,
    gate: Option<(Sender<PathBuf>, Receiver<()>)>,
}

/// Test-side ends of a gated renderer.
pub struct RenderGate {
    /// Receives the path of every job as it is submitted.
    pub started: Receiver<PathBuf>,
    /// Each message lets one blocked submission return.
    pub resume: Sender<()>,
}

impl FakeRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_on(names: &[&str]) -> Self {
        Self {
            fail_names: names.iter().map(|n| n.to_string()).collect(),
            ..Self::default()
        }
    }

    /// A renderer whose submissions block until the test releases them.
    pub fn gated() -> (Self, RenderGate) {
        let (started_tx, started_rx) = unbounded();
        let (resume_tx, resume_rx) = unbounded();
        let renderer = Self {
            gate: Some((started_tx, resume_rx)),
            ..Self::default()
        };
        (
            renderer,
            RenderGate {
                started: started_rx,
                resume: resume_tx,
            },
        )
    }

    pub fn calls(&self) -> Vec<(PathBuf, PrinterProfile)> {
        self.calls.lock().unwrap().clone()
    }

    pub fn printed_names(&self) -> Vec<String> {
        self.calls()
            .iter()
            .map(|(p, _)| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect()
    }
}

impl DocumentRenderer for FakeRenderer {
    fn print(&self, job: &Job, profile: &PrinterProfile) -> Result<(), RenderError> {
        self.calls
            .lock()
            .unwrap()
            .push((job.source_path.clone(), profile.clone()));

        if let Some((started, resume)) = &self.gate {
            let _ = started.send(job.source_path.clone());
            let _ = resume.recv();
        }

        let name = job.file_name();
        if self.fail_names.iter().any(|n| *n == name) {
            return Err(RenderError::Failed(format!("printer rejected {}", name)));
        }
        Ok(())
    }
}

/// Printer directory that records default-printer changes.
pub struct FakePrinterDirectory {
    printers: Vec<PrinterInfo>,
    paper_sizes: Vec<u16>,
    fail_list: bool,
    fail_set: bool,
    set_calls: Mutex<Vec<String>>,
}

impl FakePrinterDirectory {
    /// `Office` (OS default) and `Statements`.
    pub fn new() -> Self {
        Self {
            printers: vec![
                PrinterInfo::new("Office", true),
                PrinterInfo::new("Statements", false),
            ],
            paper_sizes: Vec::new(),
            fail_list: false,
            fail_set: false,
            set_calls: Mutex::new(Vec::new()),
        }
    }

    pub fn failing_set_default(mut self) -> Self {
        self.fail_set = true;
        self
    }

    pub fn failing_list(mut self) -> Self {
        self.fail_list = true;
        self
    }

    pub fn with_paper_sizes(mut self, ids: &[u16]) -> Self {
        self.paper_sizes = ids.to_vec();
        self
    }

    pub fn set_calls(&self) -> Vec<String> {
        self.set_calls.lock().unwrap().clone()
    }
}

impl PrinterDirectory for FakePrinterDirectory {
    fn list_printers(&self) -> Result<Vec<PrinterInfo>, PrinterError> {
        if self.fail_list {
            return Err(PrinterError::Unavailable("spooler not running".into()));
        }
        Ok(self.printers.clone())
    }

    fn set_os_default(&self, name: &str) -> Result<(), PrinterError> {
        self.set_calls.lock().unwrap().push(name.to_string());
        if self.fail_set {
            return Err(PrinterError::Command {
                program: "lpoptions".into(),
                message: "Forbidden".into(),
            });
        }
        Ok(())
    }

    fn supported_paper_sizes(&self, _name: &str) -> Result<Vec<PaperSize>, PrinterError> {
        Ok(self
            .paper_sizes
            .iter()
            .map(|&id| PaperSize {
                id,
                display_name: format!("size {}", id),
                width: 2100,
                height: 2970,
            })
            .collect())
    }
}

/// Checkpoint prompt that records which directories it was shown for.
pub struct RecordingPrompt {
    response: PromptResponse,
    delay: Duration,
    seen: Mutex<Vec<String>>,
}

impl RecordingPrompt {
    pub fn answering(response: PromptResponse) -> Self {
        Self {
            response,
            delay: Duration::ZERO,
            seen: Mutex::new(Vec::new()),
        }
    }

    /// Keeps the prompt open for `delay` before answering, like an operator who never looks.
    pub fn slow(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn seen(&self) -> Vec<String> {
        self.seen.lock().unwrap().clone()
    }
}

impl CheckpointPrompt for RecordingPrompt {
    fn acknowledge(&self, checkpoint: &Checkpoint) -> PromptResponse {
        self.seen.lock().unwrap().push(checkpoint.name.clone());
        std::thread::sleep(self.delay);
        self.response
    }
}

use std::fmt;
use std::path::PathBuf;

use serde::Serialize;

use crate::error::PassError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PassState {
    Idle,
    Running,
    Completed,
    Aborted,
    Cancelled,
}

impl PassState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Aborted | Self::Cancelled)
    }
}

impl fmt::Display for PassState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Idle => "idle",
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Aborted => "aborted",
            Self::Cancelled => "cancelled",
        })
    }
}

/// A condition that was logged but did not end the pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PassWarning {
    PrinterSetupFailed { printer: String, error: String },
    PrinterListUnavailable { error: String },
    PaperSizeFallback { printer: String, requested: u16, used: u16 },
    PruneFailed { directory: PathBuf, error: String },
    LogFileUnavailable { error: String },
}

impl fmt::Display for PassWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PrinterSetupFailed { printer, error } => {
                write!(f, "could not set default printer '{}': {}", printer, error)
            }
            Self::PrinterListUnavailable { error } => {
                write!(f, "printer list unavailable: {}", error)
            }
            Self::PaperSizeFallback {
                printer,
                requested,
                used,
            } => write!(
                f,
                "paper size {} not supported by '{}', used {}",
                requested, printer, used
            ),
            Self::PruneFailed { directory, error } => {
                write!(f, "could not remove '{}': {}", directory.display(), error)
            }
            Self::LogFileUnavailable { error } => write!(f, "pass log not persisted: {}", error),
        }
    }
}

/// Counters for one pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PassSummary {
    pub directories: usize,
    pub printed: usize,
    pub skipped: usize,
    pub archived: usize,
    pub pruned: usize,
    pub checkpoints: usize,
    pub warnings: Vec<PassWarning>,
}

/// Read-only snapshot of a pass for status queries.
#[derive(Debug, Clone, Serialize)]
pub struct PassStatus {
    pub pass_id: String,
    pub state: PassState,
    pub current_directory: Option<PathBuf>,
    pub printed: usize,
    pub last_error: Option<String>,
    pub abnormal_termination: bool,
}

impl PassStatus {
    pub fn idle(pass_id: impl Into<String>) -> Self {
        Self {
            pass_id: pass_id.into(),
            state: PassState::Idle,
            current_directory: None,
            printed: 0,
            last_error: None,
            abnormal_termination: false,
        }
    }
}

/// Terminal result delivered to `on_done` and `wait`.
#[derive(Debug)]
pub struct PassOutcome {
    pub pass_id: String,
    pub state: PassState,
    pub error: Option<PassError>,
    pub summary: PassSummary,
    /// The pass was hard-stopped; the file in flight at that moment may be
    /// neither archived nor left untouched.
    pub abnormal_termination: bool,
}

impl PassOutcome {
    pub fn is_success(&self) -> bool {
        self.state == PassState::Completed
    }
}

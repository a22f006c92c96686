//! Seams to the host's printing facilities.
//!
//! The orchestrator only ever talks to printers through these traits, so
//! tests substitute recording fakes instead of touching real OS state.

use crate::error::{PrinterError, RenderError};
use crate::printer::paper::PaperSize;
use crate::printer::profile::PrinterProfile;
use crate::worker::job::Job;

/// A printer as enumerated by the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrinterInfo {
    pub name: String,
    /// Whether the OS currently marks this printer as its default.
    pub is_default: bool,
}

impl PrinterInfo {
    pub fn new(name: impl Into<String>, is_default: bool) -> Self {
        Self {
            name: name.into(),
            is_default,
        }
    }
}

/// Submits one document to one printer.
pub trait DocumentRenderer: Send + Sync {
    /// Blocks until the submission has been handed to the spooler or failed.
    ///
    /// Spreadsheet jobs must honour `profile.page_range` (first page only) and
    /// the profile's paper size, scaling and orientation.
    fn print(&self, job: &Job, profile: &PrinterProfile) -> Result<(), RenderError>;
}

/// Enumerates printers and owns the OS default-printer setting.
pub trait PrinterDirectory: Send + Sync {
    /// Installed printers in host order.
    fn list_printers(&self) -> Result<Vec<PrinterInfo>, PrinterError>;

    /// Makes `name` the OS default printer.
    fn set_os_default(&self, name: &str) -> Result<(), PrinterError>;

    /// Paper sizes `name` accepts.
    fn supported_paper_sizes(&self, name: &str) -> Result<Vec<PaperSize>, PrinterError>;
}

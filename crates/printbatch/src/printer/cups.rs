//! Printer access through the CUPS command-line tools.
//!
//! `lpstat` and `lpoptions` answer the directory queries, `lp` submits jobs.
//! Spreadsheets are converted to PDF with a headless LibreOffice first so
//! that the page range and scaling options apply to the rendered pages.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use log::{debug, info, warn};

use crate::error::{PrinterError, RenderError};
use crate::printer::paper::{PaperCatalog, PaperSize};
use crate::printer::profile::{Orientation, PageRange, PageScaling, PrinterProfile};
use crate::printer::traits::{DocumentRenderer, PrinterDirectory, PrinterInfo};
use crate::worker::job::{DocumentKind, Job};

/// Removes a conversion scratch directory when dropped.
struct ScratchDir {
    path: PathBuf,
}

impl Drop for ScratchDir {
    fn drop(&mut self) {
        if let Err(e) = std::fs::remove_dir_all(&self.path) {
            warn!("Failed to clean up {}: {}", self.path.display(), e);
        }
    }
}

/// Formats a failed command's output, preferring stderr.
fn format_command_error(output: &Output) -> String {
    let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
    let stdout = String::from_utf8_lossy(&output.stdout).trim().to_string();

    match (stderr.is_empty(), stdout.is_empty()) {
        (true, true) => format!(
            "Command failed with exit code {}",
            output.status.code().unwrap_or(-1)
        ),
        (true, false) => stdout,
        (false, true) => stderr,
        (false, false) => format!("{}\n{}", stderr, stdout),
    }
}

pub struct CupsPrinter {
    office_program: String,
    scratch_root: PathBuf,
    paper: PaperCatalog,
}

impl Default for CupsPrinter {
    fn default() -> Self {
        Self::new()
    }
}

impl CupsPrinter {
    pub fn new() -> Self {
        Self {
            office_program: "soffice".to_string(),
            scratch_root: std::env::temp_dir().join("printbatch"),
            paper: PaperCatalog::default(),
        }
    }

    /// CUPS media names for paper-size ids the built-in table lacks.
    pub fn with_paper_names(mut self, names: BTreeMap<u16, String>) -> Self {
        self.paper = PaperCatalog::new(names);
        self
    }

    /// Uses a different office binary for spreadsheet conversion, e.g. `libreoffice`.
    pub fn with_office_program(mut self, program: impl Into<String>) -> Self {
        self.office_program = program.into();
        self
    }

    fn run_query(&self, program: &str, args: &[&str]) -> Result<String, PrinterError> {
        let output = Command::new(program)
            .args(args)
            .env("LC_ALL", "C")
            .output()
            .map_err(|e| PrinterError::Unavailable(format!("{}: {}", program, e)))?;

        if !output.status.success() {
            return Err(PrinterError::Command {
                program: program.to_string(),
                message: format_command_error(&output),
            });
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }

    fn current_default(&self) -> Option<String> {
        match self.run_query("lpstat", &["-d"]) {
            Ok(out) => parse_default_destination(&out),
            // lpstat exits non-zero when no default is configured.
            Err(e) => {
                debug!("No default destination: {}", e);
                None
            }
        }
    }

    fn submit(&self, path: &Path, profile: &PrinterProfile) -> Result<(), RenderError> {
        let args = lp_arguments(path, profile, &self.paper);
        debug!("lp {}", args.join(" "));

        let output = Command::new("lp")
            .args(&args)
            .output()
            .map_err(|e| RenderError::Spawn {
                program: "lp".to_string(),
                source: e,
            })?;

        if !output.status.success() {
            return Err(RenderError::Failed(format_command_error(&output)));
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        info!("Submitted {}: {}", path.display(), stdout.trim());
        Ok(())
    }

    fn convert_to_pdf(&self, source: &Path) -> Result<(ScratchDir, PathBuf), RenderError> {
        let scratch = ScratchDir {
            path: self.scratch_root.join(uuid::Uuid::new_v4().to_string()),
        };
        std::fs::create_dir_all(&scratch.path)
            .map_err(|e| RenderError::Failed(format!("scratch directory: {}", e)))?;

        let output = Command::new(&self.office_program)
            .arg("--headless")
            .arg("--convert-to")
            .arg("pdf")
            .arg("--outdir")
            .arg(&scratch.path)
            .arg(source)
            .output()
            .map_err(|e| RenderError::Spawn {
                program: self.office_program.clone(),
                source: e,
            })?;

        if !output.status.success() {
            return Err(RenderError::Failed(format_command_error(&output)));
        }

        let stem = source
            .file_stem()
            .ok_or_else(|| RenderError::Failed(format!("no file stem: {}", source.display())))?;
        let pdf = scratch.path.join(stem).with_extension("pdf");
        if !pdf.is_file() {
            return Err(RenderError::Failed(format!(
                "conversion produced no output for {}",
                source.display()
            )));
        }

        Ok((scratch, pdf))
    }
}

impl DocumentRenderer for CupsPrinter {
    fn print(&self, job: &Job, profile: &PrinterProfile) -> Result<(), RenderError> {
        match job.kind {
            DocumentKind::PageDocument => self.submit(&job.source_path, profile),
            DocumentKind::SpreadsheetDocument => {
                let (_scratch, pdf) = self.convert_to_pdf(&job.source_path)?;
                self.submit(&pdf, profile)
            }
            DocumentKind::Unrecognized => Err(RenderError::UnsupportedKind(job.kind.to_string())),
        }
    }
}

impl PrinterDirectory for CupsPrinter {
    fn list_printers(&self) -> Result<Vec<PrinterInfo>, PrinterError> {
        let names = parse_printer_names(&self.run_query("lpstat", &["-e"])?);
        let default = self.current_default();

        Ok(names
            .into_iter()
            .map(|name| {
                let is_default = default.as_deref() == Some(name.as_str());
                PrinterInfo { name, is_default }
            })
            .collect())
    }

    fn set_os_default(&self, name: &str) -> Result<(), PrinterError> {
        self.run_query("lpoptions", &["-d", name]).map(|_| ())
    }

    fn supported_paper_sizes(&self, name: &str) -> Result<Vec<PaperSize>, PrinterError> {
        let out = self.run_query("lpoptions", &["-p", name, "-l"])?;
        Ok(parse_page_sizes(&out, &self.paper))
    }
}

/// One destination name per line of `lpstat -e`.
pub(crate) fn parse_printer_names(stdout: &str) -> Vec<String> {
    stdout
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(str::to_string)
        .collect()
}

/// Extracts NAME from `system default destination: NAME`.
pub(crate) fn parse_default_destination(stdout: &str) -> Option<String> {
    stdout.lines().find_map(|line| {
        let (_, name) = line.split_once("default destination:")?;
        let name = name.trim();
        (!name.is_empty()).then(|| name.to_string())
    })
}

/// Reads the `PageSize` line of `lpoptions -l`, keeping sizes the catalog knows.
pub(crate) fn parse_page_sizes(stdout: &str, catalog: &PaperCatalog) -> Vec<PaperSize> {
    let Some(choices) = stdout.lines().find_map(|line| {
        let (key, choices) = line.split_once(':')?;
        let key = key.split('/').next()?.trim();
        (key == "PageSize" || key == "media").then_some(choices)
    }) else {
        return Vec::new();
    };

    let mut sizes: Vec<PaperSize> = Vec::new();
    for choice in choices.split_whitespace() {
        let name = choice.trim_start_matches('*');
        if let Some(size) = catalog.lookup_media(name) {
            if !sizes.iter().any(|s| s.id == size.id) {
                sizes.push(size);
            }
        }
    }
    sizes
}

pub(crate) fn lp_arguments(
    path: &Path,
    profile: &PrinterProfile,
    catalog: &PaperCatalog,
) -> Vec<String> {
    let mut args = Vec::new();

    if !profile.printer.is_empty() {
        args.push("-d".to_string());
        args.push(profile.printer.clone());
    }

    let mut option = |value: String| {
        args.push("-o".to_string());
        args.push(value);
    };

    if let Some(media) = profile.paper_size.and_then(|id| catalog.media_name(id)) {
        option(format!("media={}", media));
    }

    match profile.scaling {
        PageScaling::Natural => {}
        PageScaling::FitToPage { .. } => option("fit-to-page".to_string()),
        PageScaling::Zoom(percent) => option(format!("natural-scaling={}", percent)),
    }

    option(match profile.orientation {
        Orientation::Portrait => "orientation-requested=3".to_string(),
        Orientation::Landscape => "orientation-requested=4".to_string(),
    });

    if profile.page_range == PageRange::FirstPageOnly {
        option("page-ranges=1".to_string());
    }

    option(if profile.duplex {
        "sides=two-sided-long-edge".to_string()
    } else {
        "sides=one-sided".to_string()
    });

    option(if profile.monochrome {
        "print-color-mode=monochrome".to_string()
    } else {
        "print-color-mode=color".to_string()
    });

    args.push("--".to_string());
    args.push(path.to_string_lossy().into_owned());
    args
}

use std::collections::HashMap;

use log::{debug, info, warn};

use crate::config::BatchConfiguration;
use crate::orchestrator::state::PassWarning;
use crate::printer::paper::STANDARD_PAPER_SIZE;
use crate::printer::traits::PrinterDirectory;
use crate::worker::job::{DocumentKind, Job};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Orientation {
    Portrait,
    Landscape,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageRange {
    All,
    FirstPageOnly,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageScaling {
    /// The document's own scale.
    Natural,
    /// Print at a fixed percentage.
    Zoom(u16),
    /// Shrink to fit the given number of pages across and down.
    FitToPage { pages_wide: u8, pages_tall: u8 },
}

/// Everything a renderer needs to know about where and how a job prints.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrinterProfile {
    /// Target printer; empty means the OS default.
    pub printer: String,
    /// Paper-size id; `None` keeps the document's own page size.
    pub paper_size: Option<u16>,
    pub scaling: PageScaling,
    pub orientation: Orientation,
    pub page_range: PageRange,
    pub monochrome: bool,
    pub duplex: bool,
}

impl PrinterProfile {
    pub fn zoom(&self) -> Option<u16> {
        match self.scaling {
            PageScaling::Zoom(z) => Some(z),
            PageScaling::Natural | PageScaling::FitToPage { .. } => None,
        }
    }

    pub fn fit_to_page(&self) -> bool {
        matches!(self.scaling, PageScaling::FitToPage { .. })
    }
}

/// A profile plus the warning raised if its paper size had to be replaced.
#[derive(Debug, Clone)]
pub struct ResolvedProfile {
    pub profile: PrinterProfile,
    pub warning: Option<PassWarning>,
}

/// Outcome of choosing and installing the default printer at pass start.
#[derive(Debug, Clone, Default)]
pub struct DefaultPrinterSetup {
    /// Printer normal jobs go to; empty means the OS default.
    pub printer: String,
    pub warnings: Vec<PassWarning>,
}

/// Picks the default printer for a pass and makes it the OS default.
///
/// The configured name wins when it is installed; otherwise the printer the
/// OS marks as default, otherwise the first one listed. None of the failures
/// here end the pass: they become warnings and the pass keeps whatever
/// printer is currently selected.
pub fn select_default_printer(
    configured: &str,
    directory: &dyn PrinterDirectory,
) -> DefaultPrinterSetup {
    let printers = match directory.list_printers() {
        Ok(printers) => printers,
        Err(e) => {
            warn!("Could not enumerate printers: {}", e);
            return DefaultPrinterSetup {
                printer: configured.to_string(),
                warnings: vec![PassWarning::PrinterListUnavailable {
                    error: e.to_string(),
                }],
            };
        }
    };

    let current = printers
        .iter()
        .find(|p| p.is_default)
        .map(|p| p.name.clone());

    let mut warnings = Vec::new();
    let target = if !configured.is_empty() && printers.iter().any(|p| p.name == configured) {
        Some(configured.to_string())
    } else {
        if !configured.is_empty() {
            warn!("Configured printer '{}' is not installed", configured);
            warnings.push(PassWarning::PrinterSetupFailed {
                printer: configured.to_string(),
                error: "printer is not installed".to_string(),
            });
        }
        current.clone().or_else(|| printers.first().map(|p| p.name.clone()))
    };

    let Some(target) = target else {
        warn!("No printers installed, relying on the system default");
        warnings.push(PassWarning::PrinterListUnavailable {
            error: "no printers installed".to_string(),
        });
        return DefaultPrinterSetup {
            printer: configured.to_string(),
            warnings,
        };
    };

    if current.as_deref() == Some(target.as_str()) {
        debug!("'{}' is already the default printer", target);
        return DefaultPrinterSetup {
            printer: target,
            warnings,
        };
    }

    match directory.set_os_default(&target) {
        Ok(()) => {
            info!("Default printer set to '{}'", target);
            DefaultPrinterSetup {
                printer: target,
                warnings,
            }
        }
        Err(e) => {
            warn!("Failed to set default printer '{}': {}", target, e);
            warnings.push(PassWarning::PrinterSetupFailed {
                printer: target.clone(),
                error: e.to_string(),
            });
            DefaultPrinterSetup {
                printer: current.unwrap_or(target),
                warnings,
            }
        }
    }
}

/// Builds per-job printer profiles for one pass.
///
/// Supported paper sizes are queried at most once per printer.
pub struct PrinterProfileResolver {
    default_printer: String,
    priority_printer: String,
    paper_size: u16,
    zoom: u16,
    monochrome: bool,
    duplex: bool,
    supported: HashMap<String, Option<Vec<u16>>>,
}

impl PrinterProfileResolver {
    /// `default_printer` is the printer chosen by [`select_default_printer`].
    pub fn new(config: &BatchConfiguration, default_printer: impl Into<String>) -> Self {
        Self {
            default_printer: default_printer.into(),
            priority_printer: config.priority_printer_name.clone(),
            paper_size: config.default_paper_size,
            zoom: config.default_paper_zoom,
            monochrome: config.bw_print,
            duplex: config.duplex_print,
            supported: HashMap::new(),
        }
    }

    /// Page documents keep their own page setup unless they are priority
    /// documents; only spreadsheets take the configured paper size and zoom.
    pub fn resolve(&mut self, job: &Job, directory: &dyn PrinterDirectory) -> ResolvedProfile {
        let page_range = match job.kind {
            DocumentKind::SpreadsheetDocument => PageRange::FirstPageOnly,
            DocumentKind::PageDocument => PageRange::All,
            // Never submitted; the runner skips these before resolving.
            DocumentKind::Unrecognized => PageRange::All,
        };

        if job.is_priority {
            let printer = if self.priority_printer.is_empty() {
                self.default_printer.clone()
            } else {
                self.priority_printer.clone()
            };
            return ResolvedProfile {
                profile: PrinterProfile {
                    printer,
                    paper_size: Some(STANDARD_PAPER_SIZE),
                    scaling: PageScaling::FitToPage {
                        pages_wide: 1,
                        pages_tall: 1,
                    },
                    orientation: Orientation::Portrait,
                    page_range,
                    monochrome: self.monochrome,
                    duplex: self.duplex,
                },
                warning: None,
            };
        }

        let printer = self.default_printer.clone();
        if job.kind != DocumentKind::SpreadsheetDocument {
            return ResolvedProfile {
                profile: PrinterProfile {
                    printer,
                    paper_size: None,
                    scaling: PageScaling::Natural,
                    orientation: Orientation::Portrait,
                    page_range,
                    monochrome: self.monochrome,
                    duplex: self.duplex,
                },
                warning: None,
            };
        }

        let (paper_size, warning) = self.checked_paper_size(&printer, directory);

        ResolvedProfile {
            profile: PrinterProfile {
                printer,
                paper_size: Some(paper_size),
                scaling: PageScaling::Zoom(self.zoom),
                orientation: Orientation::Portrait,
                page_range,
                monochrome: self.monochrome,
                duplex: self.duplex,
            },
            warning,
        }
    }

    fn checked_paper_size(
        &mut self,
        printer: &str,
        directory: &dyn PrinterDirectory,
    ) -> (u16, Option<PassWarning>) {
        let requested = self.paper_size;
        let supported = self
            .supported
            .entry(printer.to_string())
            .or_insert_with(|| match directory.supported_paper_sizes(printer) {
                Ok(sizes) => Some(sizes.into_iter().map(|s| s.id).collect()),
                Err(e) => {
                    debug!("Paper sizes for '{}' unavailable: {}", printer, e);
                    None
                }
            });

        match supported {
            Some(ids) if !ids.is_empty() && !ids.contains(&requested) => {
                warn!(
                    "Paper size {} not supported by '{}', using {}",
                    requested, printer, STANDARD_PAPER_SIZE
                );
                (
                    STANDARD_PAPER_SIZE,
                    Some(PassWarning::PaperSizeFallback {
                        printer: printer.to_string(),
                        requested,
                        used: STANDARD_PAPER_SIZE,
                    }),
                )
            }
            _ => (requested, None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PrinterError;
    use crate::printer::paper::PaperSize;
    use crate::printer::traits::PrinterInfo;
    use std::path::PathBuf;
    use std::sync::Mutex;

    #[derive(Default)]
    struct StubDirectory {
        printers: Vec<PrinterInfo>,
        fail_list: bool,
        fail_set: bool,
        sizes: Vec<u16>,
        set_calls: Mutex<Vec<String>>,
        size_queries: Mutex<usize>,
    }

    impl PrinterDirectory for StubDirectory {
        fn list_printers(&self) -> Result<Vec<PrinterInfo>, PrinterError> {
            if self.fail_list {
                return Err(PrinterError::Unavailable("spooler down".into()));
            }
            Ok(self.printers.clone())
        }

        fn set_os_default(&self, name: &str) -> Result<(), PrinterError> {
            self.set_calls.lock().unwrap().push(name.to_string());
            if self.fail_set {
                return Err(PrinterError::Command {
                    program: "lpoptions".into(),
                    message: "denied".into(),
                });
            }
            Ok(())
        }

        fn supported_paper_sizes(&self, _name: &str) -> Result<Vec<PaperSize>, PrinterError> {
            *self.size_queries.lock().unwrap() += 1;
            Ok(self
                .sizes
                .iter()
                .map(|&id| PaperSize {
                    id,
                    display_name: id.to_string(),
                    width: 0,
                    height: 0,
                })
                .collect())
        }
    }

    fn config() -> BatchConfiguration {
        let mut config = BatchConfiguration::new("/srv/outbox");
        config.priority_printer_name = "Statements".into();
        config.default_paper_size = 132;
        config.default_paper_zoom = 75;
        config
    }

    fn job(name: &str) -> Job {
        Job::new(PathBuf::from("/srv/outbox/1042").join(name), "月结单")
    }

    #[test]
    fn test_spreadsheet_prints_first_page_with_zoom() {
        let dir = StubDirectory::default();
        let mut resolver = PrinterProfileResolver::new(&config(), "Office");

        let resolved = resolver.resolve(&job("delivery.xlsx"), &dir);
        let p = resolved.profile;
        assert_eq!(p.printer, "Office");
        assert_eq!(p.paper_size, Some(132));
        assert_eq!(p.zoom(), Some(75));
        assert!(!p.fit_to_page());
        assert_eq!(p.page_range, PageRange::FirstPageOnly);
        assert!(resolved.warning.is_none());
    }

    #[test]
    fn test_pdf_prints_all_pages() {
        let dir = StubDirectory::default();
        let mut resolver = PrinterProfileResolver::new(&config(), "Office");
        let p = resolver.resolve(&job("delivery.pdf"), &dir).profile;
        assert_eq!(p.page_range, PageRange::All);
    }

    #[test]
    fn test_pdf_keeps_its_own_page_setup() {
        let dir = StubDirectory {
            sizes: vec![1, 9],
            ..Default::default()
        };
        let mut resolver = PrinterProfileResolver::new(&config(), "Office");

        let resolved = resolver.resolve(&job("delivery.pdf"), &dir);
        let p = resolved.profile;
        assert_eq!(p.printer, "Office");
        assert_eq!(p.paper_size, None);
        assert_eq!(p.scaling, PageScaling::Natural);
        assert_eq!(p.zoom(), None);
        assert!(!p.fit_to_page());
        assert!(resolved.warning.is_none());
        assert_eq!(*dir.size_queries.lock().unwrap(), 0);
    }

    #[test]
    fn test_priority_profile() {
        let dir = StubDirectory::default();
        let mut resolver = PrinterProfileResolver::new(&config(), "Office");

        let p = resolver.resolve(&job("ACME_月结单.xlsx"), &dir).profile;
        assert_eq!(p.printer, "Statements");
        assert_eq!(p.paper_size, Some(STANDARD_PAPER_SIZE));
        assert!(p.fit_to_page());
        assert_eq!(p.zoom(), None);
        assert_eq!(p.orientation, Orientation::Portrait);
        assert_eq!(p.page_range, PageRange::FirstPageOnly);
    }

    #[test]
    fn test_priority_profile_same_printer_still_fits_page() {
        let mut cfg = config();
        cfg.priority_printer_name = "Office".into();
        let dir = StubDirectory::default();
        let mut resolver = PrinterProfileResolver::new(&cfg, "Office");

        let p = resolver.resolve(&job("ACME_月结单.pdf"), &dir).profile;
        assert_eq!(p.printer, "Office");
        assert!(p.fit_to_page());
        assert_eq!(p.paper_size, Some(STANDARD_PAPER_SIZE));
    }

    #[test]
    fn test_priority_without_priority_printer_uses_default() {
        let mut cfg = config();
        cfg.priority_printer_name.clear();
        let dir = StubDirectory::default();
        let mut resolver = PrinterProfileResolver::new(&cfg, "Office");

        let p = resolver.resolve(&job("ACME_月结单.pdf"), &dir).profile;
        assert_eq!(p.printer, "Office");
    }

    #[test]
    fn test_unsupported_paper_falls_back_and_caches() {
        let dir = StubDirectory {
            sizes: vec![1, 9],
            ..Default::default()
        };
        let mut resolver = PrinterProfileResolver::new(&config(), "Office");

        let first = resolver.resolve(&job("a.xls"), &dir);
        assert_eq!(first.profile.paper_size, Some(STANDARD_PAPER_SIZE));
        assert!(matches!(
            first.warning,
            Some(PassWarning::PaperSizeFallback { requested: 132, used: 9, .. })
        ));

        resolver.resolve(&job("b.xls"), &dir);
        assert_eq!(*dir.size_queries.lock().unwrap(), 1);
    }

    #[test]
    fn test_empty_size_list_keeps_requested() {
        let dir = StubDirectory::default();
        let mut resolver = PrinterProfileResolver::new(&config(), "Office");
        assert_eq!(resolver.resolve(&job("a.xls"), &dir).profile.paper_size, Some(132));
    }

    #[test]
    fn test_select_configured_printer() {
        let dir = StubDirectory {
            printers: vec![PrinterInfo::new("Office", true), PrinterInfo::new("Label", false)],
            ..Default::default()
        };
        let setup = select_default_printer("Label", &dir);
        assert_eq!(setup.printer, "Label");
        assert!(setup.warnings.is_empty());
        assert_eq!(*dir.set_calls.lock().unwrap(), vec!["Label".to_string()]);
    }

    #[test]
    fn test_select_without_configuration_keeps_marked_default() {
        let dir = StubDirectory {
            printers: vec![PrinterInfo::new("Label", false), PrinterInfo::new("Office", true)],
            ..Default::default()
        };
        let setup = select_default_printer("", &dir);
        assert_eq!(setup.printer, "Office");
        assert!(dir.set_calls.lock().unwrap().is_empty());
    }

    #[test]
    fn test_set_default_failure_is_soft() {
        let dir = StubDirectory {
            printers: vec![PrinterInfo::new("Office", true), PrinterInfo::new("Label", false)],
            fail_set: true,
            ..Default::default()
        };
        let setup = select_default_printer("Label", &dir);
        assert_eq!(setup.printer, "Office");
        assert!(matches!(
            setup.warnings.as_slice(),
            [PassWarning::PrinterSetupFailed { printer, .. }] if printer == "Label"
        ));
    }

    #[test]
    fn test_list_failure_uses_configured_name() {
        let dir = StubDirectory {
            fail_list: true,
            ..Default::default()
        };
        let setup = select_default_printer("Office", &dir);
        assert_eq!(setup.printer, "Office");
        assert!(matches!(
            setup.warnings.as_slice(),
            [PassWarning::PrinterListUnavailable { .. }]
        ));
    }

    #[test]
    fn test_missing_configured_printer_falls_back_to_current() {
        let dir = StubDirectory {
            printers: vec![PrinterInfo::new("Office", true)],
            ..Default::default()
        };
        let setup = select_default_printer("Gone", &dir);
        assert_eq!(setup.printer, "Office");
        assert_eq!(setup.warnings.len(), 1);
    }
}

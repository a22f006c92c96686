//! Paper sizes, identified by the Windows `DMPAPER_*` numbers the settings
//! file has always used.

use std::collections::BTreeMap;

/// A4, the size every printer is assumed to accept.
pub const STANDARD_PAPER_SIZE: u16 = 9;

/// A paper size a printer reports as supported. Dimensions are in tenths of a millimetre.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PaperSize {
    pub id: u16,
    pub display_name: String,
    pub width: u32,
    pub height: u32,
}

pub(crate) struct KnownPaper {
    pub id: u16,
    pub display_name: &'static str,
    pub cups_name: &'static str,
    pub width: u32,
    pub height: u32,
}

#[rustfmt::skip]
pub(crate) const KNOWN_PAPER: &[KnownPaper] = &[
    KnownPaper { id: 1, display_name: "Letter", cups_name: "Letter", width: 2159, height: 2794 },
    KnownPaper { id: 3, display_name: "Tabloid", cups_name: "Tabloid", width: 2794, height: 4318 },
    KnownPaper { id: 5, display_name: "Legal", cups_name: "Legal", width: 2159, height: 3556 },
    KnownPaper { id: 7, display_name: "Executive", cups_name: "Executive", width: 1842, height: 2667 },
    KnownPaper { id: 8, display_name: "A3", cups_name: "A3", width: 2970, height: 4200 },
    KnownPaper { id: 9, display_name: "A4", cups_name: "A4", width: 2100, height: 2970 },
    KnownPaper { id: 11, display_name: "A5", cups_name: "A5", width: 1480, height: 2100 },
    KnownPaper { id: 12, display_name: "B4 (JIS)", cups_name: "JB4", width: 2570, height: 3640 },
    KnownPaper { id: 13, display_name: "B5 (JIS)", cups_name: "JB5", width: 1820, height: 2570 },
    KnownPaper { id: 20, display_name: "Envelope #10", cups_name: "Env10", width: 1048, height: 2413 },
    KnownPaper { id: 27, display_name: "Envelope DL", cups_name: "EnvDL", width: 1100, height: 2200 },
];

impl KnownPaper {
    pub fn to_paper_size(&self) -> PaperSize {
        PaperSize {
            id: self.id,
            display_name: self.display_name.to_string(),
            width: self.width,
            height: self.height,
        }
    }
}

pub(crate) fn known_by_id(id: u16) -> Option<&'static KnownPaper> {
    KNOWN_PAPER.iter().find(|p| p.id == id)
}

pub(crate) fn known_by_cups_name(name: &str) -> Option<&'static KnownPaper> {
    KNOWN_PAPER
        .iter()
        .find(|p| p.cups_name.eq_ignore_ascii_case(name))
}

/// Maps paper-size ids to CUPS media names and back.
///
/// Ids missing from the built-in table (driver-specific sizes such as 132)
/// only resolve when the settings file names their CUPS media.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PaperCatalog {
    custom: BTreeMap<u16, String>,
}

impl PaperCatalog {
    pub fn new(custom: BTreeMap<u16, String>) -> Self {
        Self { custom }
    }

    /// CUPS `media` value for `id`. Custom names take precedence.
    pub fn media_name(&self, id: u16) -> Option<&str> {
        self.custom
            .get(&id)
            .map(String::as_str)
            .or_else(|| known_by_id(id).map(|p| p.cups_name))
    }

    /// The paper size a CUPS media name stands for, if any.
    pub fn lookup_media(&self, name: &str) -> Option<PaperSize> {
        if let Some((&id, custom)) = self
            .custom
            .iter()
            .find(|(_, media)| media.eq_ignore_ascii_case(name))
        {
            return Some(match known_by_id(id) {
                Some(known) => known.to_paper_size(),
                // Dimensions of driver-specific sizes are unknown.
                None => PaperSize {
                    id,
                    display_name: custom.clone(),
                    width: 0,
                    height: 0,
                },
            });
        }
        known_by_cups_name(name).map(KnownPaper::to_paper_size)
    }
}

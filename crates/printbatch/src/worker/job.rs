use std::fmt;
use std::path::{Path, PathBuf};

/// Leading characters office applications use for open-file lock files.
pub const LOCK_FILE_PREFIX: &str = "~$";

/// Kind of document, decided once from the file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DocumentKind {
    PageDocument,
    SpreadsheetDocument,
    Unrecognized,
}

impl DocumentKind {
    pub fn from_extension(ext: &str) -> Self {
        match ext.to_lowercase().as_str() {
            "pdf" => Self::PageDocument,
            "xls" | "xlsx" => Self::SpreadsheetDocument,
            _ => Self::Unrecognized,
        }
    }

    pub fn from_path(path: &Path) -> Self {
        path.extension()
            .and_then(|e| e.to_str())
            .map(Self::from_extension)
            .unwrap_or(Self::Unrecognized)
    }
}

impl fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::PageDocument => "page",
            Self::SpreadsheetDocument => "spreadsheet",
            Self::Unrecognized => "unrecognized",
        };
        f.write_str(label)
    }
}

/// Whether a file name is an office lock file that must never be printed.
pub fn is_lock_file(name: &str) -> bool {
    name.starts_with(LOCK_FILE_PREFIX)
}

/// Labels a file name with its document kind and whether it carries the priority marker.
pub fn classify(filename: &str, priority_marker: &str) -> (DocumentKind, bool) {
    let kind = DocumentKind::from_path(Path::new(filename));
    let is_priority = !priority_marker.is_empty() && filename.contains(priority_marker);
    (kind, is_priority)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Job {
    pub source_path: PathBuf,
    pub kind: DocumentKind,
    pub is_priority: bool,
}

impl Job {
    /// Classifies the file at `source_path` by its file name.
    pub fn new(source_path: PathBuf, priority_marker: &str) -> Self {
        let name = source_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let (kind, is_priority) = classify(&name, priority_marker);
        Self {
            source_path,
            kind,
            is_priority,
        }
    }

    pub fn file_name(&self) -> String {
        crate::sanitize::redact_path(&self.source_path)
    }
}

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PrintBatchError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Printer error: {0}")]
    Printer(#[from] PrinterError),

    #[error("Worker error: {0}")]
    Worker(#[from] WorkerError),

    #[error("Pass error: {0}")]
    Pass(#[from] PassError),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {source}")]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write config file '{path}': {source}")]
    WriteFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config JSON: {0}")]
    ParseJson(#[from] serde_json::Error),

    #[error("Config validation failed: {message}")]
    Validation { message: String },

    #[error("Schema validation failed: {errors}")]
    SchemaValidation { errors: String },

    #[error("Invalid checkpoint pattern '{pattern}': {reason}")]
    InvalidPattern { pattern: String, reason: String },
}

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Failed to create directory '{path}': {source}")]
    CreateDirectory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to move file from '{from}' to '{to}': {source}")]
    MoveFile {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("File '{path}' is not inside source root '{root}'")]
    OutsideSource { path: PathBuf, root: PathBuf },

    #[error("Source root '{0}' has no directory name to derive an archive root from")]
    InvalidSourceRoot(PathBuf),

    #[error("File already exists: {0}")]
    FileExists(PathBuf),

    #[error("Failed to open log file '{path}': {source}")]
    OpenLog {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Error, Debug)]
pub enum ScanError {
    #[error("Directory scan failed for '{path}': {source}")]
    ScanFailed {
        path: PathBuf,
        #[source]
        source: walkdir::Error,
    },

    #[error("Failed to read directory '{path}': {source}")]
    ReadDirectory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl ScanError {
    pub fn path(&self) -> &std::path::Path {
        match self {
            Self::ScanFailed { path, .. } | Self::ReadDirectory { path, .. } => path,
        }
    }
}

#[derive(Error, Debug)]
pub enum RenderError {
    #[error("Renderer does not support {0} documents")]
    UnsupportedKind(String),

    #[error("Failed to launch '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Print submission failed: {0}")]
    Failed(String),
}

#[derive(Error, Debug)]
pub enum PrinterError {
    #[error("Printer command '{program}' failed: {message}")]
    Command { program: String, message: String },

    #[error("Printer directory unavailable: {0}")]
    Unavailable(String),
}

#[derive(Error, Debug)]
pub enum WorkerError {
    #[error("Failed to spawn worker: {0}")]
    SpawnFailed(String),
}

/// Errors that end a pass in the `Aborted` state.
#[derive(Error, Debug)]
pub enum PassError {
    #[error("Source directory not found: {0}")]
    SourceNotFound(PathBuf),

    #[error("Printing '{path}' failed: {source}")]
    RenderFailure {
        path: PathBuf,
        #[source]
        source: RenderError,
    },

    #[error("Archiving '{path}' failed after printing: {source}")]
    ArchiveMoveFailure {
        path: PathBuf,
        #[source]
        source: StorageError,
    },

    #[error("Walking the source tree failed: {0}")]
    ScanFailed(#[from] ScanError),

    #[error("Pass was forcibly terminated")]
    Terminated,
}

impl PassError {
    /// The file or directory the failure is attributed to, if any.
    pub fn path(&self) -> Option<&std::path::Path> {
        match self {
            Self::SourceNotFound(path) => Some(path),
            Self::RenderFailure { path, .. } | Self::ArchiveMoveFailure { path, .. } => Some(path),
            Self::ScanFailed(e) => Some(e.path()),
            Self::Terminated => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, PrintBatchError>;

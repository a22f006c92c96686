pub mod config;
pub mod error;
pub mod events;
pub mod orchestrator;
pub mod printer;
pub mod sanitize;
pub mod storage;
pub mod worker;

pub use config::{load_config, BatchConfiguration, PauseMode};
pub use error::{
    ConfigError, PassError, PrintBatchError, PrinterError, RenderError, Result, ScanError,
    StorageError, WorkerError,
};
pub use events::{ChannelSink, LogLevel, LogLine, LogSink};
pub use orchestrator::{
    CheckpointPrompt, Orchestrator, PassOutcome, PassServices, PassState, PassStatus,
    PassSummary, PassWarning, PromptResponse, StopResult,
};
pub use printer::{CupsPrinter, DocumentRenderer, PrinterDirectory, PrinterProfile};
pub use worker::{DocumentKind, Job};

//! The pass state machine and its caller-facing handle.

pub mod cancel;
pub mod gate;
pub mod handle;
mod runner;
pub mod state;

pub use cancel::CancellationToken;
pub use gate::{
    Checkpoint, CheckpointPredicate, CheckpointPrompt, GateDecision, PromptResponse, Unattended,
    WaitGate,
};
pub use handle::{Orchestrator, PassServices, StopResult};
pub use state::{PassOutcome, PassState, PassStatus, PassSummary, PassWarning};

//! Checkpoint pauses at directory boundaries.

use std::path::{Path, PathBuf};
use std::time::Duration;

use regex::Regex;

use crate::config::{BatchConfiguration, PauseMode};
use crate::error::ConfigError;
use crate::orchestrator::cancel::CancellationToken;

/// Decides from a directory's name whether finishing it is a checkpoint.
#[derive(Debug, Clone)]
pub struct CheckpointPredicate {
    pattern: Regex,
}

impl CheckpointPredicate {
    pub fn new(pattern: &str) -> Result<Self, ConfigError> {
        let pattern = Regex::new(pattern).map_err(|e| ConfigError::InvalidPattern {
            pattern: pattern.to_string(),
            reason: e.to_string(),
        })?;
        Ok(Self { pattern })
    }

    pub fn matches(&self, directory_name: &str) -> bool {
        self.pattern.is_match(directory_name)
    }
}

/// What the operator is asked to acknowledge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Checkpoint {
    pub directory: PathBuf,
    pub name: String,
    /// How long the prompt stays up before it proceeds on its own.
    pub pause: Duration,
    pub mode: PauseMode,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptResponse {
    Proceed,
    /// The operator asked for the pause; only honoured in `WaitIfConfirmed` mode.
    Wait,
    TimedOut,
}

/// Presents a checkpoint to the operator.
///
/// Implementations must return within `checkpoint.pause`, answering
/// `TimedOut` if nobody responded.
pub trait CheckpointPrompt: Send + Sync {
    fn acknowledge(&self, checkpoint: &Checkpoint) -> PromptResponse;
}

/// Prompt for unattended runs: always proceeds at once.
#[derive(Debug, Clone, Copy, Default)]
pub struct Unattended;

impl CheckpointPrompt for Unattended {
    fn acknowledge(&self, _checkpoint: &Checkpoint) -> PromptResponse {
        PromptResponse::Proceed
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateDecision {
    NotTriggered,
    Continued(PromptResponse),
    /// The pass slept for the pause duration; `interrupted` if a stop ended it early.
    Waited { interrupted: bool },
}

pub struct WaitGate {
    enabled: bool,
    predicate: CheckpointPredicate,
    pause: Duration,
    mode: PauseMode,
}

impl WaitGate {
    pub fn new(
        enabled: bool,
        predicate: CheckpointPredicate,
        pause: Duration,
        mode: PauseMode,
    ) -> Self {
        Self {
            enabled,
            predicate,
            pause,
            mode,
        }
    }

    pub fn from_config(config: &BatchConfiguration) -> Result<Self, ConfigError> {
        Ok(Self::new(
            config.enable_wait_prompt,
            CheckpointPredicate::new(&config.checkpoint_pattern)?,
            config.pause_duration(),
            config.pause_mode,
        ))
    }

    pub fn mode(&self) -> PauseMode {
        self.mode
    }

    /// Only directories where something was printed this pass are checkpoints.
    pub fn is_checkpoint(&self, directory_name: &str, printed_any: bool) -> bool {
        self.enabled && printed_any && self.predicate.matches(directory_name)
    }

    pub fn evaluate(
        &self,
        directory: &Path,
        directory_name: &str,
        printed_any: bool,
        prompt: &dyn CheckpointPrompt,
        token: &CancellationToken,
    ) -> GateDecision {
        if !self.is_checkpoint(directory_name, printed_any) {
            return GateDecision::NotTriggered;
        }

        let checkpoint = Checkpoint {
            directory: directory.to_path_buf(),
            name: directory_name.to_string(),
            pause: self.pause,
            mode: self.mode,
        };

        let response = prompt.acknowledge(&checkpoint);
        match (self.mode, response) {
            (PauseMode::WaitIfConfirmed, PromptResponse::Wait) => GateDecision::Waited {
                interrupted: token.wait_cancelled(self.pause),
            },
            (_, response) => GateDecision::Continued(response),
        }
    }
}

//! Checkpoint prompt on the terminal.

use std::io::BufRead;
use std::thread;

use crossbeam_channel::{unbounded, Receiver, RecvTimeoutError};

use printbatch::config::PauseMode;
use printbatch::orchestrator::{Checkpoint, CheckpointPrompt, PromptResponse};

/// Asks on stderr and reads the answer from stdin, giving up after the pause.
///
/// A single reader thread owns stdin for the life of the process so that a
/// timed-out prompt does not leave a blocked read behind.
pub struct ConsolePrompt {
    lines: Receiver<String>,
}

impl ConsolePrompt {
    /// Starts the stdin reader thread.
    ///
    /// # Errors
    ///
    /// Returns an error if the thread cannot be spawned.
    pub fn spawn() -> std::io::Result<Self> {
        let (tx, rx) = unbounded();
        thread::Builder::new()
            .name("printbatch-stdin".to_string())
            .spawn(move || {
                for line in std::io::stdin().lock().lines() {
                    let Ok(line) = line else { break };
                    if tx.send(line).is_err() {
                        break;
                    }
                }
            })?;
        Ok(Self { lines: rx })
    }

    #[cfg(test)]
    fn from_receiver(lines: Receiver<String>) -> Self {
        Self { lines }
    }
}

impl CheckpointPrompt for ConsolePrompt {
    fn acknowledge(&self, checkpoint: &Checkpoint) -> PromptResponse {
        // Anything typed before the prompt appeared is not an answer to it.
        while self.lines.try_recv().is_ok() {}

        let secs = checkpoint.pause.as_secs_f64();
        eprintln!();
        eprintln!("Directory finished: {}", checkpoint.directory.display());
        match checkpoint.mode {
            PauseMode::NotifyOnly => {
                eprintln!("Press Enter to continue (continuing in {secs:.0}s)");
            }
            PauseMode::WaitIfConfirmed => {
                eprintln!("Type 'w' and Enter to wait {secs:.0}s, or Enter to continue now");
                eprintln!("(continuing in {secs:.0}s)");
            }
        }

        match self.lines.recv_timeout(checkpoint.pause) {
            Ok(line) => parse_answer(&line),
            Err(RecvTimeoutError::Timeout) => PromptResponse::TimedOut,
            // stdin closed: nobody can answer
            Err(RecvTimeoutError::Disconnected) => PromptResponse::Proceed,
        }
    }
}

fn parse_answer(line: &str) -> PromptResponse {
    match line.trim().to_lowercase().as_str() {
        "w" | "wait" | "y" | "yes" => PromptResponse::Wait,
        _ => PromptResponse::Proceed,
    }
}

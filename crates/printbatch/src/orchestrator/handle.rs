use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, RwLock};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam_channel::{bounded, Receiver, RecvTimeoutError, Sender};
use log::{debug, error, info, warn};

use crate::config::BatchConfiguration;
use crate::error::{self, WorkerError};
use crate::events::{LogSink, PassLog};
use crate::orchestrator::cancel::CancellationToken;
use crate::orchestrator::gate::{CheckpointPrompt, Unattended, WaitGate};
use crate::orchestrator::runner::PassRunner;
use crate::orchestrator::state::{PassOutcome, PassStatus};
use crate::printer::traits::{DocumentRenderer, PrinterDirectory};
use crate::storage::archive::ArchiveMapping;

/// The collaborators a pass talks to.
#[derive(Clone)]
pub struct PassServices {
    pub renderer: Arc<dyn DocumentRenderer>,
    pub printers: Arc<dyn PrinterDirectory>,
    pub prompt: Arc<dyn CheckpointPrompt>,
}

impl PassServices {
    /// Services with an unattended checkpoint prompt.
    pub fn new(renderer: Arc<dyn DocumentRenderer>, printers: Arc<dyn PrinterDirectory>) -> Self {
        Self {
            renderer,
            printers,
            prompt: Arc::new(Unattended),
        }
    }

    pub fn with_prompt(mut self, prompt: Arc<dyn CheckpointPrompt>) -> Self {
        self.prompt = prompt;
        self
    }
}

#[derive(Debug)]
pub enum StopResult {
    /// The worker reached a terminal state within the grace period.
    Finished(PassOutcome),
    /// The worker did not stop in time; it was hard-stopped and detached.
    Terminated,
    /// No pass was running, or its outcome was already collected.
    NotRunning,
}

/// Runs one pass over a source tree on a dedicated worker thread.
///
/// Instances are single-use: the archive date and pass id are fixed at
/// construction, and a second `start` is a no-op. Create a new
/// `Orchestrator` for the next pass.
pub struct Orchestrator {
    pass_id: String,
    archive_root: PathBuf,
    token: CancellationToken,
    status: Arc<RwLock<PassStatus>>,
    pending: Mutex<Option<(PassRunner, Sender<PassOutcome>)>>,
    done_rx: Receiver<PassOutcome>,
    worker: Mutex<Option<JoinHandle<()>>>,
    started: AtomicBool,
}

impl Orchestrator {
    pub fn new(
        config: BatchConfiguration,
        services: PassServices,
    ) -> error::Result<Self> {
        config.validate()?;
        let mapping = ArchiveMapping::for_today(&config.source_dir)?;
        let gate = WaitGate::from_config(&config)?;

        let pass_id = uuid::Uuid::new_v4().to_string();
        let archive_root = mapping.archive_root().to_path_buf();
        let token = CancellationToken::new();
        let status = Arc::new(RwLock::new(PassStatus::idle(pass_id.clone())));
        let (done_tx, done_rx) = bounded(1);

        let runner = PassRunner {
            pass_id: pass_id.clone(),
            config,
            mapping,
            gate,
            services,
            token: token.clone(),
            status: Arc::clone(&status),
            log: PassLog::new(),
        };

        Ok(Self {
            pass_id,
            archive_root,
            token,
            status,
            pending: Mutex::new(Some((runner, done_tx))),
            done_rx,
            worker: Mutex::new(None),
            started: AtomicBool::new(false),
        })
    }

    pub fn pass_id(&self) -> &str {
        &self.pass_id
    }

    pub fn archive_root(&self) -> &Path {
        &self.archive_root
    }

    /// Spawns the worker. Returns `Ok(false)` if this instance already ran.
    ///
    /// `on_log` receives every log line on the worker thread; `on_done`
    /// receives the terminal outcome before `wait` does.
    pub fn start<L, D>(&self, on_log: L, on_done: D) -> Result<bool, WorkerError>
    where
        L: LogSink + 'static,
        D: FnOnce(&PassOutcome) + Send + 'static,
    {
        let Some((mut runner, done_tx)) = self.pending.lock().ok().and_then(|mut p| p.take())
        else {
            debug!("Pass {} already started", self.pass_id);
            return Ok(false);
        };

        runner.log.attach(Arc::new(on_log));

        let handle = thread::Builder::new()
            .name(format!("printbatch-pass-{}", &self.pass_id[..8]))
            .spawn(move || {
                let outcome = runner.run();
                on_done(&outcome);
                // Ignore errors - nobody waiting for the outcome is fine
                let _ = done_tx.send(outcome);
            })
            .map_err(|e| WorkerError::SpawnFailed(e.to_string()))?;

        if let Ok(mut worker) = self.worker.lock() {
            *worker = Some(handle);
        }
        self.started.store(true, Ordering::SeqCst);
        info!("Started pass {}", self.pass_id);
        Ok(true)
    }

    /// Requests a cooperative stop, honoured at the next directory boundary.
    pub fn stop(&self) {
        info!("Stop requested for pass {}", self.pass_id);
        self.token.cancel();
    }

    /// Hard stop. The worker gives up before its next job; a job already
    /// submitted to the renderer still runs to completion.
    pub fn terminate(&self) {
        warn!("Terminating pass {}", self.pass_id);
        self.token.terminate();
        if let Ok(mut status) = self.status.write() {
            status.abnormal_termination = true;
        }
    }

    /// Stops the pass, waiting up to `grace` before falling back to `terminate`.
    pub fn stop_and_wait(&self, grace: Duration) -> StopResult {
        if !self.started.load(Ordering::SeqCst) {
            return StopResult::NotRunning;
        }

        self.stop();
        match self.done_rx.recv_timeout(grace) {
            Ok(outcome) => {
                self.join_worker();
                StopResult::Finished(outcome)
            }
            Err(RecvTimeoutError::Timeout) => {
                self.terminate();
                // Detach; the thread exits on its own once the renderer returns.
                if let Ok(mut worker) = self.worker.lock() {
                    worker.take();
                }
                StopResult::Terminated
            }
            Err(RecvTimeoutError::Disconnected) => StopResult::NotRunning,
        }
    }

    pub fn status(&self) -> PassStatus {
        match self.status.read() {
            Ok(status) => status.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    pub fn is_running(&self) -> bool {
        self.started.load(Ordering::SeqCst) && !self.status().state.is_terminal()
    }

    /// Blocks until the pass ends. `None` if it never started, the worker
    /// died, or the outcome was already taken.
    pub fn wait(&self) -> Option<PassOutcome> {
        if !self.started.load(Ordering::SeqCst) {
            return None;
        }
        let outcome = self.done_rx.recv().ok();
        self.join_worker();
        outcome
    }

    pub fn wait_timeout(&self, timeout: Duration) -> Option<PassOutcome> {
        if !self.started.load(Ordering::SeqCst) {
            return None;
        }
        let outcome = self.done_rx.recv_timeout(timeout).ok()?;
        self.join_worker();
        Some(outcome)
    }

    fn join_worker(&self) {
        let handle = self.worker.lock().ok().and_then(|mut w| w.take());
        if let Some(handle) = handle {
            if let Err(e) = handle.join() {
                error!("Pass worker panicked: {:?}", e);
            }
        }
    }
}

/// Dropping a running orchestrator requests a cooperative stop.
impl Drop for Orchestrator {
    fn drop(&mut self) {
        if self.is_running() {
            self.stop();
        }
    }
}

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crossbeam_channel::{bounded, select, Receiver, Sender};

/// Shared stop signal for one pass.
///
/// `cancel` is cooperative and only observed at directory boundaries.
/// `terminate` is the hard stop: the worker gives up before its next job.
/// Each signal drops a channel sender so sleeping waiters wake immediately.
#[derive(Clone)]
pub struct CancellationToken {
    inner: Arc<Inner>,
}

struct Inner {
    cancelled: AtomicBool,
    terminated: AtomicBool,
    cancel_tx: Mutex<Option<Sender<()>>>,
    cancel_rx: Receiver<()>,
    terminate_tx: Mutex<Option<Sender<()>>>,
    terminate_rx: Receiver<()>,
}

impl Default for CancellationToken {
    fn default() -> Self {
        Self::new()
    }
}

impl CancellationToken {
    pub fn new() -> Self {
        let (cancel_tx, cancel_rx) = bounded(0);
        let (terminate_tx, terminate_rx) = bounded(0);
        Self {
            inner: Arc::new(Inner {
                cancelled: AtomicBool::new(false),
                terminated: AtomicBool::new(false),
                cancel_tx: Mutex::new(Some(cancel_tx)),
                cancel_rx,
                terminate_tx: Mutex::new(Some(terminate_tx)),
                terminate_rx,
            }),
        }
    }

    pub fn cancel(&self) {
        self.inner.cancelled.store(true, Ordering::SeqCst);
        if let Ok(mut tx) = self.inner.cancel_tx.lock() {
            tx.take();
        }
    }

    /// Hard stop. Implies `cancel`.
    pub fn terminate(&self) {
        self.inner.terminated.store(true, Ordering::SeqCst);
        if let Ok(mut tx) = self.inner.terminate_tx.lock() {
            tx.take();
        }
        self.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.inner.cancelled.load(Ordering::SeqCst)
    }

    pub fn is_terminated(&self) -> bool {
        self.inner.terminated.load(Ordering::SeqCst)
    }

    /// Sleeps for `duration` unless the pass is terminated first.
    ///
    /// Returns `true` if the sleep was cut short.
    pub fn sleep(&self, duration: Duration) -> bool {
        if self.is_terminated() {
            return true;
        }
        if duration.is_zero() {
            return false;
        }
        select! {
            recv(self.inner.terminate_rx) -> _ => true,
            default(duration) => false,
        }
    }

    /// Waits up to `duration` for `cancel` or `terminate`.
    ///
    /// Returns `true` if a stop was requested.
    pub fn wait_cancelled(&self, duration: Duration) -> bool {
        if self.is_cancelled() {
            return true;
        }
        select! {
            recv(self.inner.cancel_rx) -> _ => true,
            recv(self.inner.terminate_rx) -> _ => true,
            default(duration) => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;
    use std::time::Instant;

    #[test]
    fn test_initial_state() {
        let token = CancellationToken::new();
        assert!(!token.is_cancelled());
        assert!(!token.is_terminated());
    }

    #[test]
    fn test_terminate_implies_cancel() {
        let token = CancellationToken::new();
        token.terminate();
        assert!(token.is_cancelled());
        assert!(token.is_terminated());
    }

    #[test]
    fn test_sleep_runs_full_duration_on_cancel() {
        let token = CancellationToken::new();
        token.cancel();
        let start = Instant::now();
        assert!(!token.sleep(Duration::from_millis(50)));
        assert!(start.elapsed() >= Duration::from_millis(50));
    }

    #[test]
    fn test_sleep_wakes_on_terminate() {
        let token = CancellationToken::new();
        let remote = token.clone();
        let handle = thread::spawn(move || {
            thread::sleep(Duration::from_millis(20));
            remote.terminate();
        });

        let start = Instant::now();
        assert!(token.sleep(Duration::from_secs(10)));
        assert!(start.elapsed() < Duration::from_secs(5));
        handle.join().unwrap();
    }

    #[test]
    fn test_wait_cancelled_wakes_on_cancel() {
        let token = CancellationToken::new();
        let remote = token.clone();
        let handle = thread::spawn(move || {
            thread::sleep(Duration::from_millis(20));
            remote.cancel();
        });

        assert!(token.wait_cancelled(Duration::from_secs(10)));
        handle.join().unwrap();
    }

    #[test]
    fn test_wait_cancelled_times_out() {
        let token = CancellationToken::new();
        assert!(!token.wait_cancelled(Duration::from_millis(10)));
    }
}

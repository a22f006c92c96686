//! Per-pass log lines and the sinks that receive them.

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Local};
use crossbeam_channel::{Receiver, Sender};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum LogLevel {
    Debug,
    Info,
    Warn,
    Error,
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Debug => "DEBUG",
            Self::Info => "INFO",
            Self::Warn => "WARNING",
            Self::Error => "ERROR",
        })
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct LogLine {
    pub timestamp: DateTime<Local>,
    pub level: LogLevel,
    pub message: String,
}

impl LogLine {
    pub fn new(level: LogLevel, message: impl Into<String>) -> Self {
        Self {
            timestamp: Local::now(),
            level,
            message: message.into(),
        }
    }

    /// `2026-10-16 09:30:00,125 - INFO - message`
    pub fn format_line(&self) -> String {
        format!(
            "{} - {} - {}",
            self.timestamp.format("%Y-%m-%d %H:%M:%S,%3f"),
            self.level,
            self.message
        )
    }
}

/// Receives every line a pass logs, in order, from the worker thread.
pub trait LogSink: Send + Sync {
    fn emit(&self, line: &LogLine);
}

impl<F> LogSink for F
where
    F: Fn(&LogLine) + Send + Sync,
{
    fn emit(&self, line: &LogLine) {
        self(line)
    }
}

/// Forwards lines over a channel, for callers that consume them on another thread.
pub struct ChannelSink {
    sender: Sender<LogLine>,
}

impl ChannelSink {
    pub fn new(sender: Sender<LogLine>) -> Self {
        Self { sender }
    }

    pub fn unbounded() -> (Self, Receiver<LogLine>) {
        let (sender, receiver) = crossbeam_channel::unbounded();
        (Self { sender }, receiver)
    }
}

impl LogSink for ChannelSink {
    fn emit(&self, line: &LogLine) {
        // Ignore errors - a dropped receiver just means nobody is listening
        let _ = self.sender.send(line.clone());
    }
}

/// Fans a pass's log lines out to every attached sink and to `tracing`.
#[derive(Clone, Default)]
pub struct PassLog {
    sinks: Vec<Arc<dyn LogSink>>,
}

impl PassLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn attach(&mut self, sink: Arc<dyn LogSink>) {
        self.sinks.push(sink);
    }

    pub fn log(&self, level: LogLevel, message: impl Into<String>) {
        let line = LogLine::new(level, message);

        match level {
            LogLevel::Debug => tracing::debug!(target: "printbatch::pass", "{}", line.message),
            LogLevel::Info => tracing::info!(target: "printbatch::pass", "{}", line.message),
            LogLevel::Warn => tracing::warn!(target: "printbatch::pass", "{}", line.message),
            LogLevel::Error => tracing::error!(target: "printbatch::pass", "{}", line.message),
        }

        for sink in &self.sinks {
            sink.emit(&line);
        }
    }

    pub fn debug(&self, message: impl Into<String>) {
        self.log(LogLevel::Debug, message);
    }

    pub fn info(&self, message: impl Into<String>) {
        self.log(LogLevel::Info, message);
    }

    pub fn warn(&self, message: impl Into<String>) {
        self.log(LogLevel::Warn, message);
    }

    pub fn error(&self, message: impl Into<String>) {
        self.log(LogLevel::Error, message);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::sync::Mutex;

    #[test]
    fn test_format_line() {
        let line = LogLine {
            timestamp: Local.with_ymd_and_hms(2026, 3, 1, 9, 5, 7).unwrap(),
            level: LogLevel::Warn,
            message: "paper size fallback".to_string(),
        };
        assert_eq!(
            line.format_line(),
            "2026-03-01 09:05:07,000 - WARNING - paper size fallback"
        );
    }

    #[test]
    fn test_closure_sink() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let captured = seen.clone();
        let mut log = PassLog::new();
        log.attach(Arc::new(move |line: &LogLine| {
            captured.lock().unwrap().push(line.message.clone());
        }));

        log.info("one");
        log.error("two");

        assert_eq!(*seen.lock().unwrap(), vec!["one", "two"]);
    }

    #[test]
    fn test_channel_sink_preserves_order_and_level() {
        let (sink, rx) = ChannelSink::unbounded();
        let mut log = PassLog::new();
        log.attach(Arc::new(sink));

        log.debug("a");
        log.warn("b");

        let lines: Vec<LogLine> = rx.try_iter().collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].level, LogLevel::Debug);
        assert_eq!(lines[1].message, "b");
    }

    #[test]
    fn test_channel_sink_without_receiver() {
        let (sink, rx) = ChannelSink::unbounded();
        drop(rx);
        sink.emit(&LogLine::new(LogLevel::Info, "nobody listening"));
    }
}

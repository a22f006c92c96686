use std::fs::{File, OpenOptions};
use std::io::{LineWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use chrono::{DateTime, Local};

use crate::error::StorageError;
use crate::events::sink::{LogLine, LogSink};

/// Persists one pass's log lines to `print_log_<timestamp>.log`.
pub struct PassLogFile {
    path: PathBuf,
    writer: Mutex<LineWriter<File>>,
}

impl PassLogFile {
    pub fn create(directory: &Path, started: DateTime<Local>) -> Result<Self, StorageError> {
        std::fs::create_dir_all(directory).map_err(|e| StorageError::CreateDirectory {
            path: directory.to_path_buf(),
            source: e,
        })?;

        let path = directory.join(file_name_for(started));
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|e| StorageError::OpenLog {
                path: path.clone(),
                source: e,
            })?;

        Ok(Self {
            path,
            writer: Mutex::new(LineWriter::new(file)),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl LogSink for PassLogFile {
    fn emit(&self, line: &LogLine) {
        let Ok(mut writer) = self.writer.lock() else {
            return;
        };
        if let Err(e) = writeln!(writer, "{}", line.format_line()) {
            log::warn!("Failed to write {}: {}", self.path.display(), e);
        }
    }
}

fn file_name_for(started: DateTime<Local>) -> String {
    format!("print_log_{}.log", started.format("%Y-%m-%d_%H-%M-%S"))
}

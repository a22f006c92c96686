use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Settings for one print-and-archive pass.
///
/// Immutable once a pass starts; the pass worker owns its own copy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchConfiguration {
    #[serde(default = "default_version")]
    pub version: String,
    pub source_dir: PathBuf,
    /// Preferred default printer. Empty selects the printer the OS marks as default.
    #[serde(default)]
    pub default_printer_name: String,
    /// Printer for priority documents. Empty falls back to the resolved default printer.
    #[serde(default, alias = "monthly_printer_name")]
    pub priority_printer_name: String,
    /// Paper-size id for regular spreadsheet jobs. Ids outside the built-in
    /// table (the default 132 among them) need an entry in `paper_names`,
    /// otherwise printers that report their sizes fall back to A4.
    #[serde(default = "default_paper_size")]
    pub default_paper_size: u16,
    /// CUPS media names for driver-specific paper-size ids.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub paper_names: BTreeMap<u16, String>,
    #[serde(default = "default_paper_zoom")]
    pub default_paper_zoom: u16,
    #[serde(default = "default_delay_seconds")]
    pub delay_seconds: f64,
    #[serde(default = "default_true")]
    pub enable_wait_prompt: bool,
    #[serde(default = "default_wait_prompt_sleep")]
    pub wait_prompt_sleep: f64,
    #[serde(default)]
    pub pause_mode: PauseMode,
    #[serde(default = "default_checkpoint_pattern")]
    pub checkpoint_pattern: String,
    #[serde(default = "default_true")]
    pub bw_print: bool,
    #[serde(default)]
    pub duplex_print: bool,
    #[serde(default = "default_priority_marker")]
    pub priority_marker: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_directory: Option<PathBuf>,
    #[serde(default = "default_true")]
    pub persist_log: bool,
}

/// What a checkpoint prompt does with the operator's answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PauseMode {
    /// Show the prompt and always continue once it is dismissed or times out.
    NotifyOnly,
    /// Sleep for the pause duration when the operator explicitly chooses to wait.
    #[default]
    WaitIfConfirmed,
}

fn default_version() -> String {
    "1.0".to_string()
}

fn default_paper_size() -> u16 {
    132
}

fn default_paper_zoom() -> u16 {
    75
}

fn default_delay_seconds() -> f64 {
    5.0
}

fn default_wait_prompt_sleep() -> f64 {
    30.0
}

fn default_true() -> bool {
    true
}

fn default_checkpoint_pattern() -> String {
    "^[0-9]+$".to_string()
}

fn default_priority_marker() -> String {
    "月结单".to_string()
}

impl BatchConfiguration {
    /// Creates a configuration with defaults for every field except the source root.
    pub fn new<P: AsRef<Path>>(source_dir: P) -> Self {
        Self {
            version: default_version(),
            source_dir: source_dir.as_ref().to_path_buf(),
            default_printer_name: String::new(),
            priority_printer_name: String::new(),
            default_paper_size: default_paper_size(),
            paper_names: BTreeMap::new(),
            default_paper_zoom: default_paper_zoom(),
            delay_seconds: default_delay_seconds(),
            enable_wait_prompt: true,
            wait_prompt_sleep: default_wait_prompt_sleep(),
            pause_mode: PauseMode::default(),
            checkpoint_pattern: default_checkpoint_pattern(),
            bw_print: true,
            duplex_print: false,
            priority_marker: default_priority_marker(),
            log_directory: None,
            persist_log: true,
        }
    }

    /// Delay applied after every print attempt.
    pub fn delay(&self) -> Duration {
        seconds(self.delay_seconds)
    }

    /// How long a checkpoint prompt (or a confirmed wait) lasts.
    pub fn pause_duration(&self) -> Duration {
        seconds(self.wait_prompt_sleep)
    }

    /// Directory the persisted pass log is written to.
    pub fn resolved_log_directory(&self) -> Option<PathBuf> {
        self.log_directory
            .clone()
            .or_else(|| dirs::data_local_dir().map(|p| p.join("printbatch").join("logs")))
    }

    /// Semantic validation beyond what the JSON schema can express.
    pub fn validate(&self) -> Result<(), crate::error::ConfigError> {
        crate::config::loader::validate_config(self)
    }
}

fn seconds(value: f64) -> Duration {
    if value.is_finite() && value > 0.0 {
        Duration::from_secs_f64(value)
    } else {
        Duration::ZERO
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_uses_documented_defaults() {
        let config = BatchConfiguration::new("/data/outbox");

        assert_eq!(config.source_dir, PathBuf::from("/data/outbox"));
        assert_eq!(config.default_paper_size, 132);
        assert_eq!(config.default_paper_zoom, 75);
        assert_eq!(config.delay(), Duration::from_secs(5));
        assert_eq!(config.pause_duration(), Duration::from_secs(30));
        assert!(config.enable_wait_prompt);
        assert!(config.bw_print);
        assert!(!config.duplex_print);
        assert_eq!(config.pause_mode, PauseMode::WaitIfConfirmed);
        assert_eq!(config.checkpoint_pattern, "^[0-9]+$");
    }

    #[test]
    fn test_negative_delay_is_zero() {
        let mut config = BatchConfiguration::new("/data");
        config.delay_seconds = -3.0;
        assert_eq!(config.delay(), Duration::ZERO);

        config.delay_seconds = f64::NAN;
        assert_eq!(config.delay(), Duration::ZERO);
    }

    #[test]
    fn test_fractional_delay() {
        let mut config = BatchConfiguration::new("/data");
        config.delay_seconds = 0.5;
        assert_eq!(config.delay(), Duration::from_millis(500));
    }

    #[test]
    fn test_pause_mode_serialization() {
        assert_eq!(
            serde_json::to_string(&PauseMode::NotifyOnly).unwrap(),
            "\"notify_only\""
        );
        let mode: PauseMode = serde_json::from_str("\"wait_if_confirmed\"").unwrap();
        assert_eq!(mode, PauseMode::WaitIfConfirmed);
    }

    #[test]
    fn test_monthly_printer_alias() {
        let config: BatchConfiguration = serde_json::from_str(
            r#"{ "source_dir": "/in", "monthly_printer_name": "Statements" }"#,
        )
        .unwrap();
        assert_eq!(config.priority_printer_name, "Statements");
    }

    #[test]
    fn test_explicit_log_directory_wins() {
        let mut config = BatchConfiguration::new("/data");
        config.log_directory = Some(PathBuf::from("/var/log/printbatch"));
        assert_eq!(
            config.resolved_log_directory(),
            Some(PathBuf::from("/var/log/printbatch"))
        );
    }
}

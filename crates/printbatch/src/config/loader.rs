use std::path::{Path, PathBuf};

use crate::config::schema::BatchConfiguration;
use crate::error::ConfigError;
use crate::storage::archive::is_inside_archive_tree;

const SCHEMA_JSON: &str = include_str!("../../schema/batch-config-v1.json");

const PAPER_SIZE_RANGE: std::ops::RangeInclusive<u16> = 1..=500;
const PAPER_ZOOM_RANGE: std::ops::RangeInclusive<u16> = 10..=400;

pub fn load_config<P: AsRef<Path>>(path: P) -> Result<BatchConfiguration, ConfigError> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadFile {
        path: path.to_path_buf(),
        source: e,
    })?;

    load_config_from_str(&content)
}

pub fn load_config_from_str(content: &str) -> Result<BatchConfiguration, ConfigError> {
    let json_value: serde_json::Value = serde_json::from_str(content)?;

    validate_schema(&json_value)?;

    let config: BatchConfiguration = serde_json::from_value(json_value)?;

    validate_config(&config)?;

    Ok(config)
}

/// Writes the configuration as pretty JSON, creating the parent directory if needed.
pub fn save_config<P: AsRef<Path>>(
    path: P,
    config: &BatchConfiguration,
) -> Result<(), ConfigError> {
    let path = path.as_ref();
    let write_err = |e| ConfigError::WriteFile {
        path: path.to_path_buf(),
        source: e,
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(write_err)?;
    }

    let json = serde_json::to_string_pretty(config)?;
    std::fs::write(path, json).map_err(write_err)
}

/// `<config dir>/printbatch/settings.json` for the current user.
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("printbatch").join("settings.json"))
}

fn validate_schema(json_value: &serde_json::Value) -> Result<(), ConfigError> {
    let schema: serde_json::Value =
        serde_json::from_str(SCHEMA_JSON).map_err(|e| ConfigError::Validation {
            message: format!("Invalid embedded schema JSON: {}", e),
        })?;

    let validator = jsonschema::validator_for(&schema).map_err(|e| ConfigError::Validation {
        message: format!("Failed to compile JSON schema: {}", e),
    })?;

    let error_messages: Vec<String> = validator
        .iter_errors(json_value)
        .map(|e| e.to_string())
        .collect();
    if !error_messages.is_empty() {
        return Err(ConfigError::SchemaValidation {
            errors: error_messages.join("; "),
        });
    }

    Ok(())
}

pub(crate) fn validate_config(config: &BatchConfiguration) -> Result<(), ConfigError> {
    if config.version != "1.0" {
        return Err(invalid(format!(
            "Unsupported config version: {}",
            config.version
        )));
    }

    if config.source_dir.as_os_str().is_empty() {
        return Err(invalid("source_dir must not be empty"));
    }

    if !PAPER_SIZE_RANGE.contains(&config.default_paper_size) {
        return Err(invalid(format!(
            "default_paper_size {} is outside {}..={}",
            config.default_paper_size,
            PAPER_SIZE_RANGE.start(),
            PAPER_SIZE_RANGE.end()
        )));
    }

    if let Some(id) = config
        .paper_names
        .keys()
        .find(|id| !PAPER_SIZE_RANGE.contains(id))
    {
        return Err(invalid(format!(
            "paper_names id {} is outside {}..={}",
            id,
            PAPER_SIZE_RANGE.start(),
            PAPER_SIZE_RANGE.end()
        )));
    }

    if !PAPER_ZOOM_RANGE.contains(&config.default_paper_zoom) {
        return Err(invalid(format!(
            "default_paper_zoom {} is outside {}..={}",
            config.default_paper_zoom,
            PAPER_ZOOM_RANGE.start(),
            PAPER_ZOOM_RANGE.end()
        )));
    }

    if !config.delay_seconds.is_finite() || config.delay_seconds < 0.0 {
        return Err(invalid(format!(
            "delay_seconds must be a non-negative number, got {}",
            config.delay_seconds
        )));
    }

    if !config.wait_prompt_sleep.is_finite() || config.wait_prompt_sleep <= 0.0 {
        return Err(invalid(format!(
            "wait_prompt_sleep must be a positive number, got {}",
            config.wait_prompt_sleep
        )));
    }

    if let Err(e) = regex::Regex::new(&config.checkpoint_pattern) {
        return Err(ConfigError::InvalidPattern {
            pattern: config.checkpoint_pattern.clone(),
            reason: e.to_string(),
        });
    }

    if config.priority_marker.is_empty() {
        return Err(invalid("priority_marker must not be empty"));
    }

    if let Some(log_dir) = &config.log_directory {
        if log_dir.starts_with(&config.source_dir)
            || is_inside_archive_tree(&config.source_dir, log_dir)
        {
            return Err(invalid(format!(
                "log_directory '{}' must live outside the source and archive trees",
                log_dir.display()
            )));
        }
    }

    Ok(())
}

fn invalid(message: impl Into<String>) -> ConfigError {
    ConfigError::Validation {
        message: message.into(),
    }
}

//! src/logging.rs
//!
//! Structured JSON-lines logging for the `fsb` binary.
//!
//! Events go to a rolling `<prefix>.<date>.jsonl` file through a
//! non-blocking writer; the returned [`WorkerGuard`] must stay alive for the
//! lifetime of the program or buffered lines are lost. `RUST_LOG` directives
//! are honoured on top of the configured level.

use std::path::{Component, Path, PathBuf};
use std::str::FromStr;

use compact_str::CompactString;
use serde::{Deserialize, Serialize};
use tracing_appender::{
    non_blocking::WorkerGuard,
    rolling::{InitError, RollingFileAppender, Rotation},
};
use tracing_subscriber::{
    EnvFilter, Layer, filter::Directive, layer::SubscriberExt, util::SubscriberInitExt,
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggerConfig {
    pub log_dir: PathBuf,
    pub log_file_prefix: CompactString,
    pub log_level: CompactString,
    pub max_log_files: usize,
    pub rotation: LogRotation,
    /// Mirror warnings and errors to stderr.
    pub stderr: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogRotation {
    Never,
    Hourly,
    Daily,
}

impl From<LogRotation> for Rotation {
    fn from(rotation: LogRotation) -> Self {
        match rotation {
            LogRotation::Never => Self::NEVER,
            LogRotation::Hourly => Self::HOURLY,
            LogRotation::Daily => Self::DAILY,
        }
    }
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self {
            log_dir: PathBuf::from("./logs"),
            log_file_prefix: CompactString::const_new("fsb"),
            log_level: CompactString::const_new("info"),
            max_log_files: 10,
            rotation: LogRotation::Daily,
            stderr: true,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum LoggingError {
    #[error("Logger already initialized")]
    AlreadyInitialized,

    #[error("Invalid log directory: {0}")]
    InvalidLogDirectory(String),

    #[error("Failed to create log directory: {0}")]
    DirectoryCreationFailed(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Failed to create file appender: {0}")]
    Appender(#[from] InitError),
}

#[derive(Debug, Default)]
pub struct LoggerBuilder {
    config: LoggerConfig,
}

impl LoggerBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_config(mut self, config: LoggerConfig) -> Self {
        self.config = config;
        self
    }

    #[must_use]
    pub fn with_level(mut self, level: &str) -> Self {
        self.config.log_level = CompactString::new(level);
        self
    }

    #[must_use]
    pub fn with_log_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.log_dir = dir.into();
        self
    }

    /// Installs the global subscriber.
    pub fn build(self) -> Result<WorkerGuard, LoggingError> {
        let config = self.config;
        validate_config(&config)?;
        std::fs::create_dir_all(&config.log_dir)?;

        let file_appender = RollingFileAppender::builder()
            .rotation(config.rotation.into())
            .filename_prefix(config.log_file_prefix.as_str())
            .filename_suffix("jsonl")
            .max_log_files(config.max_log_files)
            .build(&config.log_dir)?;

        let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

        let json_layer = tracing_subscriber::fmt::layer()
            .json()
            .with_writer(non_blocking)
            .with_file(true)
            .with_line_number(true)
            .with_filter(make_filter(&config.log_level)?);

        let stderr_layer = config.stderr.then(|| {
            tracing_subscriber::fmt::layer()
                .compact()
                .with_writer(std::io::stderr)
                .with_target(false)
                .with_filter(tracing_subscriber::filter::LevelFilter::WARN)
        });

        tracing_subscriber::registry()
            .with(json_layer)
            .with(stderr_layer)
            .try_init()
            .map_err(|_| LoggingError::AlreadyInitialized)?;

        Ok(guard)
    }
}

fn make_filter(level: &str) -> Result<EnvFilter, LoggingError> {
    let directive = Directive::from_str(level)
        .map_err(|e| LoggingError::ConfigError(format!("invalid log level {level:?}: {e}")))?;
    Ok(EnvFilter::from_default_env().add_directive(directive))
}

fn validate_config(config: &LoggerConfig) -> Result<(), LoggingError> {
    if config.log_file_prefix.is_empty() {
        return Err(LoggingError::ConfigError(
            "Log file prefix must not be empty".to_string(),
        ));
    }

    if config.max_log_files == 0 {
        return Err(LoggingError::ConfigError(
            "Max log files must be greater than 0".to_string(),
        ));
    }

    validate_log_directory(&config.log_dir)
}

fn validate_log_directory(path: &Path) -> Result<(), LoggingError> {
    if path.components().count() == 0 {
        return Err(LoggingError::InvalidLogDirectory("Empty path".to_string()));
    }

    if path.components().any(|c| c == Component::ParentDir) {
        return Err(LoggingError::InvalidLogDirectory(
            "Path contains parent directory references".to_string(),
        ));
    }

    Ok(())
}

/// Installs the global subscriber described by `config`.
pub fn init_logging_with_config(config: LoggerConfig) -> Result<WorkerGuard, LoggingError> {
    LoggerBuilder::new().with_config(config).build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn default_config_is_valid() {
        assert!(validate_config(&LoggerConfig::default()).is_ok());
    }

    #[test]
    fn rejects_parent_references_and_empty_dirs() {
        let mut config = LoggerConfig {
            log_dir: PathBuf::from("../escape"),
            ..LoggerConfig::default()
        };
        assert!(matches!(
            validate_config(&config),
            Err(LoggingError::InvalidLogDirectory(_))
        ));

        config.log_dir = PathBuf::new();
        assert!(matches!(
            validate_config(&config),
            Err(LoggingError::InvalidLogDirectory(_))
        ));
    }

    #[test]
    fn rejects_degenerate_settings() {
        let config = LoggerConfig {
            max_log_files: 0,
            ..LoggerConfig::default()
        };
        assert!(matches!(validate_config(&config), Err(LoggingError::ConfigError(_))));
        assert!(make_filter("debug").is_ok());
    }

    #[test]
    fn config_round_trips_through_toml() {
        let config = LoggerConfig {
            rotation: LogRotation::Hourly,
            ..LoggerConfig::default()
        };
        let text = toml::to_string(&config).unwrap();
        assert!(text.contains("rotation = \"hourly\""));
        let back: LoggerConfig = toml::from_str(&text).unwrap();
        assert_eq!(back, config);
    }

    #[test]
    fn invalid_config_is_rejected_before_install() {
        let tmp = TempDir::new().unwrap();
        let config = LoggerConfig {
            log_dir: tmp.path().join("logs"),
            log_file_prefix: CompactString::default(),
            ..LoggerConfig::default()
        };
        assert!(matches!(
            init_logging_with_config(config),
            Err(LoggingError::ConfigError(_))
        ));
        assert!(!tmp.path().join("logs").exists());
    }

    #[test]
    fn build_creates_the_log_directory() {
        let tmp = TempDir::new().unwrap();
        let dir = tmp.path().join("logs");

        let guard = LoggerBuilder::new()
            .with_log_dir(&dir)
            .with_level("debug")
            .build();

        assert!(dir.is_dir());
        // the global subscriber can only be installed once per process
        if let Ok(guard) = guard {
            tracing::info!(marker = "TEST", "logger online");
            drop(guard);
        }
    }
}

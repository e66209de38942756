//! Logging setup for the meshcat binary
//!
//! The filter comes from `MESHCAT_LOG`, falling back to the configured
//! default. Output goes to stderr (stdout carries the URL banner), to a file
//! under the state directory, or to both.

use std::path::PathBuf;
use std::str::FromStr;

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::{paths, MeshcatError, Result};

/// Environment variable holding the log filter
pub const LOG_ENV: &str = "MESHCAT_LOG";

pub const DEFAULT_LOG_FILE: &str = "meshcat.log";

/// Log output destination
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogOutput {
    Stderr,
    File,
    Both,
}

impl LogOutput {
    fn writes_file(self) -> bool {
        matches!(self, LogOutput::File | LogOutput::Both)
    }
}

impl FromStr for LogOutput {
    type Err = MeshcatError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "stderr" => Ok(LogOutput::Stderr),
            "file" => Ok(LogOutput::File),
            "both" => Ok(LogOutput::Both),
            other => Err(MeshcatError::config(format!(
                "unknown log output {:?} (expected stderr, file or both)",
                other
            ))),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogConfig {
    pub output: LogOutput,
    /// Filter directives (e.g. "info", "meshcat_client=debug")
    pub filter: String,
    /// File name inside the log directory
    pub file_name: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            output: LogOutput::Stderr,
            filter: "info".into(),
            file_name: DEFAULT_LOG_FILE.into(),
        }
    }
}

impl LogConfig {
    /// Stderr logging, filter from `MESHCAT_LOG` or `info`
    pub fn cli() -> Self {
        Self::from_env("info")
    }

    /// Stderr logging, filter from `MESHCAT_LOG` or `default_filter`
    pub fn from_env(default_filter: &str) -> Self {
        Self {
            filter: std::env::var(LOG_ENV).unwrap_or_else(|_| default_filter.into()),
            ..Self::default()
        }
    }

    pub fn with_output(mut self, output: LogOutput) -> Self {
        self.output = output;
        self
    }

    pub fn with_file_name(mut self, file_name: impl Into<String>) -> Self {
        self.file_name = file_name.into();
        self
    }

    /// Where file output is written
    pub fn log_file(&self) -> PathBuf {
        paths::log_dir().join(&self.file_name)
    }
}

/// Install the global subscriber
pub fn init_logging_with_config(config: LogConfig) -> Result<()> {
    let filter = EnvFilter::try_new(&config.filter)
        .map_err(|e| MeshcatError::config(format!("Invalid log filter: {}", e)))?;

    let stderr_layer = (config.output != LogOutput::File).then(|| {
        fmt::layer()
            .with_target(true)
            .with_writer(std::io::stderr)
    });

    let file_layer = if config.output.writes_file() {
        let file = open_log_file(&config.log_file())?;
        Some(
            fmt::layer()
                .with_target(true)
                .with_file(true)
                .with_line_number(true)
                .with_ansi(false)
                .with_writer(file),
        )
    } else {
        None
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(stderr_layer)
        .with(file_layer)
        .try_init()
        .map_err(|e| MeshcatError::internal(format!("Failed to init logging: {}", e)))
}

fn open_log_file(log_path: &std::path::Path) -> Result<std::sync::Arc<std::fs::File>> {
    if let Some(dir) = log_path.parent() {
        paths::ensure_dir(dir).map_err(|e| MeshcatError::FileWrite {
            path: dir.to_path_buf(),
            source: e,
        })?;
    }

    std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_path)
        .map(std::sync::Arc::new)
        .map_err(|e| MeshcatError::FileWrite {
            path: log_path.to_path_buf(),
            source: e,
        })
}

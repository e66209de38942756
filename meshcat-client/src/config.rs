//! Client configuration
//!
//! Read from `config.toml` in the meshcat config directory. Every field is
//! optional; a missing file means defaults.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use meshcat_utils::{config_file, LogConfig, LogOutput, MeshcatError, Result};

use crate::server::{ServerCommand, DEFAULT_PATH_ENV, SERVER_ENV};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    pub server: ServerConfig,
    pub session: SessionConfig,
    pub log: LoggingConfig,
}

/// How spawned servers are launched
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub program: String,
    pub args: Vec<String>,
    pub path_env: String,
    pub path_entries: Vec<PathBuf>,
    /// 0 waits forever
    pub handshake_timeout_ms: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        let command = ServerCommand::default();
        Self {
            program: command.program,
            args: command.args,
            path_env: DEFAULT_PATH_ENV.into(),
            path_entries: Vec::new(),
            handshake_timeout_ms: 0,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Default per-request timeout, 0 blocks until the reply arrives
    pub request_timeout_ms: u64,
}

/// Where the binary logs; `MESHCAT_LOG` still overrides `filter`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// `stderr`, `file` or `both`
    pub output: String,
    pub filter: String,
    /// File name inside the log directory
    pub file: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            output: "stderr".into(),
            filter: "info".into(),
            file: None,
        }
    }
}

fn millis(ms: u64) -> Option<Duration> {
    (ms > 0).then(|| Duration::from_millis(ms))
}

impl ClientConfig {
    /// Server command described by `[server]`
    pub fn server_command(&self) -> ServerCommand {
        ServerCommand {
            program: self.server.program.clone(),
            args: self.server.args.clone(),
            path_env: self.server.path_env.clone(),
            path_entries: self.server.path_entries.clone(),
            handshake_timeout: millis(self.server.handshake_timeout_ms),
            ..ServerCommand::default()
        }
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        millis(self.session.request_timeout_ms)
    }

    /// Logging setup described by `[log]`
    pub fn log_config(&self) -> Result<LogConfig> {
        let output: LogOutput = self.log.output.parse()?;
        let mut log = LogConfig::from_env(&self.log.filter).with_output(output);
        if let Some(file) = &self.log.file {
            log = log.with_file_name(file.clone());
        }
        Ok(log)
    }
}

/// Configuration loader
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load from the default location, then apply environment overrides
    pub fn load() -> Result<ClientConfig> {
        let path = config_file();
        let config = if path.exists() {
            Self::load_from_path(&path)?
        } else {
            ClientConfig::default()
        };

        Ok(Self::apply_server_override(
            config,
            std::env::var(SERVER_ENV).ok(),
        ))
    }

    pub fn load_from_path(path: &Path) -> Result<ClientConfig> {
        let content = std::fs::read_to_string(path).map_err(|e| MeshcatError::FileRead {
            path: path.to_path_buf(),
            source: e,
        })?;

        Self::parse(&content, path)
    }

    pub fn parse(content: &str, path: &Path) -> Result<ClientConfig> {
        toml::from_str(content).map_err(|e| MeshcatError::ConfigInvalid {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    /// Replace `server.program` with a non-empty override
    pub fn apply_server_override(mut config: ClientConfig, program: Option<String>) -> ClientConfig {
        if let Some(program) = program.filter(|p| !p.trim().is_empty()) {
            config.server.program = program;
        }
        config
    }

    pub fn validate(config: &ClientConfig) -> Result<()> {
        if config.server.program.trim().is_empty() {
            return Err(MeshcatError::config("server.program must not be empty"));
        }

        if config.server.path_env.is_empty() || config.server.path_env.contains('=') {
            return Err(MeshcatError::config(
                "server.path_env must be a non-empty variable name without '='",
            ));
        }

        config.log.output.parse::<LogOutput>()?;
        if matches!(&config.log.file, Some(file) if file.is_empty() || file.contains('/')) {
            return Err(MeshcatError::config(
                "log.file must be a plain file name",
            ));
        }

        Ok(())
    }

    pub fn load_and_validate() -> Result<ClientConfig> {
        let config = Self::load()?;
        Self::validate(&config)?;
        Ok(config)
    }
}

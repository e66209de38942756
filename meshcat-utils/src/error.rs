//! Error types for meshcat
//!
//! Provides a unified error type used across all meshcat crates.

use std::path::PathBuf;

/// Main error type for meshcat operations
#[derive(Debug, thiserror::Error)]
pub enum MeshcatError {
    // === IO Errors ===

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to read file {path}: {source}")]
    FileRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to write file {path}: {source}")]
    FileWrite {
        path: PathBuf,
        source: std::io::Error,
    },

    // === Handshake Errors ===

    #[error("Server handshake failed: expected a line matching {expected}, got {line:?}")]
    Handshake { expected: String, line: String },

    #[error("Server handshake timed out after {millis}ms")]
    HandshakeTimeout { millis: u64 },

    // === Transport Errors ===

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Session is not connected to {endpoint}")]
    NotConnected { endpoint: String },

    #[error("No reply within {millis}ms")]
    RequestTimeout { millis: u64 },

    #[error("Session closed")]
    SessionClosed,

    // === Protocol Errors ===

    #[error("Protocol error: {0}")]
    Protocol(String),

    #[error("Invalid reply: {0}")]
    InvalidReply(String),

    // === Process Errors ===

    #[error("Failed to spawn process: {0}")]
    ProcessSpawn(String),

    // === Configuration Errors ===

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid configuration at {path}: {message}")]
    ConfigInvalid { path: PathBuf, message: String },

    // === Internal Errors ===

    #[error("Internal error: {0}")]
    Internal(String),
}

impl MeshcatError {
    /// Create a transport error
    pub fn transport(msg: impl Into<String>) -> Self {
        Self::Transport(msg.into())
    }

    /// Create a protocol error
    pub fn protocol(msg: impl Into<String>) -> Self {
        Self::Protocol(msg.into())
    }

    /// Create a config error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create an internal error
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Check if this error came from the socket layer
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            Self::Transport(_)
                | Self::NotConnected { .. }
                | Self::RequestTimeout { .. }
                | Self::SessionClosed
        )
    }

    /// Check if this error came from the server startup banner
    pub fn is_handshake(&self) -> bool {
        matches!(self, Self::Handshake { .. } | Self::HandshakeTimeout { .. })
    }
}

/// Result type alias using MeshcatError
pub type Result<T> = std::result::Result<T, MeshcatError>;

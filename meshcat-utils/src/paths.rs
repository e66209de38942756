//! Path utilities for meshcat
//!
//! Handles XDG Base Directory specification compliance for config and
//! state directories.

use std::path::{Path, PathBuf};

use directories::ProjectDirs;

/// Application identifier for XDG directories
const APP_NAME: &str = "meshcat";

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("", "", APP_NAME)
}

/// Get the configuration directory
///
/// Location: `$XDG_CONFIG_HOME/meshcat` or `~/.config/meshcat`
pub fn config_dir() -> PathBuf {
    project_dirs()
        .map(|p| p.config_dir().to_path_buf())
        .unwrap_or_else(fallback_config_dir)
}

/// Get the main configuration file path
///
/// Location: `$XDG_CONFIG_HOME/meshcat/config.toml`
pub fn config_file() -> PathBuf {
    config_dir().join("config.toml")
}

/// Get the state directory
///
/// Location: `$XDG_STATE_HOME/meshcat` or `~/.local/state/meshcat`
pub fn state_dir() -> PathBuf {
    project_dirs()
        .and_then(|p| p.state_dir().map(|d| d.to_path_buf()))
        .unwrap_or_else(fallback_state_dir)
}

/// Get the log directory
///
/// Location: `$XDG_STATE_HOME/meshcat/log`
pub fn log_dir() -> PathBuf {
    state_dir().join("log")
}

/// Ensure a directory exists, creating it if necessary
pub fn ensure_dir(path: &Path) -> std::io::Result<()> {
    if !path.exists() {
        std::fs::create_dir_all(path)?;
    }
    Ok(())
}

// Fallback implementations when ProjectDirs is unavailable

fn home_dir() -> PathBuf {
    std::env::var("HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("/tmp"))
}

fn fallback_config_dir() -> PathBuf {
    home_dir().join(".config").join(APP_NAME)
}

fn fallback_state_dir() -> PathBuf {
    home_dir().join(".local").join("state").join(APP_NAME)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_dir() {
        let path = config_dir();
        assert!(path.to_string_lossy().contains("meshcat"));
    }

    #[test]
    fn test_config_file_is_toml() {
        let path = config_file();
        assert!(path.to_string_lossy().ends_with("config.toml"));
    }

    #[test]
    fn test_log_dir_under_state_dir() {
        assert!(log_dir().starts_with(state_dir()));
    }

    #[test]
    fn test_ensure_dir_creates_nested() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("a").join("b");
        ensure_dir(&nested).unwrap();
        assert!(nested.is_dir());
        // Second call is a no-op
        ensure_dir(&nested).unwrap();
    }
}

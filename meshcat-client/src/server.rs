//! Spawning and tearing down a local meshcat server
//!
//! The server is started as a child process with its stdout piped so the
//! startup banner can be read. The returned [`ServerProcess`] owns the child
//! and kills it when terminated or dropped.

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::{Child, ChildStdout, Command};
use tracing::{debug, info, warn};

use meshcat_utils::{MeshcatError, Result};

use crate::handshake::{read_banner, ServerUrls};

/// Environment variable overriding the server program
pub const SERVER_ENV: &str = "MESHCAT_SERVER";

/// Path-list variable set on the server so it can import the client's package
pub const DEFAULT_PATH_ENV: &str = "PYTHONPATH";

const DEFAULT_PROGRAM: &str = "python3";
const DEFAULT_ARGS: [&str; 3] = ["-u", "-m", "meshcat.servers.zmqserver"];

/// How to launch the server
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerCommand {
    /// Program name (looked up in PATH) or path
    pub program: String,
    /// Arguments that select the server entry point
    pub args: Vec<String>,
    /// Arguments forwarded verbatim after `args`
    pub extra_args: Vec<String>,
    /// Endpoint the server should bind instead of picking one
    pub zmq_url: Option<String>,
    /// Name of the path-list variable to extend
    pub path_env: String,
    /// Entries prepended to `path_env`
    pub path_entries: Vec<PathBuf>,
    /// Give up on the banner after this long (None waits forever)
    pub handshake_timeout: Option<Duration>,
}

impl Default for ServerCommand {
    fn default() -> Self {
        Self {
            program: DEFAULT_PROGRAM.into(),
            args: DEFAULT_ARGS.iter().map(|s| s.to_string()).collect(),
            extra_args: Vec::new(),
            zmq_url: None,
            path_env: DEFAULT_PATH_ENV.into(),
            path_entries: Vec::new(),
            handshake_timeout: None,
        }
    }
}

impl ServerCommand {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
            ..Default::default()
        }
    }

    pub fn with_zmq_url(mut self, zmq_url: Option<String>) -> Self {
        self.zmq_url = zmq_url;
        self
    }

    pub fn with_extra_args(mut self, extra_args: Vec<String>) -> Self {
        self.extra_args = extra_args;
        self
    }

    pub fn with_handshake_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.handshake_timeout = timeout;
        self
    }

    /// Full argument list: entry point, forwarded args, endpoint override
    pub fn argv(&self) -> Vec<String> {
        let mut argv = self.args.clone();
        argv.extend(self.extra_args.iter().cloned());
        if let Some(zmq_url) = &self.zmq_url {
            argv.push("--zmq-url".into());
            argv.push(zmq_url.clone());
        }
        argv
    }

    /// Value for `path_env`: configured entries ahead of the inherited value
    fn path_env_value(&self) -> Result<Option<OsString>> {
        if self.path_entries.is_empty() {
            return Ok(None);
        }

        let mut entries = self.path_entries.clone();
        if let Some(existing) = std::env::var_os(&self.path_env) {
            entries.extend(std::env::split_paths(&existing));
        }
        std::env::join_paths(entries)
            .map(Some)
            .map_err(|e| MeshcatError::config(format!("Invalid {} entry: {}", self.path_env, e)))
    }
}

/// Locate the server program
///
/// Paths are used as-is; bare names are searched in PATH.
pub fn find_program(program: &str) -> Result<PathBuf> {
    let candidate = Path::new(program);
    if candidate.components().count() > 1 {
        if candidate.is_file() {
            return Ok(candidate.to_path_buf());
        }
        return Err(MeshcatError::ProcessSpawn(format!(
            "{} does not exist or is not a file",
            candidate.display()
        )));
    }

    which::which(program).map_err(|e| {
        MeshcatError::ProcessSpawn(format!(
            "{} not found in PATH ({}). Set {} or [server].program in the config file.",
            program, e, SERVER_ENV
        ))
    })
}

/// A spawned server child process
#[derive(Debug)]
pub struct ServerProcess {
    child: Option<Child>,
    pid: Option<u32>,
}

impl ServerProcess {
    /// Start the server and read its banner.
    ///
    /// On a bad banner the child is killed and reaped before the error is
    /// returned.
    pub async fn spawn(command: &ServerCommand) -> Result<(Self, ServerUrls)> {
        let program = find_program(&command.program)?;
        let argv = command.argv();

        info!("Starting meshcat server: {:?} {:?}", program, argv);

        let mut cmd = Command::new(&program);
        cmd.args(&argv)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .kill_on_drop(true);

        if let Some(value) = command.path_env_value()? {
            cmd.env(&command.path_env, value);
        }

        set_parent_death_signal(&mut cmd);

        let mut child = cmd.spawn().map_err(|e| {
            MeshcatError::ProcessSpawn(format!("Failed to start {}: {}", program.display(), e))
        })?;
        let pid = child.id();

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| MeshcatError::internal("server stdout was not captured"))?;

        let mut process = Self {
            child: Some(child),
            pid,
        };

        let mut reader = BufReader::new(stdout);
        let banner = match command.handshake_timeout {
            Some(after) => match tokio::time::timeout(after, read_banner(&mut reader)).await {
                Ok(result) => result,
                Err(_) => Err(MeshcatError::HandshakeTimeout {
                    millis: after.as_millis() as u64,
                }),
            },
            None => read_banner(&mut reader).await,
        };

        let urls = match banner {
            Ok(urls) => urls,
            Err(e) => {
                warn!("Server handshake failed: {}", e);
                process.terminate().await;
                return Err(e);
            }
        };

        debug!(zmq_url = %urls.zmq_url, web_url = %urls.web_url, "Server banner received");
        drain_stdout(reader);

        Ok((process, urls))
    }

    /// OS process id, while the child has not been reaped
    pub fn id(&self) -> Option<u32> {
        self.child.as_ref().and(self.pid)
    }

    pub fn is_running(&self) -> bool {
        self.child.is_some()
    }

    /// Kill and reap the child. Safe to call more than once.
    pub async fn terminate(&mut self) {
        let Some(mut child) = self.child.take() else {
            return;
        };

        match child.kill().await {
            Ok(()) => info!(pid = ?self.pid, "Meshcat server terminated"),
            Err(e) => warn!(pid = ?self.pid, "Failed to kill meshcat server: {}", e),
        }
    }
}

impl Drop for ServerProcess {
    fn drop(&mut self) {
        if let Some(child) = self.child.as_mut() {
            debug!(pid = ?self.pid, "Killing meshcat server on drop");
            let _ = child.start_kill();
        }
    }
}

/// Keep reading server output so the pipe never fills up
fn drain_stdout(reader: BufReader<ChildStdout>) {
    tokio::spawn(async move {
        let mut lines = reader.lines();
        while let Ok(Some(line)) = lines.next_line().await {
            debug!(target: "meshcat_client::server::stdout", "{}", line);
        }
    });
}

/// Have the kernel kill the server if this process dies without cleanup.
///
/// PR_SET_PDEATHSIG fires when the spawning thread exits, so spawn from a
/// runtime worker that lives as long as the window.
#[cfg(target_os = "linux")]
fn set_parent_death_signal(cmd: &mut Command) {
    // SAFETY: prctl is async-signal-safe and touches no parent state
    unsafe {
        cmd.pre_exec(|| {
            if libc::prctl(libc::PR_SET_PDEATHSIG, libc::SIGKILL) == -1 {
                return Err(std::io::Error::last_os_error());
            }
            Ok(())
        });
    }
}

#[cfg(not(target_os = "linux"))]
fn set_parent_death_signal(_cmd: &mut Command) {}

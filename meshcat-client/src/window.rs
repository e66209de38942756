//! One connection to a meshcat server
//!
//! A [`Window`] either spawns its own server and reads the endpoints from the
//! startup banner, or attaches to a server that is already running and asks
//! it for the viewer URL. Every operation is a single request/reply exchange
//! on the window's [`Session`].

use std::fmt;
use std::time::Duration;

use bytes::Bytes;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use meshcat_protocol::{command_frames, decode_text_reply, CodecError, Command, Request};
use meshcat_utils::{MeshcatError, Result};

use crate::context::TransportContext;
use crate::server::{ServerCommand, ServerProcess};
use crate::session::{CloseHandle, Session, SessionState};

/// How the window reached its server
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowMode {
    /// The window started the server and owns the process
    Spawned,
    /// The server was already running
    Attached,
}

impl fmt::Display for WindowMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WindowMode::Spawned => write!(f, "spawned"),
            WindowMode::Attached => write!(f, "attached"),
        }
    }
}

/// Options for [`Window::open_with`]
#[derive(Debug, Clone)]
pub struct WindowOptions {
    /// Server endpoint; with `start_server` it is passed as `--zmq-url`
    pub zmq_url: Option<String>,
    /// Spawn a server instead of attaching
    pub start_server: bool,
    pub server: ServerCommand,
}

impl WindowOptions {
    /// Attach when an endpoint is given, spawn otherwise
    pub fn from_endpoint(zmq_url: Option<String>) -> Self {
        Self {
            start_server: zmq_url.is_none(),
            zmq_url,
            server: ServerCommand::default(),
        }
    }

    pub fn spawn() -> Self {
        Self::from_endpoint(None)
    }

    pub fn attach(zmq_url: impl Into<String>) -> Self {
        Self::from_endpoint(Some(zmq_url.into()))
    }

    pub fn with_server(mut self, server: ServerCommand) -> Self {
        self.server = server;
        self
    }
}

impl Default for WindowOptions {
    fn default() -> Self {
        Self::spawn()
    }
}

/// Connection to one meshcat server
pub struct Window {
    session: Mutex<Session>,
    closer: CloseHandle,
    server: Mutex<Option<ServerProcess>>,
    endpoint: String,
    web_url: String,
    mode: WindowMode,
    server_pid: Option<u32>,
}

impl Window {
    /// Start a server and connect to the endpoint from its banner
    pub async fn spawn(context: &TransportContext, command: ServerCommand) -> Result<Self> {
        let (mut process, urls) = ServerProcess::spawn(&command).await?;

        let mut session = Session::new(context, urls.zmq_url.clone());
        if let Err(e) = session.connect().await {
            process.terminate().await;
            return Err(e);
        }

        info!(zmq_url = %urls.zmq_url, web_url = %urls.web_url, "Spawned meshcat server");

        Ok(Self {
            closer: session.close_handle(),
            session: Mutex::new(session),
            server_pid: process.id(),
            server: Mutex::new(Some(process)),
            endpoint: urls.zmq_url,
            web_url: urls.web_url,
            mode: WindowMode::Spawned,
        })
    }

    /// Connect to a running server and ask it for the viewer URL
    pub async fn attach(context: &TransportContext, endpoint: impl Into<String>) -> Result<Self> {
        let endpoint = endpoint.into();
        let mut session = Session::new(context, endpoint.clone());
        session.connect().await?;

        let reply = session
            .request_reply(Request::Url.to_frames().map_err(codec_error)?, None)
            .await?;
        let web_url = text_reply(&reply)?;

        reconnect_after_url_discovery(&mut session).await?;

        info!(zmq_url = %endpoint, web_url = %web_url, "Attached to meshcat server");

        Ok(Self {
            closer: session.close_handle(),
            session: Mutex::new(session),
            server: Mutex::new(None),
            endpoint,
            web_url,
            mode: WindowMode::Attached,
            server_pid: None,
        })
    }

    pub async fn open_with(context: &TransportContext, options: WindowOptions) -> Result<Self> {
        if options.start_server {
            let command = options.server.with_zmq_url(options.zmq_url);
            return Self::spawn(context, command).await;
        }

        match options.zmq_url {
            Some(endpoint) => Self::attach(context, endpoint).await,
            None => Err(MeshcatError::config(
                "a server endpoint is required when not starting a server",
            )),
        }
    }

    /// Public URL of the viewer
    pub fn url(&self) -> &str {
        &self.web_url
    }

    /// Endpoint of the request/reply socket
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn mode(&self) -> WindowMode {
        self.mode
    }

    /// Process id of the owned server, if this window spawned one
    pub fn server_pid(&self) -> Option<u32> {
        self.server_pid
    }

    /// Open the viewer URL in the default browser. Failures are only logged.
    pub fn open(&self) {
        match open::that_detached(&self.web_url) {
            Ok(()) => debug!(url = %self.web_url, "Opened viewer in browser"),
            Err(e) => warn!(url = %self.web_url, "Failed to open browser: {}", e),
        }
    }

    /// Block until a browser is connected to the server
    pub async fn wait(&self) -> Result<String> {
        self.wait_timeout(None).await
    }

    pub async fn wait_timeout(&self, timeout: Option<Duration>) -> Result<String> {
        let reply = self.request(&Request::Wait, timeout).await?;
        text_reply(&reply)
    }

    /// Send a command; the acknowledgement is discarded
    pub async fn send(&self, command: &Command) -> Result<()> {
        self.send_timeout(command, None).await
    }

    pub async fn send_timeout(&self, command: &Command, timeout: Option<Duration>) -> Result<()> {
        let frames = command_frames(command).map_err(codec_error)?;
        debug!(kind = %command.kind(), path = %command.target_path(), "Sending command");
        self.exchange(frames, timeout).await?;
        Ok(())
    }

    /// Standalone HTML document of the current scene
    pub async fn get_scene(&self) -> Result<String> {
        self.get_scene_timeout(None).await
    }

    pub async fn get_scene_timeout(&self, timeout: Option<Duration>) -> Result<String> {
        let reply = self.request(&Request::GetScene, timeout).await?;
        text_reply(&reply)
    }

    /// Close the session and stop the owned server.
    ///
    /// A request blocked on this window fails with
    /// [`MeshcatError::SessionClosed`]. Calling this again does nothing.
    pub async fn close(&self) {
        // Signal first: a pending request holds the session lock
        self.closer.close();
        self.session.lock().await.close();

        if let Some(mut process) = self.server.lock().await.take() {
            process.terminate().await;
        }
    }

    pub fn is_closed(&self) -> bool {
        self.closer.is_closed()
    }

    async fn request(&self, request: &Request, timeout: Option<Duration>) -> Result<Vec<Bytes>> {
        let frames = request.to_frames().map_err(codec_error)?;
        debug!(request = request.label(), "Sending request");
        self.exchange(frames, timeout).await
    }

    async fn exchange(&self, frames: Vec<Bytes>, timeout: Option<Duration>) -> Result<Vec<Bytes>> {
        let mut session = self.session.lock().await;

        // A lost reply leaves the session without a socket
        if session.state() == SessionState::Disconnected {
            debug!(endpoint = %self.endpoint, "Reconnecting session");
            session.connect().await?;
        }

        session.request_reply(frames, timeout).await
    }
}

impl fmt::Display for Window {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "<Window {} zmq_url={} web_url={}>",
            self.mode, self.endpoint, self.web_url
        )
    }
}

impl fmt::Debug for Window {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Window")
            .field("endpoint", &self.endpoint)
            .field("web_url", &self.web_url)
            .field("mode", &self.mode)
            .field("server_pid", &self.server_pid)
            .finish()
    }
}

/// Servers stop delivering commands to the browser when `url` is requested
/// before the viewer's websocket is up, until the client reconnects. Replace
/// the socket once after discovery.
async fn reconnect_after_url_discovery(session: &mut Session) -> Result<()> {
    debug!(endpoint = %session.endpoint(), "Reconnecting after URL discovery");
    session.connect().await
}

fn codec_error(e: CodecError) -> MeshcatError {
    MeshcatError::protocol(e.to_string())
}

fn text_reply(frames: &[Bytes]) -> Result<String> {
    decode_text_reply(frames).map_err(|e| MeshcatError::InvalidReply(e.to_string()))
}

//! Request/reply session over one ZeroMQ REQ socket
//!
//! A session has at most one request in flight: [`Session::request_reply`]
//! takes `&mut self` and only returns once the single reply has arrived or
//! the exchange failed. A failed exchange leaves the REQ socket waiting for a
//! reply that will never come, so the socket is dropped and the session
//! stays disconnected until [`Session::connect`] is called again.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use tokio::sync::watch;
use tracing::{debug, info, warn};
use zeromq::{ReqSocket, Socket, SocketRecv, SocketSend, ZmqMessage};

use meshcat_utils::{MeshcatError, Result};

use crate::context::TransportContext;

/// Session state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Disconnected,
    Connected,
    Closed,
}

/// Clonable handle that closes a session from outside its owner.
///
/// Closing wakes any request blocked on the session, which then fails with
/// [`MeshcatError::SessionClosed`].
#[derive(Debug, Clone)]
pub struct CloseHandle {
    tx: Arc<watch::Sender<bool>>,
}

impl CloseHandle {
    pub fn close(&self) {
        self.tx.send_replace(true);
    }

    pub fn is_closed(&self) -> bool {
        *self.tx.borrow()
    }
}

/// Outcome of racing an exchange against timeout and cancellation
enum Outcome<T> {
    Done(T),
    TimedOut(Duration),
    Cancelled,
}

/// Request/reply session to one endpoint
pub struct Session {
    endpoint: String,
    context: TransportContext,
    socket: Option<ReqSocket>,
    state: SessionState,
    close_tx: Arc<watch::Sender<bool>>,
    closing: watch::Receiver<bool>,
}

impl Session {
    /// Create a session (not yet connected)
    pub fn new(context: &TransportContext, endpoint: impl Into<String>) -> Self {
        let (close_tx, closing) = watch::channel(false);
        Self {
            endpoint: endpoint.into(),
            context: context.clone(),
            socket: None,
            state: SessionState::Disconnected,
            close_tx: Arc::new(close_tx),
            closing,
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn close_handle(&self) -> CloseHandle {
        CloseHandle {
            tx: Arc::clone(&self.close_tx),
        }
    }

    /// Open a fresh socket to the endpoint, replacing any existing one
    pub async fn connect(&mut self) -> Result<()> {
        self.ensure_open()?;

        if self.socket.take().is_some() {
            debug!(endpoint = %self.endpoint, "Dropping previous socket before reconnect");
        }
        self.state = SessionState::Disconnected;

        let mut socket = ReqSocket::new();
        let endpoint = self.endpoint.clone();
        let timeout = self.context.request_timeout();

        match race(socket.connect(&endpoint), timeout, self.cancellation()).await {
            Outcome::Done(Ok(())) => {}
            Outcome::Done(Err(e)) => {
                return Err(MeshcatError::transport(format!(
                    "failed to connect to {}: {}",
                    endpoint, e
                )));
            }
            Outcome::TimedOut(after) => {
                return Err(MeshcatError::RequestTimeout {
                    millis: after.as_millis() as u64,
                });
            }
            Outcome::Cancelled => {
                self.state = SessionState::Closed;
                return Err(MeshcatError::SessionClosed);
            }
        }

        self.socket = Some(socket);
        self.state = SessionState::Connected;
        info!(endpoint = %self.endpoint, "Connected to meshcat server");
        Ok(())
    }

    /// Send one multipart request and wait for its reply.
    ///
    /// `timeout` overrides the context default; with neither set the call
    /// waits for as long as the peer takes.
    pub async fn request_reply(
        &mut self,
        frames: Vec<Bytes>,
        timeout: Option<Duration>,
    ) -> Result<Vec<Bytes>> {
        self.ensure_open()?;

        let message = to_message(frames)?;
        let timeout = timeout.or_else(|| self.context.request_timeout());

        let Some(mut socket) = self.socket.take() else {
            return Err(MeshcatError::NotConnected {
                endpoint: self.endpoint.clone(),
            });
        };
        // Stays disconnected if the caller drops this future mid-exchange
        self.state = SessionState::Disconnected;

        let exchange = async {
            socket.send(message).await?;
            socket.recv().await
        };

        match race(exchange, timeout, self.cancellation()).await {
            Outcome::Done(Ok(reply)) => {
                self.socket = Some(socket);
                self.state = SessionState::Connected;
                Ok(reply.iter().cloned().collect())
            }
            Outcome::Done(Err(e)) => {
                warn!(endpoint = %self.endpoint, "Request failed: {}", e);
                Err(MeshcatError::transport(format!(
                    "request to {} failed: {}",
                    self.endpoint, e
                )))
            }
            Outcome::TimedOut(after) => {
                warn!(endpoint = %self.endpoint, "No reply after {:?}, dropping socket", after);
                Err(MeshcatError::RequestTimeout {
                    millis: after.as_millis() as u64,
                })
            }
            Outcome::Cancelled => {
                self.state = SessionState::Closed;
                Err(MeshcatError::SessionClosed)
            }
        }
    }

    /// Drop the socket; later calls fail with [`MeshcatError::SessionClosed`]
    pub fn close(&mut self) {
        self.close_tx.send_replace(true);
        if self.socket.take().is_some() {
            debug!(endpoint = %self.endpoint, "Session socket closed");
        }
        self.state = SessionState::Closed;
    }

    fn cancellation(&self) -> (watch::Receiver<bool>, watch::Receiver<bool>) {
        (self.closing.clone(), self.context.subscribe())
    }

    fn ensure_open(&mut self) -> Result<()> {
        if self.state == SessionState::Closed
            || *self.closing.borrow()
            || self.context.is_terminated()
        {
            self.socket = None;
            self.state = SessionState::Closed;
            return Err(MeshcatError::SessionClosed);
        }
        Ok(())
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("endpoint", &self.endpoint)
            .field("state", &self.state)
            .finish()
    }
}

/// Run `fut` until it completes, the timeout elapses, or either
/// cancellation flag is set.
async fn race<F: Future>(
    fut: F,
    timeout: Option<Duration>,
    (mut closing, mut shutdown): (watch::Receiver<bool>, watch::Receiver<bool>),
) -> Outcome<F::Output> {
    let bounded = async {
        match timeout {
            Some(after) => match tokio::time::timeout(after, fut).await {
                Ok(output) => Outcome::Done(output),
                Err(_) => Outcome::TimedOut(after),
            },
            None => Outcome::Done(fut.await),
        }
    };

    tokio::select! {
        outcome = bounded => outcome,
        _ = signalled(&mut closing) => Outcome::Cancelled,
        _ = signalled(&mut shutdown) => Outcome::Cancelled,
    }
}

/// Resolves once the flag is set (or its sender is gone)
async fn signalled(rx: &mut watch::Receiver<bool>) {
    let _ = rx.wait_for(|set| *set).await;
}

fn to_message(frames: Vec<Bytes>) -> Result<ZmqMessage> {
    let mut frames = frames.into_iter();
    let first = frames
        .next()
        .ok_or_else(|| MeshcatError::protocol("refusing to send an empty request"))?;

    let mut message = ZmqMessage::from(first);
    for frame in frames {
        message.push_back(frame);
    }
    Ok(message)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{MockPeer, Responder};

    #[tokio::test]
    async fn test_new_session_is_disconnected() {
        let ctx = TransportContext::new();
        let session = Session::new(&ctx, "tcp://127.0.0.1:1");
        assert_eq!(session.state(), SessionState::Disconnected);
        assert_eq!(session.endpoint(), "tcp://127.0.0.1:1");
    }

    #[tokio::test]
    async fn test_request_without_connect_fails() {
        let ctx = TransportContext::new();
        let mut session = Session::new(&ctx, "tcp://127.0.0.1:1");

        let err = session
            .request_reply(vec![Bytes::from_static(b"url")], None)
            .await
            .unwrap_err();
        assert!(matches!(err, MeshcatError::NotConnected { .. }));
        assert!(err.is_transport());
    }

    #[tokio::test]
    async fn test_empty_request_rejected() {
        let ctx = TransportContext::new();
        let mut session = Session::new(&ctx, "tcp://127.0.0.1:1");
        let err = session.request_reply(Vec::new(), None).await.unwrap_err();
        assert!(matches!(err, MeshcatError::Protocol(_)));
    }

    #[tokio::test]
    async fn test_request_reply_roundtrip() {
        let peer = MockPeer::start(Responder::Default).await;
        let ctx = TransportContext::new();
        let mut session = Session::new(&ctx, peer.endpoint());
        session.connect().await.unwrap();
        assert_eq!(session.state(), SessionState::Connected);

        let reply = session
            .request_reply(vec![Bytes::from_static(b"wait")], None)
            .await
            .unwrap();
        assert_eq!(reply, vec![Bytes::from_static(b"ok")]);

        // Strictly alternating: a second exchange on the same socket works
        let reply = session
            .request_reply(vec![Bytes::from_static(b"url")], None)
            .await
            .unwrap();
        assert_eq!(reply.len(), 1);
        assert_eq!(peer.requests().len(), 2);
    }

    #[tokio::test]
    async fn test_multipart_frames_arrive_in_order() {
        let peer = MockPeer::start(Responder::Default).await;
        let ctx = TransportContext::new();
        let mut session = Session::new(&ctx, peer.endpoint());
        session.connect().await.unwrap();

        let frames = vec![
            Bytes::from_static(b"delete"),
            Bytes::from_static(b"meshcat/box"),
            Bytes::from_static(b"\x80"),
        ];
        session.request_reply(frames.clone(), None).await.unwrap();

        assert_eq!(peer.requests(), vec![frames]);
    }

    #[tokio::test]
    async fn test_timeout_drops_socket() {
        let peer = MockPeer::start(Responder::Silent).await;
        let ctx = TransportContext::new();
        let mut session = Session::new(&ctx, peer.endpoint());
        session.connect().await.unwrap();

        let err = session
            .request_reply(
                vec![Bytes::from_static(b"wait")],
                Some(Duration::from_millis(100)),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, MeshcatError::RequestTimeout { millis: 100 }));
        assert_eq!(session.state(), SessionState::Disconnected);

        // The REQ socket is gone until an explicit reconnect
        let err = session
            .request_reply(vec![Bytes::from_static(b"wait")], None)
            .await
            .unwrap_err();
        assert!(matches!(err, MeshcatError::NotConnected { .. }));
    }

    #[tokio::test]
    async fn test_dropped_request_leaves_session_disconnected() {
        let peer = MockPeer::start(Responder::Delayed(Duration::from_millis(300))).await;
        let ctx = TransportContext::new();
        let mut session = Session::new(&ctx, peer.endpoint());
        session.connect().await.unwrap();

        // Caller-side timeout drops the request future mid-exchange
        let dropped = tokio::time::timeout(
            Duration::from_millis(50),
            session.request_reply(vec![Bytes::from_static(b"wait")], None),
        )
        .await;
        assert!(dropped.is_err());
        assert_eq!(session.state(), SessionState::Disconnected);

        session.connect().await.unwrap();
        let reply = session
            .request_reply(vec![Bytes::from_static(b"wait")], None)
            .await
            .unwrap();
        assert_eq!(reply, vec![Bytes::from_static(b"ok")]);
        assert_eq!(session.state(), SessionState::Connected);
    }

    #[tokio::test]
    async fn test_context_timeout_applies_by_default() {
        let peer = MockPeer::start(Responder::Silent).await;
        let ctx = TransportContext::with_request_timeout(Some(Duration::from_millis(50)));
        let mut session = Session::new(&ctx, peer.endpoint());
        session.connect().await.unwrap();

        let err = session
            .request_reply(vec![Bytes::from_static(b"wait")], None)
            .await
            .unwrap_err();
        assert!(matches!(err, MeshcatError::RequestTimeout { millis: 50 }));
    }

    #[tokio::test]
    async fn test_reconnect_is_idempotent() {
        let peer = MockPeer::start(Responder::Default).await;
        let ctx = TransportContext::new();
        let mut session = Session::new(&ctx, peer.endpoint());

        session.connect().await.unwrap();
        session.connect().await.unwrap();
        assert_eq!(session.state(), SessionState::Connected);

        session
            .request_reply(vec![Bytes::from_static(b"url")], None)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_close_handle_unblocks_pending_request() {
        let peer = MockPeer::start(Responder::Silent).await;
        let ctx = TransportContext::new();
        let mut session = Session::new(&ctx, peer.endpoint());
        session.connect().await.unwrap();
        let handle = session.close_handle();

        let pending = tokio::spawn(async move {
            let result = session
                .request_reply(vec![Bytes::from_static(b"wait")], None)
                .await;
            (result, session.state())
        });

        tokio::time::sleep(Duration::from_millis(50)).await;
        handle.close();

        let (result, state) = tokio::time::timeout(Duration::from_secs(2), pending)
            .await
            .expect("request stayed blocked after close")
            .unwrap();
        assert!(matches!(result, Err(MeshcatError::SessionClosed)));
        assert_eq!(state, SessionState::Closed);
        assert!(handle.is_closed());
    }

    #[tokio::test]
    async fn test_context_terminate_unblocks_pending_request() {
        let peer = MockPeer::start(Responder::Silent).await;
        let ctx = TransportContext::new();
        let mut session = Session::new(&ctx, peer.endpoint());
        session.connect().await.unwrap();

        let pending = tokio::spawn(async move {
            session
                .request_reply(vec![Bytes::from_static(b"wait")], None)
                .await
        });

        tokio::time::sleep(Duration::from_millis(50)).await;
        ctx.terminate();

        let result = tokio::time::timeout(Duration::from_secs(2), pending)
            .await
            .expect("request stayed blocked after terminate")
            .unwrap();
        assert!(matches!(result, Err(MeshcatError::SessionClosed)));
    }

    #[tokio::test]
    async fn test_closed_session_rejects_everything() {
        let peer = MockPeer::start(Responder::Default).await;
        let ctx = TransportContext::new();
        let mut session = Session::new(&ctx, peer.endpoint());
        session.connect().await.unwrap();

        session.close();
        session.close();
        assert_eq!(session.state(), SessionState::Closed);

        let err = session
            .request_reply(vec![Bytes::from_static(b"url")], None)
            .await
            .unwrap_err();
        assert!(matches!(err, MeshcatError::SessionClosed));
        assert!(matches!(session.connect().await, Err(MeshcatError::SessionClosed)));
    }
}

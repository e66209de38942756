//! Transport context shared by every session of a process
//!
//! Created once at startup and handed to each [`Window`](crate::Window).
//! Terminating it fails every pending and future request on sessions that
//! were created from it.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;

#[derive(Debug)]
struct ContextInner {
    request_timeout: Option<Duration>,
    shutdown_tx: watch::Sender<bool>,
}

/// Shared transport settings and shutdown signal
#[derive(Debug, Clone)]
pub struct TransportContext {
    inner: Arc<ContextInner>,
}

impl TransportContext {
    /// Context whose requests block until a reply arrives
    pub fn new() -> Self {
        Self::with_request_timeout(None)
    }

    /// Context with a default per-request timeout
    pub fn with_request_timeout(request_timeout: Option<Duration>) -> Self {
        let (shutdown_tx, _) = watch::channel(false);
        Self {
            inner: Arc::new(ContextInner {
                request_timeout,
                shutdown_tx,
            }),
        }
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        self.inner.request_timeout
    }

    /// Fail all in-flight and future requests made through this context
    pub fn terminate(&self) {
        if !self.inner.shutdown_tx.send_replace(true) {
            tracing::debug!("Transport context terminated");
        }
    }

    pub fn is_terminated(&self) -> bool {
        *self.inner.shutdown_tx.borrow()
    }

    pub(crate) fn subscribe(&self) -> watch::Receiver<bool> {
        self.inner.shutdown_tx.subscribe()
    }
}

impl Default for TransportContext {
    fn default() -> Self {
        Self::new()
    }
}

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use serde_json::Value;
use tokio::sync::mpsc;
use tracing::debug;

/// Hands decoded payloads from every connection to the single consumer.
///
/// Unbounded: the listener never applies backpressure to the companion.
#[derive(Clone)]
pub struct Dispatcher {
    inner: Arc<DispatcherInner>,
}

struct DispatcherInner {
    tx: mpsc::UnboundedSender<Value>,
    connections: AtomicUsize,
}

impl Dispatcher {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<Value>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let dispatcher = Self {
            inner: Arc::new(DispatcherInner {
                tx,
                connections: AtomicUsize::new(0),
            }),
        };
        (dispatcher, rx)
    }

    /// Forward a payload. Returns false when the consumer has gone away.
    pub fn forward(&self, payload: Value) -> bool {
        if self.inner.tx.send(payload).is_err() {
            debug!("Feed consumer is gone, dropping payload");
            return false;
        }
        true
    }

    /// Returns the number of open connections including this one.
    pub fn connection_opened(&self) -> usize {
        self.inner.connections.fetch_add(1, Ordering::Relaxed) + 1
    }

    /// Returns the number of connections still open.
    pub fn connection_closed(&self) -> usize {
        self.inner.connections.fetch_sub(1, Ordering::Relaxed) - 1
    }

    pub fn connection_count(&self) -> usize {
        self.inner.connections.load(Ordering::Relaxed)
    }
}

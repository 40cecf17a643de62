//! src/eventbus/mod.rs
//!
//! In-process bus carrying audio-node lifecycle events to every subscriber
//! via bounded MPSC queues.

use std::sync::Arc;

use tokio::sync::{mpsc, watch, Mutex};
use tracing::trace;

use jukebot_common::models::NodeEvent;

/// Each subscriber gets its own `mpsc::Sender<NodeEvent>` for guaranteed delivery.
///
/// - If the subscriber's channel buffer fills, `publish` will await
///   until there's space (backpressure).
/// - Subscribers that dropped their `Receiver` are pruned on the next publish.
#[derive(Clone)]
pub struct NodeEventBus {
    subscribers: Arc<Mutex<Vec<mpsc::Sender<NodeEvent>>>>,
    shutdown_tx: Arc<watch::Sender<bool>>,
    pub shutdown_rx: watch::Receiver<bool>,
}

/// Default size for each subscriber's buffer.
const DEFAULT_BUFFER_SIZE: usize = 1024;

impl NodeEventBus {
    pub fn new() -> Self {
        let (tx, rx) = watch::channel(false);
        Self {
            subscribers: Arc::new(Mutex::new(vec![])),
            shutdown_tx: Arc::new(tx),
            shutdown_rx: rx,
        }
    }

    pub fn shutdown(&self) {
        let _ = self.shutdown_tx.send(true);
    }

    pub fn is_shutdown(&self) -> bool {
        *self.shutdown_rx.borrow()
    }

    /// Returns a receiver on which events will be delivered.
    pub async fn subscribe(&self, buffer_size: Option<usize>) -> mpsc::Receiver<NodeEvent> {
        let size = buffer_size.unwrap_or(DEFAULT_BUFFER_SIZE);
        let (tx, rx) = mpsc::channel(size);
        let mut subs = self.subscribers.lock().await;
        subs.push(tx);
        rx
    }

    /// Publish an event to all live subscribers.
    pub async fn publish(&self, event: NodeEvent) {
        let senders = {
            let mut subs = self.subscribers.lock().await;
            subs.retain(|s| !s.is_closed());
            subs.clone()
        };
        trace!("(NodeEventBus) publishing {:?} to {} subscriber(s)", event, senders.len());
        for s in senders {
            let _ = s.send(event.clone()).await;
        }
    }

    pub async fn subscriber_count(&self) -> usize {
        self.subscribers.lock().await.len()
    }
}

impl Default for NodeEventBus {
    fn default() -> Self {
        Self::new()
    }
}

//! Fan-out of spin state to connected viewers.
//!
//! Every viewer owns a small bounded queue. Delivery never blocks: a viewer
//! whose queue is closed (connection gone) or full (not draining) is treated as
//! disconnected and dropped from the registry, while the remaining viewers still
//! receive the event.
//!
//! ```text
//!  broadcast(&event)
//!      ├──► [queue V1] ──► SSE response V1
//!      ├──► [queue V2] ──► SSE response V2
//!      └──► [queue VN] ──x  (closed/full: removed)
//! ```

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;

use thiserror::Error;
use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::task::JoinHandle;
use wheel_core::SpinState;

/// Opaque handle for a registered viewer
pub type ViewerId = u64;

/// Message delivered to viewers
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WheelEvent {
    State(SpinState),
    /// No-op frame that keeps intermediaries from timing out idle streams
    KeepAlive,
}

impl WheelEvent {
    /// Server-Sent Events framing
    pub fn to_sse_frame(&self) -> String {
        match self {
            WheelEvent::State(state) => match serde_json::to_string(state) {
                Ok(json) => format!("data: {}\n\n", json),
                Err(e) => {
                    tracing::error!("Failed to encode spin state: {}", e);
                    ": encode error\n\n".to_string()
                }
            },
            WheelEvent::KeepAlive => ": keepalive\n\n".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("viewer disconnected")]
pub struct Disconnected;

/// An output channel with a liveness signal
pub trait Viewer: Send + Sync {
    /// False once the viewer can no longer accept data
    fn is_alive(&self) -> bool;

    /// Hand one event to the viewer without waiting
    fn deliver(&self, event: &WheelEvent) -> Result<(), Disconnected>;
}

/// Smallest usable viewer queue: the first frame plus one pending update
pub const MIN_VIEWER_QUEUE: usize = 2;

/// Viewer backed by a bounded tokio channel
pub struct ChannelViewer {
    tx: mpsc::Sender<WheelEvent>,
}

impl ChannelViewer {
    pub fn new(capacity: usize) -> (Self, mpsc::Receiver<WheelEvent>) {
        let (tx, rx) = mpsc::channel(capacity.max(MIN_VIEWER_QUEUE));
        (Self { tx }, rx)
    }
}

impl Viewer for ChannelViewer {
    fn is_alive(&self) -> bool {
        // Zero spare capacity is backpressure: the reader is not keeping up.
        !self.tx.is_closed() && self.tx.capacity() > 0
    }

    fn deliver(&self, event: &WheelEvent) -> Result<(), Disconnected> {
        match self.tx.try_send(event.clone()) {
            Ok(()) => Ok(()),
            Err(TrySendError::Full(_)) | Err(TrySendError::Closed(_)) => Err(Disconnected),
        }
    }
}

/// Registry of live viewers
pub struct Distributor {
    viewers: Mutex<Vec<(ViewerId, Box<dyn Viewer>)>>,
    next_id: AtomicU64,
    queue_capacity: usize,
}

impl Distributor {
    pub fn new(queue_capacity: usize) -> Self {
        Self {
            viewers: Mutex::new(Vec::new()),
            next_id: AtomicU64::new(1),
            queue_capacity: queue_capacity.max(MIN_VIEWER_QUEUE),
        }
    }

    fn viewers(&self) -> MutexGuard<'_, Vec<(ViewerId, Box<dyn Viewer>)>> {
        // The registry is a plain list; a panic elsewhere cannot leave it half-updated.
        self.viewers.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Register any viewer implementation
    pub fn attach(&self, viewer: Box<dyn Viewer>) -> ViewerId {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.viewers().push((id, viewer));
        tracing::debug!(viewer = id, "Viewer attached");
        id
    }

    /// Open a channel-backed viewer whose first message is `first`
    pub fn subscribe(self: &Arc<Self>, first: &WheelEvent) -> Subscription {
        let (viewer, rx) = ChannelViewer::new(self.queue_capacity);
        if viewer.deliver(first).is_err() {
            tracing::warn!("Could not queue initial state for new viewer");
        }
        let id = self.attach(Box::new(viewer));
        Subscription {
            id,
            rx,
            distributor: Arc::downgrade(self),
        }
    }

    /// Remove a viewer. Returns false if it was already gone.
    pub fn unsubscribe(&self, id: ViewerId) -> bool {
        let mut viewers = self.viewers();
        let before = viewers.len();
        viewers.retain(|(vid, _)| *vid != id);
        let removed = viewers.len() != before;
        if removed {
            tracing::debug!(viewer = id, "Viewer unsubscribed");
        }
        removed
    }

    /// Deliver `event` to every live viewer and return how many received it.
    ///
    /// Dead viewers and viewers whose write fails are removed on the way.
    pub fn broadcast(&self, event: &WheelEvent) -> usize {
        let mut delivered = 0;
        self.viewers().retain(|(id, viewer)| {
            if !viewer.is_alive() {
                tracing::debug!(viewer = *id, "Dropping dead viewer");
                return false;
            }
            match viewer.deliver(event) {
                Ok(()) => {
                    delivered += 1;
                    true
                }
                Err(Disconnected) => {
                    tracing::debug!(viewer = *id, "Write failed, dropping viewer");
                    false
                }
            }
        });
        delivered
    }

    /// Drop dead viewers without sending anything. Returns how many were removed.
    pub fn prune(&self) -> usize {
        let mut viewers = self.viewers();
        let before = viewers.len();
        viewers.retain(|(_, viewer)| viewer.is_alive());
        before - viewers.len()
    }

    pub fn viewer_count(&self) -> usize {
        self.viewers().len()
    }

    /// Broadcast a keepalive frame every `every` until the distributor is dropped
    pub fn spawn_keepalive(self: &Arc<Self>, every: Duration) -> JoinHandle<()> {
        let distributor = Arc::downgrade(self);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(every);
            // First tick completes immediately
            ticker.tick().await;
            loop {
                ticker.tick().await;
                let Some(distributor) = distributor.upgrade() else {
                    break;
                };
                let reached = distributor.broadcast(&WheelEvent::KeepAlive);
                tracing::trace!(reached, "Keepalive sent");
            }
        })
    }
}

/// Receiving end of a channel-backed viewer.
///
/// Dropping it unregisters the viewer.
pub struct Subscription {
    id: ViewerId,
    rx: mpsc::Receiver<WheelEvent>,
    distributor: Weak<Distributor>,
}

impl Subscription {
    pub fn id(&self) -> ViewerId {
        self.id
    }

    /// Next event, or `None` once the viewer has been dropped from the registry
    pub async fn recv(&mut self) -> Option<WheelEvent> {
        self.rx.recv().await
    }

    /// Next queued event without waiting
    pub fn try_recv(&mut self) -> Option<WheelEvent> {
        self.rx.try_recv().ok()
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(distributor) = self.distributor.upgrade() {
            distributor.unsubscribe(self.id);
        }
    }
}

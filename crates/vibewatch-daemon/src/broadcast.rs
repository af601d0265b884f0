//! Live-feed fan-out
//!
//! The broadcaster keeps a registry of two kinds of subscribers:
//!
//! - **persistent** subscribers (WebSocket clients) receive one bounded send
//!   attempt per message through a [`PersistentSink`]
//! - **pollable** subscribers (SSE streams) own a bounded queue and receive a
//!   non-blocking `try_send`
//!
//! Every message is sanitized and serialized once, then delivered to a
//! snapshot of the registry. A subscriber that fails delivery is removed; the
//! others are unaffected.

use crate::config::BroadcastConfig;
use crate::error::{DaemonError, DaemonResult, TransportError};
use async_trait::async_trait;
use dashmap::DashMap;
use futures_util::future::join_all;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, Mutex};
use uuid::Uuid;
use vibewatch_types::{LiveMessage, Sanitize};

/// Encoded message shared by every delivery.
pub type Frame = Arc<str>;

/// Subscriber identifier
pub type SubscriberId = Uuid;

/// A duplex connection that accepts text frames.
#[async_trait]
pub trait PersistentSink: Send + Sync {
    /// Send one text frame.
    async fn send_text(&self, text: Frame) -> Result<(), TransportError>;

    /// Called once the broadcaster has dropped this sink after a failed or
    /// timed-out delivery.
    fn evicted(&self) {}
}

#[derive(Clone)]
enum Subscriber {
    Persistent(Arc<dyn PersistentSink>),
    Pollable(mpsc::Sender<Frame>),
}

impl Subscriber {
    fn kind(&self) -> &'static str {
        match self {
            Subscriber::Persistent(_) => "persistent",
            Subscriber::Pollable(_) => "pollable",
        }
    }

    async fn deliver(&self, frame: Frame, timeout: Duration) -> Result<(), TransportError> {
        match self {
            Subscriber::Persistent(sink) => tokio::time::timeout(timeout, sink.send_text(frame))
                .await
                .map_err(|_| TransportError::Timeout)?,
            Subscriber::Pollable(tx) => tx.try_send(frame).map_err(|e| match e {
                mpsc::error::TrySendError::Full(_) => TransportError::Full,
                mpsc::error::TrySendError::Closed(_) => TransportError::Closed,
            }),
        }
    }
}

/// Outcome of one broadcast.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BroadcastReport {
    pub delivered: usize,
    pub removed: usize,
}

/// Fan-out of live messages to registered subscribers.
pub struct Broadcaster {
    subscribers: Arc<DashMap<SubscriberId, Subscriber>>,
    /// Serializes deliveries so each subscriber sees messages in broadcast order
    delivery: Mutex<()>,
    config: BroadcastConfig,
}

impl Broadcaster {
    pub fn new(config: BroadcastConfig) -> Self {
        Self {
            subscribers: Arc::new(DashMap::new()),
            delivery: Mutex::new(()),
            config,
        }
    }

    pub fn config(&self) -> &BroadcastConfig {
        &self.config
    }

    /// Register a persistent subscriber.
    pub fn subscribe_persistent(&self, sink: Arc<dyn PersistentSink>) -> Subscription {
        self.register(Subscriber::Persistent(sink))
    }

    /// Register a pollable subscriber and return the receiving end of its queue.
    pub fn subscribe_pollable(&self) -> (Subscription, mpsc::Receiver<Frame>) {
        let (tx, rx) = mpsc::channel(self.config.queue_capacity.max(1));
        (self.register(Subscriber::Pollable(tx)), rx)
    }

    fn register(&self, subscriber: Subscriber) -> Subscription {
        let id = Uuid::new_v4();
        let kind = subscriber.kind();
        self.subscribers.insert(id, subscriber);
        tracing::info!(
            subscriber_id = %id,
            kind,
            total = self.subscribers.len(),
            "Live-feed subscriber registered"
        );
        Subscription {
            id,
            registry: Arc::clone(&self.subscribers),
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }

    /// Number of registered persistent subscribers.
    pub fn persistent_count(&self) -> usize {
        self.subscribers
            .iter()
            .filter(|entry| matches!(entry.value(), Subscriber::Persistent(_)))
            .count()
    }

    /// Sanitize and encode a message as a text frame.
    pub fn encode(message: LiveMessage) -> DaemonResult<Frame> {
        let message = message.sanitized();
        serde_json::to_string(&message)
            .map(Frame::from)
            .map_err(|e| DaemonError::Broadcast(format!("failed to encode {}: {}", message.kind(), e)))
    }

    /// Deliver a message to every current subscriber.
    pub async fn broadcast(&self, message: LiveMessage) -> DaemonResult<BroadcastReport> {
        let kind = message.kind();
        let frame = Self::encode(message)?;

        let _order = self.delivery.lock().await;

        let targets: Vec<(SubscriberId, Subscriber)> = self
            .subscribers
            .iter()
            .map(|entry| (*entry.key(), entry.value().clone()))
            .collect();

        let timeout = self.config.send_timeout();
        let outcomes = join_all(targets.into_iter().map(|(id, subscriber)| {
            let frame = Arc::clone(&frame);
            async move { (id, subscriber.deliver(frame, timeout).await) }
        }))
        .await;

        let mut report = BroadcastReport::default();
        for (id, outcome) in outcomes {
            match outcome {
                Ok(()) => report.delivered += 1,
                Err(reason) => {
                    if let Some((_, subscriber)) = self.subscribers.remove(&id) {
                        if let Subscriber::Persistent(sink) = subscriber {
                            sink.evicted();
                        }
                        report.removed += 1;
                        tracing::debug!(
                            subscriber_id = %id,
                            reason = %reason,
                            "Dropped live-feed subscriber"
                        );
                    }
                }
            }
        }

        tracing::debug!(
            kind,
            delivered = report.delivered,
            removed = report.removed,
            "Broadcast complete"
        );
        Ok(report)
    }
}

/// Registration handle; the subscriber is unregistered when it is dropped.
pub struct Subscription {
    id: SubscriberId,
    registry: Arc<DashMap<SubscriberId, Subscriber>>,
}

impl Subscription {
    pub fn id(&self) -> SubscriberId {
        self.id
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if self.registry.remove(&self.id).is_some() {
            tracing::info!(
                subscriber_id = %self.id,
                total = self.registry.len(),
                "Live-feed subscriber unregistered"
            );
        }
    }
}

//! Broadcast publisher: one reused JSON document, fanned out over a tokio channel

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, Mutex};
use tracing::{info, trace};

use super::{PublishError, TelemetryPublisher};
use crate::types::TelemetryMessage;

pub struct BroadcastPublisher {
    /// Shared output document, contended between the two loops
    document: Mutex<Vec<u8>>,
    tx: broadcast::Sender<Arc<str>>,
    /// Observer count seen by the last `cleanup`
    last_observers: AtomicUsize,
}

impl BroadcastPublisher {
    /// `capacity` is the number of messages a slow observer may lag behind.
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self {
            document: Mutex::new(Vec::with_capacity(1024)),
            tx,
            last_observers: AtomicUsize::new(0),
        }
    }

    /// Attach a new observer. It receives every message published afterwards.
    pub fn subscribe(&self) -> broadcast::Receiver<Arc<str>> {
        self.tx.subscribe()
    }
}

#[async_trait]
impl TelemetryPublisher for BroadcastPublisher {
    async fn publish(
        &self,
        message: &TelemetryMessage,
        wait: Duration,
    ) -> Result<usize, PublishError> {
        let text: Arc<str> = {
            let mut doc = tokio::time::timeout(wait, self.document.lock())
                .await
                .map_err(|_| PublishError::Contended {
                    waited_ms: wait.as_millis() as u64,
                })?;
            doc.clear();
            serde_json::to_writer(&mut *doc, message)?;
            std::str::from_utf8(&doc)
                .map_err(|_| PublishError::Encoding)?
                .into()
        };

        // No observers is a normal state, not a failure
        let reached = self.tx.send(text).unwrap_or(0);
        trace!(kind = message.kind(), reached, "Telemetry published");
        Ok(reached)
    }

    fn cleanup(&self) {
        let now = self.tx.receiver_count();
        let before = self.last_observers.swap(now, Ordering::Relaxed);
        if now > before {
            info!(observers = now, joined = now - before, "Observer connected");
        } else if now < before {
            info!(observers = now, left = before - now, "Observer disconnected");
        }
    }

    fn observer_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

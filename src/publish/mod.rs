//! Telemetry publishing
//!
//! Both loops hand their messages to a [`TelemetryPublisher`]. Delivery is
//! best-effort: a failed publish is logged and counted by the caller, never
//! retried.

mod broadcast;

pub use broadcast::BroadcastPublisher;

use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

use crate::types::TelemetryMessage;

#[derive(Debug, Error)]
pub enum PublishError {
    #[error("Publisher document contended, not acquired within {waited_ms} ms")]
    Contended { waited_ms: u64 },

    #[error("Serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("Serialized document is not valid UTF-8")]
    Encoding,
}

/// Fan-out of telemetry to zero or more observers.
#[async_trait]
pub trait TelemetryPublisher: Send + Sync {
    /// Encode and send one message, waiting at most `wait` for the shared
    /// output document. Returns the number of observers reached.
    async fn publish(&self, message: &TelemetryMessage, wait: Duration)
        -> Result<usize, PublishError>;

    /// Periodic housekeeping, called once per fast-loop pass.
    fn cleanup(&self);

    fn observer_count(&self) -> usize;
}

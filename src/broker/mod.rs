//! Key-Value / Pub-Sub Broker
//!
//! The shared store backing both the session registry (nickname set, session
//! hashes with expiry) and the broadcast bus (topic publish/subscribe).
//!
//! ## Architecture
//!
//! - **Broker**: the narrow operation surface every component goes through
//! - **Subscription**: per-subscriber receive handle for one topic
//! - **MemoryBroker**: in-process implementation backed by tokio broadcast
//!   channels and deadline-tracked maps
//!
//! The broker handle is injected at construction (no ambient/static access),
//! so registry and coordinator instances can share one store.

mod memory;

pub use memory::{MemoryBroker, MemoryBrokerConfig};

use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::broadcast;

/// Narrow key-value and pub/sub operations shared by all components.
///
/// Modeled on the Redis primitives this kind of deployment uses: set
/// membership, hash storage with field-level access, key expiry, and topic
/// publish/subscribe with an async delivery stream per subscriber.
#[async_trait]
pub trait Broker: Send + Sync {
    /// Add `member` to the set at `key` if it is not already present.
    ///
    /// Returns `true` if the member was newly inserted, `false` if it was
    /// already there - the check and the insert are a single atomic step, so
    /// concurrent callers racing on the same member see exactly one `true`.
    /// An optional TTL bounds the membership lifetime.
    async fn set_add(
        &self,
        key: &str,
        member: &str,
        ttl: Option<Duration>,
    ) -> Result<bool, BrokerError>;

    /// Whether `member` is currently in the set at `key`.
    async fn set_contains(&self, key: &str, member: &str) -> Result<bool, BrokerError>;

    /// Remove `member` from the set at `key`. Returns `true` if it was present.
    async fn set_remove(&self, key: &str, member: &str) -> Result<bool, BrokerError>;

    /// Set a single field on the hash at `key`.
    async fn hash_set(&self, key: &str, field: &str, value: &str) -> Result<(), BrokerError>;

    /// Read all fields of the hash at `key`. Missing or expired keys yield
    /// an empty map.
    async fn hash_get_all(
        &self,
        key: &str,
    ) -> Result<std::collections::HashMap<String, String>, BrokerError>;

    /// Set a time-to-live on the key, after which it is no longer visible.
    async fn expire(&self, key: &str, ttl: Duration) -> Result<(), BrokerError>;

    /// Delete the key (any type). Unknown keys are a no-op.
    async fn delete(&self, key: &str) -> Result<(), BrokerError>;

    /// Publish a payload to every subscriber currently attached to `topic`.
    ///
    /// Returns the number of live subscribers the payload was handed to once
    /// the broker has accepted it - delivery itself is asynchronous per
    /// subscriber.
    async fn publish(&self, topic: &str, payload: &str) -> Result<usize, BrokerError>;

    /// Open a live subscription on `topic`.
    ///
    /// The subscription observes only payloads published after this call
    /// returns (no backfill) and releases its slot when dropped.
    async fn subscribe(&self, topic: &str) -> Result<Subscription, BrokerError>;

    /// Number of subscriptions currently open on `topic`.
    async fn subscriber_count(&self, topic: &str) -> Result<usize, BrokerError>;
}

/// Per-subscriber receive handle for one topic.
///
/// Backed by a bounded broadcast queue: a subscriber that falls behind has
/// its oldest pending payloads dropped rather than stalling the publisher.
pub struct Subscription {
    rx: broadcast::Receiver<String>,
}

impl Subscription {
    pub(crate) fn new(rx: broadcast::Receiver<String>) -> Self {
        Self { rx }
    }

    /// Receive the next payload.
    ///
    /// `Err(Lagged)` reports dropped payloads and leaves the subscription
    /// usable; `Err(Closed)` means the broker side is gone and no further
    /// payloads will arrive.
    pub async fn recv(&mut self) -> Result<String, SubscriptionError> {
        match self.rx.recv().await {
            Ok(payload) => Ok(payload),
            Err(broadcast::error::RecvError::Lagged(missed)) => {
                Err(SubscriptionError::Lagged(missed))
            }
            Err(broadcast::error::RecvError::Closed) => Err(SubscriptionError::Closed),
        }
    }
}

/// Errors observed on a subscription's receive side
#[derive(Debug, Error)]
pub enum SubscriptionError {
    /// The subscriber fell behind and the oldest payloads were dropped
    #[error("Subscriber lagged, {0} payloads dropped")]
    Lagged(u64),

    /// The topic channel was torn down
    #[error("Topic channel closed")]
    Closed,
}

/// Errors that can occur in broker operations
#[derive(Debug, Error)]
pub enum BrokerError {
    /// The backing store is unreachable; propagated to callers uninterpreted
    #[error("Broker unavailable: {0}")]
    Unavailable(String),
}

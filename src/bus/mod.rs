//! Broadcast Bus
//!
//! Topic-keyed publish/subscribe fan-out for newly created messages. Each
//! published message reaches every subscriber currently attached to the same
//! topic at most once; subscribers attached later do not see it (the bounded
//! history fetch covers that gap).
//!
//! ## Architecture
//!
//! - **MessageBus**: publishes messages and opens subscriptions against the
//!   injected broker
//! - **MessageStream**: live, infinite, cancellable per-subscriber sequence
//!
//! Messages cross the broker as JSON text with an RFC 3339 timestamp and are
//! parsed back into [`Message`](crate::chat::Message) values on delivery.
//!
//! ## Ordering
//!
//! For a single publisher, every subscriber observes messages in publish
//! order (a property of the per-topic broadcast queue). Across independent
//! publisher processes, ordering is whatever the shared broker provides -
//! deployments that need a global order must serialize publishes at the
//! broker.

mod stream;

pub use stream::MessageStream;

use std::sync::Arc;
use thiserror::Error;

use crate::broker::{Broker, BrokerError};
use crate::chat::Message;

/// Topic carrying every newly created message
pub const TOPIC_MESSAGE_ADDED: &str = "messageAdded";

/// Publish/subscribe fan-out over the shared broker
#[derive(Clone)]
pub struct MessageBus {
    broker: Arc<dyn Broker>,
}

impl MessageBus {
    /// Create a bus on top of the given broker handle
    pub fn new(broker: Arc<dyn Broker>) -> Self {
        Self { broker }
    }

    /// Publish a message to every subscriber currently attached to `topic`.
    ///
    /// Returns once the broker has accepted the payload, with the number of
    /// live subscribers it was handed to. Delivery to each subscriber is
    /// asynchronous; a slow subscriber never blocks the publisher.
    pub async fn publish(&self, topic: &str, message: &Message) -> Result<usize, BusError> {
        let payload = serde_json::to_string(message)?;
        let delivered = self.broker.publish(topic, &payload).await?;

        tracing::debug!(
            topic = %topic,
            message_id = %message.id,
            subscribers = delivered,
            "Message published"
        );
        Ok(delivered)
    }

    /// Open a live subscription on `topic`.
    ///
    /// The stream is infinite (it never ends on its own), observes only
    /// messages published after this call, and releases its broker slot when
    /// dropped.
    pub async fn subscribe(&self, topic: &str) -> Result<MessageStream, BusError> {
        let subscription = self.broker.subscribe(topic).await?;
        Ok(MessageStream::new(topic.to_string(), subscription))
    }

    /// Number of subscriptions currently open on `topic`
    pub async fn subscriber_count(&self, topic: &str) -> Result<usize, BusError> {
        Ok(self.broker.subscriber_count(topic).await?)
    }
}

/// Errors that can occur on the bus
#[derive(Debug, Error)]
pub enum BusError {
    /// A message could not be encoded for the broker hop
    #[error("Failed to encode message payload: {0}")]
    Encode(#[from] serde_json::Error),

    /// The broker is unreachable
    #[error(transparent)]
    Broker(#[from] BrokerError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::broker::MemoryBroker;
    use chrono::Utc;

    fn message(content: &str) -> Message {
        Message {
            id: uuid::Uuid::new_v4().to_string(),
            content: content.to_string(),
            nickname: "alice".to_string(),
            created_at: Utc::now(),
        }
    }

    fn bus() -> MessageBus {
        MessageBus::new(Arc::new(MemoryBroker::default()))
    }

    #[tokio::test]
    async fn test_subscriber_receives_published_message() {
        let bus = bus();
        let mut stream = bus.subscribe(TOPIC_MESSAGE_ADDED).await.unwrap();

        let sent = message("hi");
        bus.publish(TOPIC_MESSAGE_ADDED, &sent).await.unwrap();

        let received = stream.next().await.unwrap();
        assert_eq!(received, sent);
    }

    #[tokio::test]
    async fn test_no_backfill() {
        let bus = bus();

        bus.publish(TOPIC_MESSAGE_ADDED, &message("before"))
            .await
            .unwrap();

        let mut stream = bus.subscribe(TOPIC_MESSAGE_ADDED).await.unwrap();
        let after = message("after");
        bus.publish(TOPIC_MESSAGE_ADDED, &after).await.unwrap();

        assert_eq!(stream.next().await.unwrap().content, "after");
    }

    #[tokio::test]
    async fn test_every_subscriber_sees_publish_order() {
        let bus = bus();
        let mut first = bus.subscribe(TOPIC_MESSAGE_ADDED).await.unwrap();
        let mut second = bus.subscribe(TOPIC_MESSAGE_ADDED).await.unwrap();

        let m1 = message("m1");
        let m2 = message("m2");
        bus.publish(TOPIC_MESSAGE_ADDED, &m1).await.unwrap();
        bus.publish(TOPIC_MESSAGE_ADDED, &m2).await.unwrap();

        for stream in [&mut first, &mut second] {
            assert_eq!(stream.next().await.unwrap().content, "m1");
            assert_eq!(stream.next().await.unwrap().content, "m2");
        }
    }

    #[tokio::test]
    async fn test_drop_releases_subscription_slot() {
        let bus = bus();

        for _ in 0..100 {
            let stream = bus.subscribe(TOPIC_MESSAGE_ADDED).await.unwrap();
            drop(stream);
        }

        assert_eq!(bus.subscriber_count(TOPIC_MESSAGE_ADDED).await.unwrap(), 0);
        // Publishing after the churn neither errors nor leaks
        let delivered = bus
            .publish(TOPIC_MESSAGE_ADDED, &message("still fine"))
            .await
            .unwrap();
        assert_eq!(delivered, 0);
    }

    #[tokio::test]
    async fn test_malformed_payload_is_skipped() {
        let broker = Arc::new(MemoryBroker::default());
        let bus = MessageBus::new(Arc::clone(&broker) as Arc<dyn Broker>);

        let mut stream = bus.subscribe(TOPIC_MESSAGE_ADDED).await.unwrap();

        // A payload that is not a message should not end the stream
        broker
            .publish(TOPIC_MESSAGE_ADDED, "not json")
            .await
            .unwrap();
        let good = message("good");
        bus.publish(TOPIC_MESSAGE_ADDED, &good).await.unwrap();

        assert_eq!(stream.next().await.unwrap(), good);
    }
}

//! Subscriber Stream
//!
//! The per-connection delivery sequence handed out by the bus.

use crate::broker::{Subscription, SubscriptionError};
use crate::chat::Message;

/// Live sequence of messages delivered to one subscriber.
///
/// The stream never completes on its own: `next` only returns `None` once
/// the broker side has shut the topic down. Dropping the stream cancels the
/// subscription and releases its slot immediately.
pub struct MessageStream {
    topic: String,
    subscription: Subscription,
}

impl MessageStream {
    pub(crate) fn new(topic: String, subscription: Subscription) -> Self {
        Self {
            topic,
            subscription,
        }
    }

    /// Wait for the next delivered message.
    ///
    /// Payloads that fail to decode are logged and skipped. A lag report
    /// (this subscriber fell behind a bounded queue and lost the oldest
    /// payloads) is logged and the stream continues with what remains -
    /// missed messages are not redelivered; clients resynchronize through
    /// the bounded history fetch.
    pub async fn next(&mut self) -> Option<Message> {
        loop {
            match self.subscription.recv().await {
                Ok(payload) => match serde_json::from_str::<Message>(&payload) {
                    Ok(message) => return Some(message),
                    Err(e) => {
                        tracing::warn!(
                            topic = %self.topic,
                            error = %e,
                            "Dropping undecodable payload"
                        );
                    }
                },
                Err(SubscriptionError::Lagged(missed)) => {
                    tracing::warn!(
                        topic = %self.topic,
                        missed = missed,
                        "Subscriber lagged, oldest messages dropped"
                    );
                }
                Err(SubscriptionError::Closed) => {
                    tracing::debug!(topic = %self.topic, "Subscription closed");
                    return None;
                }
            }
        }
    }
}

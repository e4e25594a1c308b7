//! Chat Service
//!
//! Orchestrates message acceptance (persist, then publish) and subscription
//! lifecycle on behalf of the transport layer.

use std::sync::Arc;

use thiserror::Error;

use super::message::{Message, MAX_CONTENT_CHARS};
use crate::bus::{BusError, MessageBus, MessageStream, TOPIC_MESSAGE_ADDED};
use crate::store::{MessageStore, StoreError};

/// Tail-fetch size when the caller does not ask for one
pub const DEFAULT_HISTORY_LIMIT: usize = 50;

/// Coordinates the message store and the broadcast bus
pub struct ChatService {
    store: Arc<dyn MessageStore>,
    bus: MessageBus,
}

impl ChatService {
    /// Create a service over the injected store and bus
    pub fn new(store: Arc<dyn MessageStore>, bus: MessageBus) -> Self {
        Self { store, bus }
    }

    /// Accept a message: validate, persist, then broadcast.
    ///
    /// Content must be 1-500 code points. The transport layer may validate
    /// too, but this is the final guard before persistence. If the store
    /// rejects the write the call fails and nothing is published. If the
    /// store accepts but the broadcast fails, the message is already durable:
    /// the failure is logged and the send still succeeds, since readers can
    /// recover it through the tail fetch.
    pub async fn send_message(
        &self,
        content: &str,
        nickname: &str,
    ) -> Result<Message, ChatError> {
        let length = content.chars().count();
        if length == 0 || length > MAX_CONTENT_CHARS {
            return Err(ChatError::InvalidContent {
                max: MAX_CONTENT_CHARS,
            });
        }

        let message = self.store.append(content, nickname).await?;

        if let Err(e) = self.bus.publish(TOPIC_MESSAGE_ADDED, &message).await {
            tracing::warn!(
                message_id = %message.id,
                error = %e,
                "Message persisted but not broadcast; readers catch up via history"
            );
        }

        tracing::info!(
            message_id = %message.id,
            nickname = %message.nickname,
            "Message sent"
        );
        Ok(message)
    }

    /// Bounded tail fetch: up to `limit` messages (default 50) in ascending
    /// creation order, taken from the front of that order.
    pub async fn recent_messages(
        &self,
        limit: Option<usize>,
    ) -> Result<Vec<Message>, ChatError> {
        let limit = limit.unwrap_or(DEFAULT_HISTORY_LIMIT);
        Ok(self.store.list_recent(limit).await?)
    }

    /// Open a live subscription to newly created messages.
    ///
    /// The stream observes only messages sent after this call and is
    /// cancelled by dropping it.
    pub async fn subscribe(&self) -> Result<MessageStream, ChatError> {
        Ok(self.bus.subscribe(TOPIC_MESSAGE_ADDED).await?)
    }

    /// Number of live subscribers on the message topic
    pub async fn subscriber_count(&self) -> Result<usize, ChatError> {
        Ok(self.bus.subscriber_count(TOPIC_MESSAGE_ADDED).await?)
    }
}

/// Errors that can occur in the chat service
#[derive(Debug, Error)]
pub enum ChatError {
    /// Content length outside [1, max]
    #[error("Message must be between 1 and {max} characters")]
    InvalidContent { max: usize },

    /// The persistence collaborator is unreachable
    #[error(transparent)]
    Store(#[from] StoreError),

    /// The broadcast bus is unreachable
    #[error(transparent)]
    Bus(#[from] BusError),
}

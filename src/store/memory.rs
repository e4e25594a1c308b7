//! In-Memory Message Store
//!
//! Keeps the message log in a Vec. Used by tests and demo setups where the
//! embedded database would be noise.

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{MessageStore, StoreError};
use crate::chat::Message;

/// Volatile message store, append order is creation order
#[derive(Default)]
pub struct MemoryStore {
    messages: RwLock<Vec<Message>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl MessageStore for MemoryStore {
    async fn append(&self, content: &str, nickname: &str) -> Result<Message, StoreError> {
        let message = Message {
            id: Uuid::new_v4().to_string(),
            content: content.to_string(),
            nickname: nickname.to_string(),
            created_at: Utc::now(),
        };

        self.messages.write().await.push(message.clone());
        Ok(message)
    }

    async fn list_recent(&self, limit: usize) -> Result<Vec<Message>, StoreError> {
        let messages = self.messages.read().await;
        Ok(messages.iter().take(limit).cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_append_then_list() {
        let store = MemoryStore::new();

        store.append("a", "alice").await.unwrap();
        store.append("b", "bob").await.unwrap();
        store.append("c", "alice").await.unwrap();

        let listed = store.list_recent(2).await.unwrap();
        let contents: Vec<_> = listed.iter().map(|m| m.content.as_str()).collect();
        assert_eq!(contents, vec!["a", "b"]);
    }

    #[tokio::test]
    async fn test_list_with_generous_limit() {
        let store = MemoryStore::new();
        store.append("only", "alice").await.unwrap();

        let listed = store.list_recent(50).await.unwrap();
        assert_eq!(listed.len(), 1);
    }
}

//! Message Persistence
//!
//! The durable side of the system: messages are appended once at send time
//! and read back as a bounded tail fetch. The store is a collaborator behind
//! a trait so the coordinator never touches a concrete database.
//!
//! - **MessageStore**: the append/list contract
//! - **SqliteStore**: embedded relational table, the default backing
//! - **MemoryStore**: in-process store for tests and demos

mod memory;
mod sqlite;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

use async_trait::async_trait;
use thiserror::Error;

use crate::chat::Message;

/// Persistence collaborator consumed by the chat coordinator.
///
/// `append` assigns the id and creation timestamp; `list_recent` returns
/// messages in ascending creation order, at most `limit` of them, taken from
/// the front of that order.
#[async_trait]
pub trait MessageStore: Send + Sync {
    /// Persist a message, assigning its id and timestamp
    async fn append(&self, content: &str, nickname: &str) -> Result<Message, StoreError>;

    /// Read up to `limit` messages in ascending creation order
    async fn list_recent(&self, limit: usize) -> Result<Vec<Message>, StoreError>;
}

/// Errors that can occur in the persistence layer
#[derive(Debug, Error)]
pub enum StoreError {
    /// The backing database is unreachable or rejected the operation
    #[error("Message store unavailable: {0}")]
    Unavailable(String),
}

impl From<rusqlite::Error> for StoreError {
    fn from(e: rusqlite::Error) -> Self {
        StoreError::Unavailable(e.to_string())
    }
}

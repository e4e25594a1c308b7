//! SQLite Message Store
//!
//! Embedded relational backing for the message log. One table, one index;
//! timestamps are stored as fixed-precision RFC 3339 text so the ascending
//! `created_at` order used by the tail fetch is a plain lexicographic scan.

use std::path::Path;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{params, Connection};
use uuid::Uuid;

use super::{MessageStore, StoreError};
use crate::chat::Message;

/// Message store backed by an embedded SQLite database
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Open (or create) the database at the given path
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| StoreError::Unavailable(e.to_string()))?;
        }

        let conn = Connection::open(path)?;
        Self::init_schema(&conn)?;

        tracing::info!(path = %path.display(), "Message store opened");
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Open a throwaway in-memory database
    pub fn open_in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory()?;
        Self::init_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn init_schema(conn: &Connection) -> Result<(), StoreError> {
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS messages (
                id         TEXT PRIMARY KEY,
                content    TEXT NOT NULL,
                nickname   TEXT NOT NULL,
                created_at TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_messages_created_at
                ON messages (created_at);",
        )?;
        Ok(())
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Connection>, StoreError> {
        self.conn
            .lock()
            .map_err(|_| StoreError::Unavailable("connection lock poisoned".to_string()))
    }

    /// Fixed-precision timestamp text; lexicographic order equals
    /// chronological order.
    fn encode_timestamp(ts: DateTime<Utc>) -> String {
        ts.to_rfc3339_opts(SecondsFormat::Micros, true)
    }

    fn decode_timestamp(raw: &str) -> Result<DateTime<Utc>, StoreError> {
        DateTime::parse_from_rfc3339(raw)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|e| StoreError::Unavailable(format!("corrupt timestamp {raw:?}: {e}")))
    }
}

#[async_trait]
impl MessageStore for SqliteStore {
    async fn append(&self, content: &str, nickname: &str) -> Result<Message, StoreError> {
        let message = Message {
            id: Uuid::new_v4().to_string(),
            content: content.to_string(),
            nickname: nickname.to_string(),
            created_at: Utc::now(),
        };

        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO messages (id, content, nickname, created_at) VALUES (?1, ?2, ?3, ?4)",
            params![
                message.id,
                message.content,
                message.nickname,
                Self::encode_timestamp(message.created_at),
            ],
        )?;

        Ok(message)
    }

    async fn list_recent(&self, limit: usize) -> Result<Vec<Message>, StoreError> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            "SELECT id, content, nickname, created_at FROM messages
             ORDER BY created_at ASC, rowid ASC LIMIT ?1",
        )?;

        let rows = stmt.query_map(params![limit as i64], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, String>(3)?,
            ))
        })?;

        let mut messages = Vec::new();
        for row in rows {
            let (id, content, nickname, created_at) = row?;
            messages.push(Message {
                id,
                content,
                nickname,
                created_at: Self::decode_timestamp(&created_at)?,
            });
        }
        Ok(messages)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_append_assigns_id_and_timestamp() {
        let store = SqliteStore::open_in_memory().unwrap();

        let before = Utc::now();
        let message = store.append("hello", "alice").await.unwrap();

        assert!(!message.id.is_empty());
        assert_eq!(message.content, "hello");
        assert_eq!(message.nickname, "alice");
        assert!(message.created_at >= before);
    }

    #[tokio::test]
    async fn test_list_returns_ascending_prefix() {
        let store = SqliteStore::open_in_memory().unwrap();

        for content in ["a", "b", "c"] {
            store.append(content, "alice").await.unwrap();
        }

        // Ascending order combined with take-first: the oldest two
        let listed = store.list_recent(2).await.unwrap();
        let contents: Vec<_> = listed.iter().map(|m| m.content.as_str()).collect();
        assert_eq!(contents, vec!["a", "b"]);
    }

    #[tokio::test]
    async fn test_list_round_trips_timestamps() {
        let store = SqliteStore::open_in_memory().unwrap();

        let written = store.append("hello", "alice").await.unwrap();
        let read = store.list_recent(1).await.unwrap().remove(0);

        assert_eq!(read.id, written.id);
        // Microsecond precision survives the text column
        let delta = (read.created_at - written.created_at).num_microseconds();
        assert_eq!(delta, Some(0));
    }

    #[tokio::test]
    async fn test_open_creates_parent_directories() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("messages.db");

        let store = SqliteStore::open(&path).unwrap();
        store.append("persisted", "alice").await.unwrap();
        drop(store);

        // Reopening sees the same data
        let reopened = SqliteStore::open(&path).unwrap();
        let listed = reopened.list_recent(10).await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].content, "persisted");
    }
}

//! Chat Message
//!
//! The one record this system creates: a short piece of text attributed to a
//! nickname, stamped by the persistence layer at send time and immutable
//! afterwards.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Maximum message length in Unicode code points
pub const MAX_CONTENT_CHARS: usize = 500;

/// A persisted chat message.
///
/// Serialized with camelCase field names and an RFC 3339 `createdAt` string -
/// the same wire form is used for HTTP responses, WebSocket events, and the
/// broker hop, so a timestamp always survives serialization as text and is
/// parsed back into a structured value on delivery.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    /// Opaque unique identifier assigned at persistence time
    pub id: String,
    /// Message text, 1-500 code points
    pub content: String,
    /// Sender's claimed nickname
    pub nickname: String,
    /// Server-assigned creation timestamp
    pub created_at: DateTime<Utc>,
}

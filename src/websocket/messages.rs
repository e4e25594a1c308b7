//! WebSocket Message Types
//!
//! Defines all message types for WebSocket communication between
//! chat clients and the Palaver server.

use serde::{Deserialize, Serialize};

use crate::chat::Message;

/// Messages sent from client to server
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    /// Ping for keepalive
    Ping,
}

/// Messages sent from server to client
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    /// Connection established
    Connected {
        /// Unique connection identifier
        connection_id: String,
    },
    /// A new chat message was created
    MessageAdded {
        /// The persisted message, as stored
        message: Message,
    },
    /// Pong response to ping
    Pong,
    /// Error message
    Error {
        /// Error description
        message: String,
    },
}

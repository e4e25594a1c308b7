//! Data Transfer Objects
//!
//! Request and response types for the API endpoints.
//! These types are serialized/deserialized to/from JSON, camelCase on the
//! wire like every other surface of this service.

use serde::{Deserialize, Serialize};

// ============================================
// GUEST DTOs
// ============================================

/// Guest registration request
#[derive(Debug, Deserialize)]
pub struct CreateGuestRequest {
    /// Requested nickname, 2-20 code points
    pub nickname: String,
}

/// Guest registration response
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GuestResponse {
    /// The nickname actually granted (may carry a numeric suffix)
    pub nickname: String,
    /// Opaque session token for later release
    pub session_id: String,
}

// ============================================
// MESSAGE DTOs
// ============================================

/// Message send request
#[derive(Debug, Deserialize)]
pub struct SendMessageRequest {
    /// Message text, 1-500 code points
    pub content: String,
    /// Sender's nickname
    pub nickname: String,
}

/// Query parameters for the message list
#[derive(Debug, Deserialize)]
pub struct ListMessagesParams {
    /// Maximum number of messages to return (default 50)
    #[serde(default)]
    pub limit: Option<usize>,
}

// ============================================
// HEALTH DTOs
// ============================================

/// Full health status response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Overall status: "healthy" or "degraded"
    pub status: String,
    /// Message store status: "ok" or "error"
    pub store: String,
    /// Live subscriber count on the message topic
    pub subscribers: usize,
    /// Seconds since server start
    pub uptime_seconds: u64,
    /// Crate version
    pub version: String,
}

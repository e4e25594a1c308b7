//! Chat Coordinator
//!
//! The only component allowed to mutate message state. Ties persistence and
//! broadcast together: a send is persisted first and published second, so a
//! failed write never produces a phantom broadcast.
//!
//! - **Message**: the immutable chat record and its wire contract
//! - **ChatService**: send / bounded tail fetch / live subscription

mod message;
mod service;

pub use message::{Message, MAX_CONTENT_CHARS};
pub use service::{ChatError, ChatService, DEFAULT_HISTORY_LIMIT};

//! # Palaver
//!
//! Guest-identity chat service: claim a nickname, post short messages, and
//! receive new messages in real time.
//!
//! ## Features
//!
//! - **Guest sessions**: unique nickname claims with a fixed 24-hour expiry
//! - **Real-time fan-out**: every live subscriber sees each new message at
//!   most once, in publish order
//! - **Durable history**: messages persist in an embedded SQLite table with
//!   a bounded tail fetch for resynchronization
//! - **Pluggable backing**: the key-value/pub-sub broker and the message
//!   store are injected trait objects
//!
//! ## Modules
//!
//! - [`broker`]: key-value/pub-sub store abstraction and in-memory broker
//! - [`bus`]: topic-keyed broadcast fan-out
//! - [`session`]: nickname registry and guest sessions
//! - [`chat`]: the coordinator tying persistence and broadcast together
//! - [`store`]: message persistence collaborators
//! - [`api`]: REST API server with Axum
//! - [`websocket`]: real-time delivery endpoint
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use palaver::broker::{Broker, MemoryBroker};
//! use palaver::bus::MessageBus;
//! use palaver::chat::ChatService;
//! use palaver::session::SessionRegistry;
//! use palaver::store::MemoryStore;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let broker: Arc<dyn Broker> = Arc::new(MemoryBroker::default());
//!     let chat = ChatService::new(
//!         Arc::new(MemoryStore::new()),
//!         MessageBus::new(Arc::clone(&broker)),
//!     );
//!     let registry = SessionRegistry::new(broker);
//!
//!     // A guest joins and a reader subscribes before anything is sent
//!     let guest = registry.register("alice").await?;
//!     let mut live = chat.subscribe().await?;
//!
//!     chat.send_message("hello, room", &guest.nickname).await?;
//!     let delivered = live.next().await.expect("live message");
//!     println!("{}: {}", delivered.nickname, delivered.content);
//!
//!     registry.release(&guest.session_id).await?;
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod broker;
pub mod bus;
pub mod chat;
pub mod config;
pub mod session;
pub mod store;
pub mod websocket;

// Re-export top-level types for convenience
pub use broker::{Broker, BrokerError, MemoryBroker, MemoryBrokerConfig, Subscription};

pub use bus::{BusError, MessageBus, MessageStream, TOPIC_MESSAGE_ADDED};

pub use chat::{ChatError, ChatService, Message, DEFAULT_HISTORY_LIMIT, MAX_CONTENT_CHARS};

pub use session::{RegistryError, Session, SessionRegistry, SESSION_TTL};

pub use store::{MemoryStore, MessageStore, SqliteStore, StoreError};

pub use api::{build_router, serve, ApiError, AppState};

pub use websocket::{websocket_handler, ClientMessage, ServerMessage};

pub use config::{
    ApiConfig, BrokerConfig, Config, ConfigError, LoggingConfig, StoreConfig,
};

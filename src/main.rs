//! Palaver Server
//!
//! Run with: cargo run
//!
//! # Configuration
//!
//! Loaded from the first of `~/.config/palaver/config.toml`,
//! `/etc/palaver/config.toml`, `./config.toml`, then overridden by
//! environment variables:
//! - `PALAVER_DATA_DIR`: Data directory for the message database
//! - `PALAVER_SESSION_TTL_SECS`: Guest session lifetime
//! - `PALAVER_API_HOST`: Host to bind to (default: 0.0.0.0)
//! - `PALAVER_API_PORT`: Port to listen on (default: 8090)
//! - `PALAVER_LOG_LEVEL`: Log level (default: info)
//! - `PALAVER_LOG_FORMAT`: pretty or json (default: pretty)
//! - `RUST_LOG`: Full filter override

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use palaver::api::{serve, AppState};
use palaver::broker::{Broker, MemoryBroker, MemoryBrokerConfig};
use palaver::bus::MessageBus;
use palaver::chat::ChatService;
use palaver::config::Config;
use palaver::session::SessionRegistry;
use palaver::store::SqliteStore;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::load_default();
    init_tracing(&config);

    tracing::info!("Starting Palaver server v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!("Data directory: {}", config.store.data_dir);

    // Message store
    let database_path = config.store.database_path();
    let store = Arc::new(
        SqliteStore::open(&database_path)
            .with_context(|| format!("opening message store at {:?}", database_path))?,
    );

    // Shared broker backing both the nickname registry and the bus
    let broker: Arc<dyn Broker> = Arc::new(MemoryBroker::new(MemoryBrokerConfig {
        channel_capacity: config.broker.channel_capacity,
    }));

    let bus = MessageBus::new(Arc::clone(&broker));
    let chat = Arc::new(ChatService::new(store, bus));
    let registry = Arc::new(SessionRegistry::with_ttl(
        broker,
        Duration::from_secs(config.broker.session_ttl_secs),
    ));

    let state = AppState::new(chat, registry, config.api.clone());

    tracing::info!("Starting server on {}", config.api.addr());
    serve(state, &config.api).await?;

    tracing::info!("Palaver server stopped");
    Ok(())
}

/// Initialize tracing from the logging config
fn init_tracing(config: &Config) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        tracing_subscriber::EnvFilter::new(format!(
            "palaver={},tower_http=info",
            config.logging.level
        ))
    });

    let registry = tracing_subscriber::registry().with(filter);

    if config.logging.format == "json" {
        registry
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

//! Session Registry
//!
//! Guarantees a globally unique, human-readable nickname per active guest
//! and provides session-to-nickname lookup. All state lives in the shared
//! broker, so any number of registry instances can serve the same guest
//! population.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

use crate::broker::{Broker, BrokerError};

/// Set of nicknames currently held by non-expired sessions
const ACTIVE_NICKNAMES_KEY: &str = "chat:users:active";

/// Prefix for per-session hashes
const SESSION_KEY_PREFIX: &str = "chat:session:";

/// Fixed session lifetime: 24 hours from creation, never refreshed
pub const SESSION_TTL: Duration = Duration::from_secs(86_400);

/// Nickname length bounds in Unicode code points
const NICKNAME_MIN_CHARS: usize = 2;
const NICKNAME_MAX_CHARS: usize = 20;

/// An active guest session
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    /// Opaque unique session token
    pub session_id: String,
    /// The nickname actually granted (may carry a numeric suffix)
    pub nickname: String,
    /// When the guest registered
    pub connected_at: DateTime<Utc>,
}

/// Tracks active nicknames and their sessions in the shared broker
pub struct SessionRegistry {
    broker: Arc<dyn Broker>,
    ttl: Duration,
}

impl SessionRegistry {
    /// Create a registry with the standard 24-hour session lifetime
    pub fn new(broker: Arc<dyn Broker>) -> Self {
        Self::with_ttl(broker, SESSION_TTL)
    }

    /// Create a registry with a custom session lifetime
    pub fn with_ttl(broker: Arc<dyn Broker>, ttl: Duration) -> Self {
        Self { broker, ttl }
    }

    /// Register a guest under the requested nickname.
    ///
    /// If the nickname is taken, the smallest positive integer suffix that
    /// yields a free name is appended (`bob` → `bob1` → `bob2` …). Each
    /// attempt is an atomic conditional insert into the active set, so two
    /// concurrent claims of the same name always end up with distinct
    /// nicknames. The granted nickname and session expire together.
    pub async fn register(&self, requested_nickname: &str) -> Result<Session, RegistryError> {
        let length = requested_nickname.chars().count();
        if !(NICKNAME_MIN_CHARS..=NICKNAME_MAX_CHARS).contains(&length) {
            return Err(RegistryError::InvalidNickname {
                min: NICKNAME_MIN_CHARS,
                max: NICKNAME_MAX_CHARS,
            });
        }

        let nickname = self.claim_nickname(requested_nickname).await?;

        let session_id = Uuid::new_v4().to_string();
        let connected_at = Utc::now();
        let session_key = format!("{}{}", SESSION_KEY_PREFIX, session_id);

        let stored = self
            .store_session(&session_key, &nickname, connected_at)
            .await;
        if let Err(e) = stored {
            // Don't let a half-created session hold the name for a full TTL
            if let Err(release_err) = self
                .broker
                .set_remove(ACTIVE_NICKNAMES_KEY, &nickname)
                .await
            {
                tracing::warn!(
                    nickname = %nickname,
                    error = %release_err,
                    "Failed to release nickname after aborted registration"
                );
            }
            return Err(e.into());
        }

        tracing::info!(
            nickname = %nickname,
            session_id = %session_id,
            "Guest registered"
        );

        Ok(Session {
            session_id,
            nickname,
            connected_at,
        })
    }

    /// Release a session and free its nickname.
    ///
    /// Unknown or already-expired session ids are a no-op, so repeated
    /// release calls are safe.
    pub async fn release(&self, session_id: &str) -> Result<(), RegistryError> {
        let session_key = format!("{}{}", SESSION_KEY_PREFIX, session_id);
        let fields = self.broker.hash_get_all(&session_key).await?;

        let Some(nickname) = fields.get("nickname") else {
            tracing::debug!(session_id = %session_id, "Release of unknown session ignored");
            return Ok(());
        };

        self.broker
            .set_remove(ACTIVE_NICKNAMES_KEY, nickname)
            .await?;
        self.broker.delete(&session_key).await?;

        tracing::info!(nickname = %nickname, session_id = %session_id, "Guest removed");
        Ok(())
    }

    /// Look up a session by id. Expired sessions read as absent.
    pub async fn lookup(&self, session_id: &str) -> Result<Option<Session>, RegistryError> {
        let session_key = format!("{}{}", SESSION_KEY_PREFIX, session_id);
        let fields = self.broker.hash_get_all(&session_key).await?;
        Ok(Self::session_from_fields(session_id, &fields))
    }

    /// Whether a nickname is currently held by an active session
    pub async fn is_nickname_active(&self, nickname: &str) -> Result<bool, RegistryError> {
        Ok(self
            .broker
            .set_contains(ACTIVE_NICKNAMES_KEY, nickname)
            .await?)
    }

    async fn claim_nickname(&self, requested: &str) -> Result<String, RegistryError> {
        let mut candidate = requested.to_string();
        let mut suffix: u32 = 0;

        loop {
            let claimed = self
                .broker
                .set_add(ACTIVE_NICKNAMES_KEY, &candidate, Some(self.ttl))
                .await?;
            if claimed {
                if suffix > 0 {
                    tracing::debug!(
                        requested = %requested,
                        granted = %candidate,
                        "Nickname taken, granted suffixed variant"
                    );
                }
                return Ok(candidate);
            }

            suffix += 1;
            candidate = format!("{}{}", requested, suffix);
        }
    }

    async fn store_session(
        &self,
        session_key: &str,
        nickname: &str,
        connected_at: DateTime<Utc>,
    ) -> Result<(), BrokerError> {
        self.broker
            .hash_set(session_key, "nickname", nickname)
            .await?;
        self.broker
            .hash_set(session_key, "connectedAt", &connected_at.to_rfc3339())
            .await?;
        self.broker.expire(session_key, self.ttl).await
    }

    fn session_from_fields(
        session_id: &str,
        fields: &HashMap<String, String>,
    ) -> Option<Session> {
        let nickname = fields.get("nickname")?.clone();
        let connected_at = fields
            .get("connectedAt")
            .and_then(|raw| DateTime::parse_from_rfc3339(raw).ok())
            .map(|dt| dt.with_timezone(&Utc))?;

        Some(Session {
            session_id: session_id.to_string(),
            nickname,
            connected_at,
        })
    }
}

/// Errors that can occur in registry operations
#[derive(Debug, Error)]
pub enum RegistryError {
    /// Nickname length outside the allowed bounds
    #[error("Nickname must be between {min} and {max} characters")]
    InvalidNickname { min: usize, max: usize },

    /// The backing store is unreachable
    #[error(transparent)]
    Broker(#[from] BrokerError),
}

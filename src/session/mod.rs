//! Guest Sessions
//!
//! Ephemeral guest identity: a claimed nickname bound to a session token
//! with a fixed expiry. At any instant the set of nicknames held by
//! non-expired sessions contains no duplicates.
//!
//! ## Architecture
//!
//! - **SessionRegistry**: claims and releases nicknames against the shared
//!   broker
//! - **Session**: the `{sessionId, nickname, connectedAt}` record handed to
//!   a newly registered guest

mod registry;

pub use registry::{RegistryError, Session, SessionRegistry, SESSION_TTL};

//! API Route Handlers

pub mod guests;
pub mod health;
pub mod messages;

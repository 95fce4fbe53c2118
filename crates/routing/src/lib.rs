//! Map inbound events to bot identities.
//!
//! Resolution cascade (precedence):
//! 1. Explicit per-bot endpoint name, validated against the registry
//! 2. Sender bot-account id, resolved once via the platform and cached
//! 3. The default identity (`bina` when registered, else first-registered)
//!
//! The deduplication cache lives here too: it gates dispatch so upstream
//! at-least-once delivery never triggers side effects twice.

pub mod dedup;
pub mod registry;
pub mod resolve;

pub use {
    dedup::DedupCache,
    registry::{BotIdentity, BotRegistry},
    resolve::EventRouter,
};

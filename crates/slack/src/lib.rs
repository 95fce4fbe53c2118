//! Slack platform adapter for bina.
//!
//! Defines the collaborator contracts the pipeline consumes (`ChatApi`),
//! the closed inbound-event model, the mrkdwn markup normalizer with its
//! deterministic fallback, and the reqwest Web API client.

pub mod api;
pub mod client;
pub mod error;
pub mod event;
pub mod identity;
pub mod markup;
pub mod testing;

pub use {
    api::{BotInfo, ChatApi},
    client::SlackClient,
    error::{Error, Result},
    event::{EventEnvelope, InboundEvent},
    identity::SelfIdCache,
};

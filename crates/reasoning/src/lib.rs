//! Reasoning-service seam: the pipeline talks to an opaque completion
//! service and an opaque rewriting service through these traits. The
//! Anthropic messages-API client implements both.

pub mod anthropic;
pub mod error;
pub mod testing;

pub use {
    anthropic::AnthropicClient,
    error::{Error, Result},
};

use {anyhow::Result as AnyResult, async_trait::async_trait};

use bina_common::types::ContextMessage;

/// Produce a reply from role-tagged conversation context. May fail or time
/// out; an empty reply is the caller's problem to treat as failure.
#[async_trait]
pub trait ReasoningService: Send + Sync {
    async fn complete(&self, system: &str, messages: &[ContextMessage]) -> AnyResult<String>;
}

/// Rewrite text under an explicit rule specification. This is the
/// preferred normalization tier; callers keep a deterministic fallback for
/// when it fails.
#[async_trait]
pub trait RewriteService: Send + Sync {
    async fn rewrite(&self, text: &str, rules: &str) -> AnyResult<String>;
}

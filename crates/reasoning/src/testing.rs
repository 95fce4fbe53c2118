//! Test doubles for the reasoning seam, shared by downstream crate tests.

use {anyhow::Result, async_trait::async_trait};

use bina_common::types::ContextMessage;

use crate::{ReasoningService, RewriteService};

/// Always answers with a fixed reply.
pub struct ScriptedReasoning {
    pub reply: String,
}

impl ScriptedReasoning {
    #[must_use]
    pub fn new(reply: impl Into<String>) -> Self {
        Self {
            reply: reply.into(),
        }
    }
}

#[async_trait]
impl ReasoningService for ScriptedReasoning {
    async fn complete(&self, _system: &str, _messages: &[ContextMessage]) -> Result<String> {
        Ok(self.reply.clone())
    }
}

/// Always fails, simulating an outage or timeout.
pub struct FailingReasoning;

#[async_trait]
impl ReasoningService for FailingReasoning {
    async fn complete(&self, _system: &str, _messages: &[ContextMessage]) -> Result<String> {
        anyhow::bail!("reasoning refused by test double")
    }
}

/// Rewriter answering with a fixed reply.
pub struct ScriptedRewriter {
    pub reply: String,
}

impl ScriptedRewriter {
    #[must_use]
    pub fn new(reply: impl Into<String>) -> Self {
        Self {
            reply: reply.into(),
        }
    }
}

#[async_trait]
impl RewriteService for ScriptedRewriter {
    async fn rewrite(&self, _text: &str, _rules: &str) -> Result<String> {
        Ok(self.reply.clone())
    }
}

/// Rewriter that always fails, forcing callers onto their fallback tier.
pub struct FailingRewriter;

#[async_trait]
impl RewriteService for FailingRewriter {
    async fn rewrite(&self, _text: &str, _rules: &str) -> Result<String> {
        anyhow::bail!("rewrite refused by test double")
    }
}

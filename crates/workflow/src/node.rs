use std::sync::Arc;

use async_trait::async_trait;

use {
    bina_reasoning::{ReasoningService, RewriteService},
    bina_slack::{ChatApi, SelfIdCache},
};

use crate::state::{StateUpdate, WorkflowState};

/// Collaborators injected into every node run. One instance per bot
/// identity; tests supply fakes. No node reaches for globals.
pub struct BotServices {
    pub bot_name: String,
    pub chat: Arc<dyn ChatApi>,
    pub reasoning: Arc<dyn ReasoningService>,
    pub rewriter: Arc<dyn RewriteService>,
    pub self_ids: Arc<SelfIdCache>,
}

/// One asynchronous step of the pipeline. A node reads the shared state,
/// performs at most one suspension-point's worth of external work, and
/// returns a partial update; internal failures become `update.error`,
/// never panics or thrown errors.
#[async_trait]
pub trait Node: Send + Sync {
    fn name(&self) -> &'static str;

    async fn run(&self, state: &WorkflowState, services: &BotServices) -> StateUpdate;
}

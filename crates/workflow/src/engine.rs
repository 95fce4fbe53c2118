use std::sync::Arc;

use tracing::debug;

use bina_slack::InboundEvent;

use crate::{
    node::{BotServices, Node},
    state::WorkflowState,
};

/// Positions in the fixed node graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Validate,
    Acknowledge,
    FetchContext,
    CallReasoning,
    NormalizeOutput,
    Finalize,
    Deliver,
    ReportError,
    Done,
}

/// The graph's transition function. Pure: the next step depends only on
/// where we are and what the state says. An error recorded anywhere routes
/// to the terminal reporter; `validate` additionally terminates silently
/// when the event should not be processed.
#[must_use]
pub fn next_step(current: Step, state: &WorkflowState) -> Step {
    if state.error_occurred && current != Step::ReportError {
        return Step::ReportError;
    }
    match current {
        Step::Validate => {
            if state.should_process {
                Step::Acknowledge
            } else {
                Step::Done
            }
        },
        Step::Acknowledge => Step::FetchContext,
        Step::FetchContext => Step::CallReasoning,
        Step::CallReasoning => Step::NormalizeOutput,
        Step::NormalizeOutput => Step::Finalize,
        Step::Finalize => Step::Deliver,
        Step::Deliver | Step::ReportError | Step::Done => Step::Done,
    }
}

/// The concrete node behind each graph position. Variants swap individual
/// nodes without touching the transition rules.
pub struct NodeSet {
    pub validate: Box<dyn Node>,
    pub acknowledge: Box<dyn Node>,
    pub fetch_context: Box<dyn Node>,
    pub call_reasoning: Box<dyn Node>,
    pub normalize_output: Box<dyn Node>,
    pub finalize: Box<dyn Node>,
    pub deliver: Box<dyn Node>,
    pub report_error: Box<dyn Node>,
}

/// One configured workflow instance. Built per invocation by a bot's
/// factory; owns nothing shared except the services handle.
pub struct Workflow {
    nodes: NodeSet,
    services: Arc<BotServices>,
}

impl Workflow {
    #[must_use]
    pub fn new(nodes: NodeSet, services: Arc<BotServices>) -> Self {
        Self { nodes, services }
    }

    fn node_for(&self, step: Step) -> Option<&dyn Node> {
        let node = match step {
            Step::Validate => &self.nodes.validate,
            Step::Acknowledge => &self.nodes.acknowledge,
            Step::FetchContext => &self.nodes.fetch_context,
            Step::CallReasoning => &self.nodes.call_reasoning,
            Step::NormalizeOutput => &self.nodes.normalize_output,
            Step::Finalize => &self.nodes.finalize,
            Step::Deliver => &self.nodes.deliver,
            Step::ReportError => &self.nodes.report_error,
            Step::Done => return None,
        };
        Some(node.as_ref())
    }

    /// Drive the event through the graph to a terminal state. Never
    /// returns an error: every failure is internalized in the state
    /// record and reported by the terminal error node.
    pub async fn run(&self, event: InboundEvent) -> WorkflowState {
        let mut state = WorkflowState::new(event);
        let mut step = Step::Validate;

        while let Some(node) = self.node_for(step) {
            debug!(bot = %self.services.bot_name, node = node.name(), "running node");
            let update = node.run(&state, &self.services).await;
            state.apply(update);
            step = next_step(step, &state);
        }
        state
    }
}

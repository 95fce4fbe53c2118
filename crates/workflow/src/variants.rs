//! Named workflow variants.
//!
//! Each bot personality resolves to one concrete node-set at startup via
//! [`factory_for`]; there is no runtime module loading. Unknown names get
//! the standard set.

use std::sync::Arc;

use crate::{
    context::MAX_CONTEXT_MESSAGES,
    engine::{NodeSet, Workflow},
    node::BotServices,
    nodes::{
        AcknowledgeNode, CallReasoningNode, DeliverNode, FetchContextNode, FinalizeNode,
        NormalizeOutputNode, ReportErrorNode, ValidateNode,
    },
};

/// Builds a fresh workflow instance for one invocation.
pub trait WorkflowFactory: Send + Sync {
    fn variant(&self) -> &'static str;

    fn build(&self, services: Arc<BotServices>) -> Workflow;
}

/// Default personality: concise answers over a short context window.
pub struct StandardWorkflow;

impl WorkflowFactory for StandardWorkflow {
    fn variant(&self) -> &'static str {
        "standard"
    }

    fn build(&self, services: Arc<BotServices>) -> Workflow {
        let prompt = standard_prompt(&services.bot_name);
        Workflow::new(node_set(MAX_CONTEXT_MESSAGES, prompt), services)
    }
}

/// Deep-study personality: a wider window and a source-analysis prompt.
pub struct DeepStudyWorkflow;

/// Thread window for the deep-study variant.
const DEEP_CONTEXT_MESSAGES: usize = 10;

impl WorkflowFactory for DeepStudyWorkflow {
    fn variant(&self) -> &'static str {
        "deep"
    }

    fn build(&self, services: Arc<BotServices>) -> Workflow {
        let prompt = deep_prompt(&services.bot_name);
        Workflow::new(node_set(DEEP_CONTEXT_MESSAGES, prompt), services)
    }
}

fn node_set(context_limit: usize, system_prompt: String) -> NodeSet {
    NodeSet {
        validate: Box::new(ValidateNode),
        acknowledge: Box::new(AcknowledgeNode),
        fetch_context: Box::new(FetchContextNode {
            limit: context_limit,
        }),
        call_reasoning: Box::new(CallReasoningNode { system_prompt }),
        normalize_output: Box::new(NormalizeOutputNode),
        finalize: Box::new(FinalizeNode),
        deliver: Box::new(DeliverNode),
        report_error: Box::new(ReportErrorNode),
    }
}

/// Resolve a bot name to its workflow variant. Called once at
/// registration, never per event.
#[must_use]
pub fn factory_for(bot_name: &str) -> Arc<dyn WorkflowFactory> {
    match bot_name.to_ascii_lowercase().as_str() {
        "binah" => Arc::new(DeepStudyWorkflow),
        _ => Arc::new(StandardWorkflow),
    }
}

fn standard_prompt(bot_name: &str) -> String {
    format!(
        "You are {bot_name}, a study companion for Jewish texts in a Slack \
         workspace. Answer questions clearly and concisely, citing sources \
         where you can and linking passages in the form \
         <https://www.sefaria.org/Genesis.1.1|Genesis 1:1>. Use Slack \
         formatting only: *single asterisks* for bold, no markdown headers, \
         no HTML. If you cannot ground an answer in specific sources, say so \
         plainly rather than inventing a citation."
    )
}

fn deep_prompt(bot_name: &str) -> String {
    format!(
        "You are {bot_name}, a deep-study partner for Jewish texts in a \
         Slack workspace. Work through questions the way a chavruta would: \
         bring the primary source, then the major commentaries, note \
         disagreements between them, and finish with a short summary of the \
         practical takeaway. Cite every source and link passages in the form \
         <https://www.sefaria.org/Genesis.1.1|Genesis 1:1>. Use Slack \
         formatting only: *single asterisks* for bold, no markdown headers, \
         no HTML. Distinguish clearly between what the sources say and what \
         is based on general knowledge."
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn binah_gets_the_deep_variant() {
        assert_eq!(factory_for("binah").variant(), "deep");
        assert_eq!(factory_for("BINAH").variant(), "deep");
    }

    #[test]
    fn unknown_names_get_the_standard_variant() {
        assert_eq!(factory_for("bina").variant(), "standard");
        assert_eq!(factory_for("someone-new").variant(), "standard");
    }

    #[test]
    fn prompts_carry_the_bot_name() {
        assert!(standard_prompt("bina").contains("bina"));
        assert!(deep_prompt("binah").contains("binah"));
    }
}

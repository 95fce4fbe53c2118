//! The pipeline's node implementations.
//!
//! Every node converts its own failures into a `StateUpdate` error; the
//! engine, not the node, decides where control goes next. Acknowledgment
//! is the one deliberate exception to the fail-fast rule: a missing
//! reaction never blocks the answer.

use {
    async_trait::async_trait,
    tracing::{debug, info, warn},
};

use {
    bina_common::types::RawMessage,
    bina_slack::markup,
};

use crate::{
    context::build_context,
    error::NodeError,
    node::{BotServices, Node},
    state::{StateUpdate, WorkflowState},
};

/// Reaction confirming the bot has seen the message.
const ACK_REACTION: &str = "eyes";

/// Best-effort message for the terminal error node.
const APOLOGY: &str =
    "Sorry, I ran into a problem and couldn't finish answering. Please try again in a moment.";

// ── validate ─────────────────────────────────────────────────────────────

/// Gate: decides whether this event deserves processing at all.
pub struct ValidateNode;

#[async_trait]
impl Node for ValidateNode {
    fn name(&self) -> &'static str {
        "validate"
    }

    async fn run(&self, state: &WorkflowState, services: &BotServices) -> StateUpdate {
        let event = &state.event;

        if event.channel.is_none() || event.ts.is_none() {
            return StateUpdate::fail(NodeError::Validation(
                "event missing channel or timestamp".into(),
            ));
        }

        // Never answer bots (ourselves included) or message edits/joins.
        if event.from_bot() || event.subtype.is_some() {
            return ignore("bot or subtyped message");
        }

        if event.kind != "message" && event.kind != "app_mention" {
            return ignore("unhandled event kind");
        }

        let Some(text) = event.text.as_deref().filter(|t| !t.trim().is_empty()) else {
            return ignore("no text");
        };

        let mut update = StateUpdate::none();

        // Plain channel messages require an explicit mention of this bot;
        // app_mention events and DMs are addressed to us by construction.
        if event.kind == "message" && !event.is_direct_message() {
            let self_id = match services
                .self_ids
                .resolve(&services.bot_name, services.chat.as_ref())
                .await
            {
                Ok(id) => id,
                Err(e) => {
                    debug!(bot = %services.bot_name, error = %e, "self identity unavailable");
                    return ignore("cannot resolve own identity");
                },
            };
            if !event.mentions(&self_id) {
                return ignore("not mentioned");
            }
            update.bot_user_id = Some(self_id);
        }

        let message_text = markup::strip_markup(text);
        if message_text.is_empty() {
            return ignore("nothing left after markup stripping");
        }

        update.should_process = Some(true);
        update.message_text = Some(message_text);
        update
    }
}

fn ignore(reason: &str) -> StateUpdate {
    debug!(reason, "event ignored");
    StateUpdate {
        should_process: Some(false),
        ..StateUpdate::default()
    }
}

// ── acknowledge ──────────────────────────────────────────────────────────

/// Best-effort reaction so the user knows the bot is working. Failure is
/// recorded in the log only; the pipeline continues either way.
pub struct AcknowledgeNode;

#[async_trait]
impl Node for AcknowledgeNode {
    fn name(&self) -> &'static str {
        "acknowledge"
    }

    async fn run(&self, state: &WorkflowState, services: &BotServices) -> StateUpdate {
        let channel = state.event.channel.as_deref().unwrap_or_default();
        let ts = state.event.ts.as_deref().unwrap_or_default();

        match services.chat.add_reaction(channel, ts, ACK_REACTION).await {
            Ok(()) => StateUpdate {
                acknowledgment_sent: Some(true),
                ..StateUpdate::default()
            },
            Err(e) => {
                warn!(
                    bot = %services.bot_name,
                    channel,
                    "{}",
                    NodeError::Acknowledgment(e.to_string())
                );
                StateUpdate::none()
            },
        }
    }
}

// ── fetch context ────────────────────────────────────────────────────────

/// Pulls the thread window and assembles reasoning-service input.
pub struct FetchContextNode {
    pub limit: usize,
}

#[async_trait]
impl Node for FetchContextNode {
    fn name(&self) -> &'static str {
        "fetch_context"
    }

    async fn run(&self, state: &WorkflowState, services: &BotServices) -> StateUpdate {
        let event = &state.event;
        let channel = event.channel.as_deref().unwrap_or_default();
        let root = event.thread_root().unwrap_or_default();

        let mut history = match services.chat.fetch_thread(channel, root, self.limit).await {
            Ok(history) => history,
            Err(e) => return StateUpdate::fail(NodeError::ContextFetch(e.to_string())),
        };

        // The triggering message may not be visible in the fetched window
        // yet; make sure it participates.
        let already_present = history
            .iter()
            .any(|m| Some(m.ts.as_str()) == event.ts.as_deref());
        if !already_present {
            history.push(RawMessage {
                user: event.user.clone(),
                bot_id: event.bot_id.clone(),
                text: event.text.clone(),
                ts: event.ts.clone().unwrap_or_default(),
                thread_ts: event.thread_ts.clone(),
            });
        }

        let context = build_context(&history, self.limit);
        if context.is_empty() {
            return StateUpdate::fail(NodeError::ContextFetch(
                "no usable conversation context".into(),
            ));
        }

        debug!(
            bot = %services.bot_name,
            raw = history.len(),
            context = context.len(),
            "context assembled"
        );
        StateUpdate {
            thread_history: Some(history),
            conversation_context: Some(context),
            ..StateUpdate::default()
        }
    }
}

// ── call reasoning ───────────────────────────────────────────────────────

/// Delegates to the external reasoning service. Blank output counts as a
/// failure: there is nothing deliverable in it.
pub struct CallReasoningNode {
    pub system_prompt: String,
}

#[async_trait]
impl Node for CallReasoningNode {
    fn name(&self) -> &'static str {
        "call_reasoning"
    }

    async fn run(&self, state: &WorkflowState, services: &BotServices) -> StateUpdate {
        let output = match services
            .reasoning
            .complete(&self.system_prompt, &state.conversation_context)
            .await
        {
            Ok(output) => output,
            Err(e) => return StateUpdate::fail(NodeError::Reasoning(e.to_string())),
        };

        if output.trim().is_empty() {
            return StateUpdate::fail(NodeError::Reasoning("service returned empty output".into()));
        }

        StateUpdate {
            reasoning_output: Some(output),
            ..StateUpdate::default()
        }
    }
}

// ── normalize output ─────────────────────────────────────────────────────

/// Two-tier markup normalization: the rewriting service first, the
/// deterministic rewrite when it fails or leaves defects behind.
pub struct NormalizeOutputNode;

#[async_trait]
impl Node for NormalizeOutputNode {
    fn name(&self) -> &'static str {
        "normalize_output"
    }

    async fn run(&self, state: &WorkflowState, services: &BotServices) -> StateUpdate {
        let Some(output) = state.reasoning_output.as_deref() else {
            return StateUpdate::fail(NodeError::Normalization("reasoning output missing".into()));
        };

        if !markup::needs_normalization(output) {
            return StateUpdate {
                needs_normalization: Some(false),
                normalized_output: Some(output.to_string()),
                ..StateUpdate::default()
            };
        }

        let normalized = match services.rewriter.rewrite(output, markup::rewrite_rules()).await {
            Ok(candidate)
                if !candidate.trim().is_empty() && !markup::needs_normalization(&candidate) =>
            {
                candidate
            },
            Ok(_) => {
                debug!(bot = %services.bot_name, "rewriter left defects, using fallback");
                markup::normalize_fallback(output)
            },
            Err(e) => {
                warn!(bot = %services.bot_name, error = %e, "rewriter unavailable, using fallback");
                markup::normalize_fallback(output)
            },
        };

        if markup::needs_normalization(&normalized) {
            return StateUpdate::fail(NodeError::Normalization(
                "defects survived both tiers".into(),
            ));
        }

        StateUpdate {
            needs_normalization: Some(true),
            normalized_output: Some(normalized),
            ..StateUpdate::default()
        }
    }
}

// ── finalize ─────────────────────────────────────────────────────────────

/// Delivery cleanup: coverage banner and whitespace collapse.
pub struct FinalizeNode;

#[async_trait]
impl Node for FinalizeNode {
    fn name(&self) -> &'static str {
        "finalize"
    }

    async fn run(&self, state: &WorkflowState, _services: &BotServices) -> StateUpdate {
        let Some(normalized) = state.normalized_output.as_deref() else {
            return StateUpdate::fail(NodeError::Normalization("normalized output missing".into()));
        };
        StateUpdate {
            final_output: Some(markup::apply_post_pass(normalized)),
            ..StateUpdate::default()
        }
    }
}

// ── deliver ──────────────────────────────────────────────────────────────

/// Sends the finished answer into the originating thread. Terminal on
/// success.
pub struct DeliverNode;

#[async_trait]
impl Node for DeliverNode {
    fn name(&self) -> &'static str {
        "deliver"
    }

    async fn run(&self, state: &WorkflowState, services: &BotServices) -> StateUpdate {
        let Some(text) = state.final_output.as_deref() else {
            return StateUpdate::fail(NodeError::Delivery("final output missing".into()));
        };
        let channel = state.event.channel.as_deref().unwrap_or_default();
        let root = state.event.thread_root();

        match services.chat.send_message(channel, root, text).await {
            Ok(()) => {
                info!(bot = %services.bot_name, channel, "reply delivered");
                StateUpdate::none()
            },
            Err(e) => StateUpdate::fail(NodeError::Delivery(e.to_string())),
        }
    }
}

// ── report error ─────────────────────────────────────────────────────────

/// Terminal error node: one best-effort apology into the original thread.
/// A secondary delivery failure is logged and swallowed; nothing retries.
pub struct ReportErrorNode;

#[async_trait]
impl Node for ReportErrorNode {
    fn name(&self) -> &'static str {
        "report_error"
    }

    async fn run(&self, state: &WorkflowState, services: &BotServices) -> StateUpdate {
        warn!(
            bot = %services.bot_name,
            error = state.error.as_deref().unwrap_or("unknown"),
            "workflow failed"
        );

        let (Some(channel), Some(root)) = (state.event.channel.as_deref(), state.event.thread_root())
        else {
            return StateUpdate::none();
        };

        if let Err(e) = services.chat.send_message(channel, Some(root), APOLOGY).await {
            warn!(bot = %services.bot_name, error = %e, "could not deliver error notice");
        }
        StateUpdate::none()
    }
}

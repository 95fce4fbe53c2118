use {
    bina_common::types::{ContextMessage, RawMessage},
    bina_slack::InboundEvent,
};

use crate::error::NodeError;

/// Mutable record threaded through one workflow invocation. Owned
/// exclusively by that invocation and discarded on completion; nodes never
/// touch it directly; they return a [`StateUpdate`] the engine merges.
#[derive(Debug)]
pub struct WorkflowState {
    pub event: InboundEvent,
    pub should_process: bool,
    pub acknowledgment_sent: bool,
    pub thread_history: Vec<RawMessage>,
    pub conversation_context: Vec<ContextMessage>,
    pub message_text: Option<String>,
    pub bot_user_id: Option<String>,
    pub reasoning_output: Option<String>,
    pub needs_normalization: bool,
    pub normalized_output: Option<String>,
    pub final_output: Option<String>,
    pub error: Option<String>,
    pub error_occurred: bool,
}

impl WorkflowState {
    #[must_use]
    pub fn new(event: InboundEvent) -> Self {
        Self {
            event,
            should_process: false,
            acknowledgment_sent: false,
            thread_history: Vec::new(),
            conversation_context: Vec::new(),
            message_text: None,
            bot_user_id: None,
            reasoning_output: None,
            needs_normalization: false,
            normalized_output: None,
            final_output: None,
            error: None,
            error_occurred: false,
        }
    }

    /// Merge a node's partial update. Setting `error` latches
    /// `error_occurred`; the transition function routes every later step
    /// to the error reporter.
    pub fn apply(&mut self, update: StateUpdate) {
        if let Some(v) = update.should_process {
            self.should_process = v;
        }
        if let Some(v) = update.acknowledgment_sent {
            self.acknowledgment_sent = v;
        }
        if let Some(v) = update.thread_history {
            self.thread_history = v;
        }
        if let Some(v) = update.conversation_context {
            self.conversation_context = v;
        }
        if let Some(v) = update.message_text {
            self.message_text = Some(v);
        }
        if let Some(v) = update.bot_user_id {
            self.bot_user_id = Some(v);
        }
        if let Some(v) = update.reasoning_output {
            self.reasoning_output = Some(v);
        }
        if let Some(v) = update.needs_normalization {
            self.needs_normalization = v;
        }
        if let Some(v) = update.normalized_output {
            self.normalized_output = Some(v);
        }
        if let Some(v) = update.final_output {
            debug_assert!(self.final_output.is_none(), "final output set twice");
            self.final_output = Some(v);
        }
        if let Some(err) = update.error {
            self.error = Some(err.to_string());
            self.error_occurred = true;
        }
    }
}

/// Partial state produced by one node run. Every field is optional; unset
/// fields leave the state untouched.
#[derive(Debug, Default)]
pub struct StateUpdate {
    pub should_process: Option<bool>,
    pub acknowledgment_sent: Option<bool>,
    pub thread_history: Option<Vec<RawMessage>>,
    pub conversation_context: Option<Vec<ContextMessage>>,
    pub message_text: Option<String>,
    pub bot_user_id: Option<String>,
    pub reasoning_output: Option<String>,
    pub needs_normalization: Option<bool>,
    pub normalized_output: Option<String>,
    pub final_output: Option<String>,
    pub error: Option<NodeError>,
}

impl StateUpdate {
    #[must_use]
    pub fn none() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn fail(error: NodeError) -> Self {
        Self {
            error: Some(error),
            ..Self::default()
        }
    }
}

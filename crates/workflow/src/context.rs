use {
    bina_common::types::{ContextMessage, RawMessage, Role},
    bina_slack::markup,
};

/// Raw messages considered per invocation (standard variant).
pub const MAX_CONTEXT_MESSAGES: usize = 5;

/// Per-message content budget, in characters.
pub const MAX_CONTENT_CHARS: usize = 2000;

/// Appended when a message was cut at the budget.
pub const TRUNCATION_MARKER: &str = "… [truncated]";

/// Convert a window of raw thread messages into reasoning-service input.
///
/// Takes the `max_messages` most recent entries, preserving chronological
/// order. Blank messages and messages that are nothing but mention markup
/// are dropped; everything else is stripped to plain text and truncated to
/// the character budget. Empty input yields empty output.
#[must_use]
pub fn build_context(messages: &[RawMessage], max_messages: usize) -> Vec<ContextMessage> {
    let window_start = messages.len().saturating_sub(max_messages);
    messages[window_start..]
        .iter()
        .filter_map(|msg| {
            let text = msg.text.as_deref().unwrap_or_default();
            if text.trim().is_empty() {
                return None;
            }
            let content = markup::strip_markup(text);
            if content.is_empty() {
                return None;
            }
            Some(ContextMessage {
                role: if msg.from_bot() {
                    Role::Assistant
                } else {
                    Role::User
                },
                content: truncate_content(&content),
            })
        })
        .collect()
}

fn truncate_content(content: &str) -> String {
    if content.chars().count() <= MAX_CONTENT_CHARS {
        return content.to_string();
    }
    let mut cut: String = content.chars().take(MAX_CONTENT_CHARS).collect();
    cut.push_str(TRUNCATION_MARKER);
    cut
}

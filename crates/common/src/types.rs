use serde::{Deserialize, Serialize};

/// Who authored a conversation message, from the reasoning service's
/// point of view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// One message of reasoning-service input. Immutable once constructed;
/// content is capped by the context builder before it gets here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContextMessage {
    pub role: Role,
    pub content: String,
}

impl ContextMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// A raw thread message as returned by the chat platform's history API.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RawMessage {
    /// Platform user id of the author, when a human account.
    pub user: Option<String>,
    /// Bot account id of the author, when posted by a bot.
    pub bot_id: Option<String>,
    pub text: Option<String>,
    pub ts: String,
    pub thread_ts: Option<String>,
}

impl RawMessage {
    /// Whether this message originated from a bot account.
    #[must_use]
    pub fn from_bot(&self) -> bool {
        self.bot_id.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&Role::User).unwrap(), "\"user\"");
        assert_eq!(
            serde_json::to_string(&Role::Assistant).unwrap(),
            "\"assistant\""
        );
    }

    #[test]
    fn raw_message_bot_detection() {
        let human = RawMessage {
            user: Some("U123".into()),
            ..Default::default()
        };
        let bot = RawMessage {
            bot_id: Some("B456".into()),
            ..Default::default()
        };
        assert!(!human.from_bot());
        assert!(bot.from_bot());
    }

    #[test]
    fn raw_message_tolerates_sparse_payloads() {
        let msg: RawMessage = serde_json::from_str(r#"{"ts": "1712.001"}"#).unwrap();
        assert_eq!(msg.ts, "1712.001");
        assert!(msg.text.is_none());
        assert!(!msg.from_bot());
    }
}

use serde::Deserialize;

use crate::error::Result;

/// Outer Events API payload. `url_verification` is the platform handshake
/// and must be answered synchronously without entering the workflow.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EventEnvelope {
    UrlVerification {
        challenge: String,
    },
    EventCallback {
        event: InboundEvent,
        #[serde(default)]
        event_id: Option<String>,
    },
    #[serde(other)]
    Unsupported,
}

impl EventEnvelope {
    /// Parse a raw request body into the closed envelope model.
    pub fn parse(body: &str) -> Result<Self> {
        Ok(serde_json::from_str(body)?)
    }
}

/// One inbound chat event. All payload fields are explicit options; the
/// validate node decides what constitutes a processable event.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct InboundEvent {
    #[serde(rename = "type")]
    pub kind: String,
    pub subtype: Option<String>,
    pub channel: Option<String>,
    pub channel_type: Option<String>,
    pub user: Option<String>,
    pub bot_id: Option<String>,
    pub text: Option<String>,
    pub ts: Option<String>,
    pub thread_ts: Option<String>,
    pub event_ts: Option<String>,
}

impl InboundEvent {
    /// Key identifying this delivery for dedup purposes.
    #[must_use]
    pub fn dedup_key(&self) -> Option<String> {
        match (self.channel.as_deref(), self.ts.as_deref()) {
            (Some(channel), Some(ts)) => Some(format!("{channel}:{ts}")),
            _ => None,
        }
    }

    /// Whether the event originated from a bot account.
    #[must_use]
    pub fn from_bot(&self) -> bool {
        self.bot_id.is_some()
    }

    #[must_use]
    pub fn is_direct_message(&self) -> bool {
        if let Some(channel_type) = self.channel_type.as_deref() {
            return channel_type.eq_ignore_ascii_case("im");
        }
        self.channel
            .as_deref()
            .is_some_and(|c| c.starts_with('D'))
    }

    /// Thread to reply into: the existing thread root, or this message's
    /// own `ts` (starting a thread).
    #[must_use]
    pub fn thread_root(&self) -> Option<&str> {
        self.thread_ts.as_deref().or(self.ts.as_deref())
    }

    /// Whether the text carries a literal mention of `user_id`.
    #[must_use]
    pub fn mentions(&self, user_id: &str) -> bool {
        self.text
            .as_deref()
            .is_some_and(|t| t.contains(&format!("<@{user_id}>")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_url_verification() {
        let body = r#"{"type": "url_verification", "challenge": "ch4ll", "token": "t"}"#;
        match EventEnvelope::parse(body).unwrap() {
            EventEnvelope::UrlVerification { challenge } => assert_eq!(challenge, "ch4ll"),
            other => panic!("expected handshake, got {other:?}"),
        }
    }

    #[test]
    fn parses_event_callback() {
        let body = r#"{
            "type": "event_callback",
            "event_id": "Ev123",
            "event": {
                "type": "app_mention",
                "channel": "C01",
                "user": "U42",
                "text": "<@UBOT> hello",
                "ts": "1712.0001"
            }
        }"#;
        match EventEnvelope::parse(body).unwrap() {
            EventEnvelope::EventCallback { event, event_id } => {
                assert_eq!(event_id.as_deref(), Some("Ev123"));
                assert_eq!(event.kind, "app_mention");
                assert_eq!(event.dedup_key().unwrap(), "C01:1712.0001");
            },
            other => panic!("expected event callback, got {other:?}"),
        }
    }

    #[test]
    fn unknown_envelope_type_is_unsupported() {
        let body = r#"{"type": "app_rate_limited", "minute_rate_limited": 1}"#;
        assert!(matches!(
            EventEnvelope::parse(body).unwrap(),
            EventEnvelope::Unsupported
        ));
    }

    #[test]
    fn garbage_body_is_a_payload_error() {
        assert!(EventEnvelope::parse("not json").is_err());
    }

    #[test]
    fn dedup_key_requires_channel_and_ts() {
        let event = InboundEvent {
            channel: Some("C01".into()),
            ..Default::default()
        };
        assert!(event.dedup_key().is_none());
    }

    #[test]
    fn dm_detection_prefers_channel_type() {
        let dm = InboundEvent {
            channel: Some("C99".into()),
            channel_type: Some("im".into()),
            ..Default::default()
        };
        assert!(dm.is_direct_message());

        let channel = InboundEvent {
            channel: Some("D99".into()),
            ..Default::default()
        };
        assert!(channel.is_direct_message());
    }

    #[test]
    fn thread_root_falls_back_to_own_ts() {
        let threaded = InboundEvent {
            ts: Some("2.0".into()),
            thread_ts: Some("1.0".into()),
            ..Default::default()
        };
        assert_eq!(threaded.thread_root(), Some("1.0"));

        let fresh = InboundEvent {
            ts: Some("2.0".into()),
            ..Default::default()
        };
        assert_eq!(fresh.thread_root(), Some("2.0"));
    }

    #[test]
    fn mention_detection_is_literal() {
        let event = InboundEvent {
            text: Some("hey <@U42>, got a minute?".into()),
            ..Default::default()
        };
        assert!(event.mentions("U42"));
        assert!(!event.mentions("U4"));
    }
}

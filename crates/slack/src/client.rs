use std::time::Duration;

use {
    async_trait::async_trait,
    secrecy::{ExposeSecret, Secret},
    tracing::{debug, warn},
};

use bina_common::types::RawMessage;

use crate::{
    api::{BotInfo, ChatApi},
    error::{Error, Result},
};

const DEFAULT_BASE_URL: &str = "https://slack.com/api";

/// Every Web API call is bounded so a stalled platform cannot pin workflow
/// tasks indefinitely.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Slack Web API client for a single bot credential.
pub struct SlackClient {
    token: Secret<String>,
    base_url: String,
    client: reqwest::Client,
}

impl SlackClient {
    pub fn new(token: Secret<String>) -> Result<Self> {
        Self::with_base_url(token, DEFAULT_BASE_URL)
    }

    pub fn with_base_url(token: Secret<String>, base_url: impl Into<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self {
            token,
            base_url: base_url.into(),
            client,
        })
    }

    async fn call(&self, method: &str, body: serde_json::Value) -> Result<serde_json::Value> {
        let resp = self
            .client
            .post(format!("{}/{method}", self.base_url))
            .bearer_auth(self.token.expose_secret())
            .json(&body)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body_text = resp.text().await.unwrap_or_default();
            warn!(method, status = %status, "slack API HTTP error");
            return Err(Error::Api(format!("{method}: HTTP {status}: {body_text}")));
        }

        let payload = resp.json::<serde_json::Value>().await?;
        if payload["ok"].as_bool() != Some(true) {
            let reason = payload["error"].as_str().unwrap_or("unknown_error");
            return Err(Error::Api(format!("{method}: {reason}")));
        }
        Ok(payload)
    }
}

#[async_trait]
impl ChatApi for SlackClient {
    async fn send_message(
        &self,
        channel: &str,
        thread_ts: Option<&str>,
        text: &str,
    ) -> anyhow::Result<()> {
        let mut body = serde_json::json!({
            "channel": channel,
            "text": text,
        });
        if let Some(thread_ts) = thread_ts {
            body["thread_ts"] = serde_json::Value::String(thread_ts.to_string());
        }
        debug!(channel, threaded = thread_ts.is_some(), "posting message");
        self.call("chat.postMessage", body).await?;
        Ok(())
    }

    async fn add_reaction(&self, channel: &str, ts: &str, name: &str) -> anyhow::Result<()> {
        self.call(
            "reactions.add",
            serde_json::json!({
                "channel": channel,
                "timestamp": ts,
                "name": name,
            }),
        )
        .await?;
        Ok(())
    }

    async fn fetch_thread(
        &self,
        channel: &str,
        thread_ts: &str,
        limit: usize,
    ) -> anyhow::Result<Vec<RawMessage>> {
        let payload = self
            .call(
                "conversations.replies",
                serde_json::json!({
                    "channel": channel,
                    "ts": thread_ts,
                    "limit": limit,
                }),
            )
            .await?;
        let messages = payload["messages"].clone();
        if messages.is_null() {
            return Ok(Vec::new());
        }
        Ok(serde_json::from_value(messages).map_err(Error::Payload)?)
    }

    async fn resolve_self(&self) -> anyhow::Result<String> {
        let payload = self.call("auth.test", serde_json::json!({})).await?;
        payload["user_id"]
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| Error::Api("auth.test: missing user_id".to_string()).into())
    }

    async fn resolve_bot(&self, bot_id: &str) -> anyhow::Result<BotInfo> {
        let payload = self
            .call("bots.info", serde_json::json!({ "bot": bot_id }))
            .await?;
        let bot = &payload["bot"];
        let name = bot["name"]
            .as_str()
            .ok_or_else(|| Error::Api("bots.info: missing bot name".to_string()))?;
        Ok(BotInfo {
            id: bot_id.to_string(),
            name: name.to_string(),
            user_id: bot["user_id"].as_str().map(str::to_string),
        })
    }
}

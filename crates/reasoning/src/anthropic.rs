use std::time::Duration;

use {
    async_trait::async_trait,
    secrecy::{ExposeSecret, Secret},
    tracing::{debug, warn},
};

use bina_common::types::{ContextMessage, Role};

use crate::{Error, ReasoningService, Result, RewriteService};

const DEFAULT_BASE_URL: &str = "https://api.anthropic.com";
const DEFAULT_MODEL: &str = "claude-sonnet-4-20250514";
const MAX_TOKENS: u32 = 4096;

/// Generation can legitimately take a while; the bound exists so a stalled
/// service fails the node instead of leaking the task.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

pub struct AnthropicClient {
    api_key: Secret<String>,
    model: String,
    base_url: String,
    client: reqwest::Client,
}

impl AnthropicClient {
    pub fn new(api_key: Secret<String>) -> Result<Self> {
        Self::with_options(api_key, DEFAULT_MODEL, DEFAULT_BASE_URL)
    }

    pub fn with_options(
        api_key: Secret<String>,
        model: impl Into<String>,
        base_url: impl Into<String>,
    ) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self {
            api_key,
            model: model.into(),
            base_url: base_url.into(),
            client,
        })
    }

    async fn messages(&self, system: &str, messages: Vec<serde_json::Value>) -> Result<String> {
        let mut body = serde_json::json!({
            "model": self.model,
            "max_tokens": MAX_TOKENS,
            "messages": messages,
        });
        if !system.is_empty() {
            body["system"] = serde_json::Value::String(system.to_string());
        }

        debug!(model = %self.model, count = body["messages"].as_array().map_or(0, Vec::len), "anthropic request");

        let resp = self
            .client
            .post(format!("{}/v1/messages", self.base_url))
            .header("x-api-key", self.api_key.expose_secret())
            .header("anthropic-version", "2023-06-01")
            .header("content-type", "application/json")
            .json(&body)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body_text = resp.text().await.unwrap_or_default();
            warn!(status = %status, body = %body_text, "anthropic API error");
            return Err(Error::Api(format!("HTTP {status}: {body_text}")));
        }

        let payload = resp.json::<serde_json::Value>().await?;
        let text = payload["content"]
            .as_array()
            .map(|blocks| {
                blocks
                    .iter()
                    .filter_map(|b| {
                        if b["type"].as_str() == Some("text") {
                            b["text"].as_str()
                        } else {
                            None
                        }
                    })
                    .collect::<String>()
            })
            .unwrap_or_default();
        Ok(text)
    }
}

fn to_api_messages(messages: &[ContextMessage]) -> Vec<serde_json::Value> {
    messages
        .iter()
        .map(|m| {
            let role = match m.role {
                Role::User => "user",
                Role::Assistant => "assistant",
            };
            serde_json::json!({ "role": role, "content": m.content })
        })
        .collect()
}

#[async_trait]
impl ReasoningService for AnthropicClient {
    async fn complete(&self, system: &str, messages: &[ContextMessage]) -> anyhow::Result<String> {
        Ok(self.messages(system, to_api_messages(messages)).await?)
    }
}

#[async_trait]
impl RewriteService for AnthropicClient {
    async fn rewrite(&self, text: &str, rules: &str) -> anyhow::Result<String> {
        let messages = vec![serde_json::json!({ "role": "user", "content": text })];
        Ok(self.messages(rules, messages).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(server: &mockito::ServerGuard) -> AnthropicClient {
        AnthropicClient::with_options(
            Secret::new("sk-test".to_string()),
            "claude-test",
            server.url(),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn complete_joins_text_blocks() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/v1/messages")
            .with_body(
                r#"{"content": [
                    {"type": "text", "text": "Genesis opens "},
                    {"type": "tool_use", "id": "t", "name": "n", "input": {}},
                    {"type": "text", "text": "with creation."}
                ]}"#,
            )
            .create_async()
            .await;

        let out = client(&server)
            .complete("system", &[ContextMessage::user("what is bereshit?")])
            .await
            .unwrap();
        assert_eq!(out, "Genesis opens with creation.");
    }

    #[tokio::test]
    async fn http_failure_is_an_error() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/v1/messages")
            .with_status(529)
            .with_body("overloaded")
            .create_async()
            .await;

        let err = client(&server)
            .complete("", &[ContextMessage::user("hi")])
            .await
            .unwrap_err();
        assert!(err.to_string().contains("529"), "{err}");
    }

    #[tokio::test]
    async fn rewrite_sends_rules_as_system() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/v1/messages")
            .match_body(mockito::Matcher::PartialJson(serde_json::json!({
                "system": "the rules",
            })))
            .with_body(r#"{"content": [{"type": "text", "text": "*fixed*"}]}"#)
            .create_async()
            .await;

        let out = client(&server)
            .rewrite("**fixed**", "the rules")
            .await
            .unwrap();
        assert_eq!(out, "*fixed*");
        mock.assert_async().await;
    }

    #[test]
    fn roles_map_to_api_strings() {
        let msgs = to_api_messages(&[
            ContextMessage::user("q"),
            ContextMessage::assistant("a"),
        ]);
        assert_eq!(msgs[0]["role"], "user");
        assert_eq!(msgs[1]["role"], "assistant");
    }
}

//! Integration tests for the webhook surface: handshake, health, and the
//! dedup gate, against a real listener and in-memory collaborators.

use std::{net::SocketAddr, sync::Arc, time::Duration};

use {secrecy::Secret, tokio::net::TcpListener};

use {
    bina_gateway::{AppState, build_app},
    bina_reasoning::testing::{FailingRewriter, ScriptedReasoning},
    bina_routing::{BotIdentity, BotRegistry},
    bina_slack::{SelfIdCache, testing::RecordingChat},
    bina_workflow::{BotServices, factory_for},
};

fn test_identity(name: &str, chat: Arc<RecordingChat>) -> BotIdentity {
    let services = Arc::new(BotServices {
        bot_name: name.to_string(),
        chat,
        reasoning: Arc::new(ScriptedReasoning::new("an answer")),
        rewriter: Arc::new(FailingRewriter),
        self_ids: Arc::new(SelfIdCache::new()),
    });
    BotIdentity::new(
        name,
        Secret::new("xoxb-test".to_string()),
        Secret::new("secret".to_string()),
        None,
        services,
        factory_for(name),
    )
}

async fn start_server() -> (SocketAddr, Arc<RecordingChat>) {
    let chat = Arc::new(RecordingChat::new("U_BINA"));
    let registry = Arc::new(BotRegistry::new());
    registry.register(test_identity("bina", Arc::clone(&chat)));
    registry.register(test_identity("binah", Arc::clone(&chat)));

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let app = build_app(AppState::new(registry));
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    (addr, chat)
}

fn mention_payload(ts: &str) -> String {
    format!(
        r#"{{
            "type": "event_callback",
            "event_id": "Ev-{ts}",
            "event": {{
                "type": "app_mention",
                "channel": "C_STUDY",
                "user": "U_ASKER",
                "text": "<@U_BINA> what is the first verse?",
                "ts": "{ts}"
            }}
        }}"#
    )
}

/// Poll until the background workflow has delivered, or time out.
async fn wait_for_sends(chat: &RecordingChat, expected: usize) {
    for _ in 0..100 {
        if chat.sent_count() >= expected {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}

#[tokio::test]
async fn handshake_is_answered_synchronously() {
    let (addr, chat) = start_server().await;

    let resp = reqwest::Client::new()
        .post(format!("http://{addr}/slack/events"))
        .body(r#"{"type": "url_verification", "challenge": "tok3n"}"#)
        .send()
        .await
        .unwrap();

    assert!(resp.status().is_success());
    let body: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(body["challenge"], "tok3n");
    // The handshake never enters the workflow.
    assert_eq!(chat.sent_count(), 0);
}

#[tokio::test]
async fn health_lists_registered_bots() {
    let (addr, _chat) = start_server().await;

    let body: serde_json::Value = reqwest::get(format!("http://{addr}/health"))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert_eq!(body["count"], 2);
    assert_eq!(body["bots"][0], "bina");
    assert_eq!(body["bots"][1], "binah");
}

#[tokio::test]
async fn event_is_acknowledged_before_processing_finishes() {
    let (addr, chat) = start_server().await;

    let resp = reqwest::Client::new()
        .post(format!("http://{addr}/slack/events"))
        .body(mention_payload("1712.0001"))
        .send()
        .await
        .unwrap();
    assert!(resp.status().is_success());

    wait_for_sends(&chat, 1).await;
    let sent = chat.sent_messages();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].0, "C_STUDY");
}

#[tokio::test]
async fn duplicate_deliveries_produce_one_send() {
    let (addr, chat) = start_server().await;
    let client = reqwest::Client::new();

    for _ in 0..2 {
        let resp = client
            .post(format!("http://{addr}/slack/events"))
            .body(mention_payload("1712.0002"))
            .send()
            .await
            .unwrap();
        assert!(resp.status().is_success());
    }

    wait_for_sends(&chat, 1).await;
    // Allow any wrongly dispatched second workflow to finish too.
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(chat.sent_count(), 1, "second delivery must be suppressed");
}

#[tokio::test]
async fn malformed_payloads_are_acknowledged() {
    let (addr, chat) = start_server().await;

    let resp = reqwest::Client::new()
        .post(format!("http://{addr}/slack/events"))
        .body("this is not json")
        .send()
        .await
        .unwrap();

    assert!(resp.status().is_success());
    assert_eq!(chat.sent_count(), 0);
}

#[tokio::test]
async fn per_bot_endpoint_routes_to_that_bot() {
    let (addr, chat) = start_server().await;

    let resp = reqwest::Client::new()
        .post(format!("http://{addr}/slack/events/binah"))
        .body(mention_payload("1712.0003"))
        .send()
        .await
        .unwrap();
    assert!(resp.status().is_success());

    wait_for_sends(&chat, 1).await;
    assert_eq!(chat.sent_count(), 1);
}

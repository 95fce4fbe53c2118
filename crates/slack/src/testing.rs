//! In-memory test doubles for the platform seam, shared by downstream
//! crate tests. Not used by production code paths.

use std::{collections::HashMap, sync::Mutex};

use {anyhow::Result, async_trait::async_trait};

use bina_common::types::RawMessage;

use crate::api::{BotInfo, ChatApi};

/// A recorded outbound message: `(channel, thread_ts, text)`.
pub type SentMessage = (String, Option<String>, String);

/// Scriptable in-memory [`ChatApi`] that records every side effect.
#[derive(Default)]
pub struct RecordingChat {
    pub self_id: String,
    /// `bot_id -> bot name` answered by `resolve_bot`.
    pub bot_directory: HashMap<String, String>,
    /// Messages answered by `fetch_thread`.
    pub thread: Vec<RawMessage>,
    pub fail_sends: bool,
    pub fail_reactions: bool,
    pub fail_thread_fetch: bool,
    pub sent: Mutex<Vec<SentMessage>>,
    pub reactions: Mutex<Vec<(String, String, String)>>,
}

impl RecordingChat {
    #[must_use]
    pub fn new(self_id: impl Into<String>) -> Self {
        Self {
            self_id: self_id.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_thread(mut self, thread: Vec<RawMessage>) -> Self {
        self.thread = thread;
        self
    }

    #[must_use]
    pub fn sent_count(&self) -> usize {
        self.sent.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    #[must_use]
    pub fn sent_messages(&self) -> Vec<SentMessage> {
        self.sent
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    #[must_use]
    pub fn reaction_count(&self) -> usize {
        self.reactions
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .len()
    }
}

#[async_trait]
impl ChatApi for RecordingChat {
    async fn send_message(&self, channel: &str, thread_ts: Option<&str>, text: &str) -> Result<()> {
        if self.fail_sends {
            anyhow::bail!("send refused by test double");
        }
        self.sent
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push((channel.to_string(), thread_ts.map(str::to_string), text.to_string()));
        Ok(())
    }

    async fn add_reaction(&self, channel: &str, ts: &str, name: &str) -> Result<()> {
        if self.fail_reactions {
            anyhow::bail!("reaction refused by test double");
        }
        self.reactions
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push((channel.to_string(), ts.to_string(), name.to_string()));
        Ok(())
    }

    async fn fetch_thread(
        &self,
        _channel: &str,
        _thread_ts: &str,
        limit: usize,
    ) -> Result<Vec<RawMessage>> {
        if self.fail_thread_fetch {
            anyhow::bail!("history refused by test double");
        }
        Ok(self.thread.iter().take(limit).cloned().collect())
    }

    async fn resolve_self(&self) -> Result<String> {
        if self.self_id.is_empty() {
            anyhow::bail!("no self identity configured on test double");
        }
        Ok(self.self_id.clone())
    }

    async fn resolve_bot(&self, bot_id: &str) -> Result<BotInfo> {
        match self.bot_directory.get(bot_id) {
            Some(name) => Ok(BotInfo {
                id: bot_id.to_string(),
                name: name.clone(),
                user_id: None,
            }),
            None => anyhow::bail!("unknown bot id: {bot_id}"),
        }
    }
}

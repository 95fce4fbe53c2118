use {anyhow::Result, async_trait::async_trait};

use bina_common::types::RawMessage;

/// Identity of a bot account as reported by the platform.
#[derive(Debug, Clone)]
pub struct BotInfo {
    pub id: String,
    pub name: String,
    /// The user account backing the bot, when the platform exposes one.
    pub user_id: Option<String>,
}

/// Chat platform operations the pipeline depends on. One instance per bot
/// identity (each carries its own credential); the gateway and workflow
/// consume the trait so tests can supply fakes.
#[async_trait]
pub trait ChatApi: Send + Sync {
    /// Post a message, threading under `thread_ts` when given.
    async fn send_message(&self, channel: &str, thread_ts: Option<&str>, text: &str) -> Result<()>;

    /// Add an emoji reaction to the message at `ts`.
    async fn add_reaction(&self, channel: &str, ts: &str, name: &str) -> Result<()>;

    /// Fetch up to `limit` messages of the thread rooted at `thread_ts`,
    /// oldest first.
    async fn fetch_thread(
        &self,
        channel: &str,
        thread_ts: &str,
        limit: usize,
    ) -> Result<Vec<RawMessage>>;

    /// Resolve the user id of the authenticated bot account.
    async fn resolve_self(&self) -> Result<String>;

    /// Resolve a bot account id to its platform identity.
    async fn resolve_bot(&self, bot_id: &str) -> Result<BotInfo>;
}

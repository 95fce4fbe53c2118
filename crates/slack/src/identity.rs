use dashmap::DashMap;

use crate::api::ChatApi;

/// Cache of resolved bot user ids, keyed by bot name.
///
/// Populated lazily on the first successful identity resolution. Reads far
/// outnumber writes; concurrent first-writes for the same name are benign
/// because resolution is keyed per bot and the first inserted value wins.
#[derive(Default)]
pub struct SelfIdCache {
    ids: DashMap<String, String>,
}

impl SelfIdCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn get(&self, bot_name: &str) -> Option<String> {
        self.ids.get(bot_name).map(|id| id.value().clone())
    }

    pub fn insert(&self, bot_name: impl Into<String>, user_id: impl Into<String>) {
        self.ids.entry(bot_name.into()).or_insert_with(|| user_id.into());
    }

    /// Resolve the platform user id for `bot_name`, consulting the cache
    /// first and falling back to one identity call against the platform.
    pub async fn resolve(&self, bot_name: &str, api: &dyn ChatApi) -> anyhow::Result<String> {
        if let Some(id) = self.get(bot_name) {
            return Ok(id);
        }
        let resolved = api.resolve_self().await?;
        let entry = self
            .ids
            .entry(bot_name.to_string())
            .or_insert_with(|| resolved.clone());
        Ok(entry.value().clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use {async_trait::async_trait, bina_common::types::RawMessage};

    use crate::api::BotInfo;

    struct CountingApi {
        calls: std::sync::atomic::AtomicUsize,
    }

    #[async_trait]
    impl ChatApi for CountingApi {
        async fn send_message(
            &self,
            _channel: &str,
            _thread_ts: Option<&str>,
            _text: &str,
        ) -> anyhow::Result<()> {
            Ok(())
        }

        async fn add_reaction(&self, _channel: &str, _ts: &str, _name: &str) -> anyhow::Result<()> {
            Ok(())
        }

        async fn fetch_thread(
            &self,
            _channel: &str,
            _thread_ts: &str,
            _limit: usize,
        ) -> anyhow::Result<Vec<RawMessage>> {
            Ok(Vec::new())
        }

        async fn resolve_self(&self) -> anyhow::Result<String> {
            self.calls
                .fetch_add(1, std::sync::atomic::Ordering::SeqCst);
            Ok("U_BOT".to_string())
        }

        async fn resolve_bot(&self, bot_id: &str) -> anyhow::Result<BotInfo> {
            Ok(BotInfo {
                id: bot_id.to_string(),
                name: "bina".to_string(),
                user_id: Some("U_BOT".to_string()),
            })
        }
    }

    #[tokio::test]
    async fn resolves_once_then_serves_from_cache() {
        let cache = SelfIdCache::new();
        let api = CountingApi {
            calls: std::sync::atomic::AtomicUsize::new(0),
        };

        let first = cache.resolve("bina", &api).await.unwrap();
        let second = cache.resolve("bina", &api).await.unwrap();

        assert_eq!(first, "U_BOT");
        assert_eq!(second, "U_BOT");
        assert_eq!(api.calls.load(std::sync::atomic::Ordering::SeqCst), 1);
    }

    #[test]
    fn first_insert_wins() {
        let cache = SelfIdCache::new();
        cache.insert("bina", "U_ONE");
        cache.insert("bina", "U_TWO");
        assert_eq!(cache.get("bina").as_deref(), Some("U_ONE"));
    }
}

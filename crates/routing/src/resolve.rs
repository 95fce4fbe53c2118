use std::sync::Arc;

use {
    dashmap::DashMap,
    tracing::{debug, warn},
};

use bina_slack::InboundEvent;

use crate::registry::{BotIdentity, BotRegistry};

/// Maps an inbound event to exactly one registered identity.
///
/// Sender bot-account ids are resolved against the platform once and
/// cached; a failed or slow lookup falls back to the default identity
/// rather than stalling dispatch (the platform client enforces the call
/// timeout). Ambiguity always resolves toward the default; the validate
/// node re-checks mention targeting downstream.
pub struct EventRouter {
    registry: Arc<BotRegistry>,
    /// `bot account id -> resolved bot name`, populated on first lookup.
    resolved: DashMap<String, String>,
}

impl EventRouter {
    #[must_use]
    pub fn new(registry: Arc<BotRegistry>) -> Self {
        Self {
            registry,
            resolved: DashMap::new(),
        }
    }

    /// Select the identity for `event`. `explicit` carries the per-bot
    /// endpoint name when the request arrived on one. `None` only when
    /// the registry is empty.
    pub async fn route(
        &self,
        event: &InboundEvent,
        explicit: Option<&str>,
    ) -> Option<Arc<BotIdentity>> {
        if let Some(name) = explicit {
            if let Some(identity) = self.registry.get(name) {
                return Some(identity);
            }
            warn!(name, "explicit route names an unregistered bot, using default");
            return self.registry.default_identity();
        }

        if let Some(bot_id) = event.bot_id.as_deref()
            && let Some(name) = self.resolve_name(bot_id).await
            && let Some(identity) = self.registry.get(&name)
        {
            return Some(identity);
        }

        self.registry.default_identity()
    }

    async fn resolve_name(&self, bot_id: &str) -> Option<String> {
        if let Some(name) = self.resolved.get(bot_id) {
            return Some(name.value().clone());
        }

        let chat = {
            let identity = self.registry.default_identity()?;
            Arc::clone(&identity.services().chat)
        };
        match chat.resolve_bot(bot_id).await {
            Ok(info) => {
                let name = info.name.to_ascii_lowercase();
                debug!(bot_id, name = %name, "resolved sender bot identity");
                self.resolved
                    .entry(bot_id.to_string())
                    .or_insert_with(|| name.clone());
                Some(name)
            },
            Err(e) => {
                debug!(bot_id, error = %e, "bot identity lookup failed, using default");
                None
            },
        }
    }
}

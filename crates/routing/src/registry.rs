use std::{
    collections::HashMap,
    sync::{Arc, RwLock},
};

use secrecy::Secret;

use bina_workflow::{BotServices, Workflow, WorkflowFactory};

/// One configured bot personality: credentials plus the workflow variant
/// that answers for it. Immutable after registration; owned by the
/// registry for the process lifetime.
pub struct BotIdentity {
    name: String,
    token: Secret<String>,
    signing_secret: Secret<String>,
    description: Option<String>,
    services: Arc<BotServices>,
    factory: Arc<dyn WorkflowFactory>,
}

impl BotIdentity {
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        token: Secret<String>,
        signing_secret: Secret<String>,
        description: Option<String>,
        services: Arc<BotServices>,
        factory: Arc<dyn WorkflowFactory>,
    ) -> Self {
        Self {
            name: name.into().to_ascii_lowercase(),
            token,
            signing_secret,
            description,
            services,
            factory,
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn token(&self) -> &Secret<String> {
        &self.token
    }

    #[must_use]
    pub fn signing_secret(&self) -> &Secret<String> {
        &self.signing_secret
    }

    #[must_use]
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    #[must_use]
    pub fn variant(&self) -> &'static str {
        self.factory.variant()
    }

    #[must_use]
    pub fn services(&self) -> &Arc<BotServices> {
        &self.services
    }

    /// Build a fresh workflow instance for one invocation.
    #[must_use]
    pub fn workflow(&self) -> Workflow {
        self.factory.build(Arc::clone(&self.services))
    }
}

impl std::fmt::Debug for BotIdentity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BotIdentity")
            .field("name", &self.name)
            .field("variant", &self.variant())
            .field("token", &"[REDACTED]")
            .finish_non_exhaustive()
    }
}

#[derive(Default)]
struct Inner {
    by_name: HashMap<String, Arc<BotIdentity>>,
    order: Vec<String>,
}

/// Name-keyed catalog of bot identities. Writes happen at startup, reads
/// on every inbound event; lookups never panic, absence is a value.
#[derive(Default)]
pub struct BotRegistry {
    inner: RwLock<Inner>,
}

impl BotRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an identity. Idempotent per name: a re-registration
    /// replaces the prior entry and keeps its listing position.
    pub fn register(&self, identity: BotIdentity) {
        let mut inner = self.inner.write().unwrap_or_else(|e| e.into_inner());
        let name = identity.name().to_string();
        if inner.by_name.insert(name.clone(), Arc::new(identity)).is_none() {
            inner.order.push(name);
        }
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<Arc<BotIdentity>> {
        let inner = self.inner.read().unwrap_or_else(|e| e.into_inner());
        inner.by_name.get(&name.to_ascii_lowercase()).cloned()
    }

    #[must_use]
    pub fn has(&self, name: &str) -> bool {
        let inner = self.inner.read().unwrap_or_else(|e| e.into_inner());
        inner.by_name.contains_key(&name.to_ascii_lowercase())
    }

    /// Registered names in insertion order.
    #[must_use]
    pub fn list(&self) -> Vec<String> {
        let inner = self.inner.read().unwrap_or_else(|e| e.into_inner());
        inner.order.clone()
    }

    #[must_use]
    pub fn count(&self) -> usize {
        let inner = self.inner.read().unwrap_or_else(|e| e.into_inner());
        inner.by_name.len()
    }

    /// The identity events fall back to: the default bot name when
    /// registered, else the first-registered identity.
    #[must_use]
    pub fn default_identity(&self) -> Option<Arc<BotIdentity>> {
        let inner = self.inner.read().unwrap_or_else(|e| e.into_inner());
        if let Some(identity) = inner.by_name.get(DEFAULT_BOT_NAME) {
            return Some(Arc::clone(identity));
        }
        inner
            .order
            .first()
            .and_then(|name| inner.by_name.get(name).cloned())
    }
}

/// Matches the name the legacy credential pair registers under.
const DEFAULT_BOT_NAME: &str = "bina";

#[cfg(test)]
mod tests {
    use super::*;

    use bina_workflow::factory_for;

    use {
        bina_reasoning::testing::{FailingRewriter, ScriptedReasoning},
        bina_slack::{SelfIdCache, testing::RecordingChat},
    };

    fn identity(name: &str) -> BotIdentity {
        let services = Arc::new(BotServices {
            bot_name: name.to_string(),
            chat: Arc::new(RecordingChat::new("U_TEST")),
            reasoning: Arc::new(ScriptedReasoning::new("ok")),
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

    #[test]
    fn lookup_is_case_normalized() {
        let registry = BotRegistry::new();
        registry.register(identity("Binah"));

        assert!(registry.has("binah"));
        assert!(registry.has("BINAH"));
        assert_eq!(registry.get("Binah").map(|i| i.name().to_string()), Some("binah".into()));
    }

    #[test]
    fn missing_name_is_a_value_not_a_panic() {
        let registry = BotRegistry::new();
        assert!(registry.get("nobody").is_none());
        assert!(!registry.has("nobody"));
        assert_eq!(registry.count(), 0);
        assert!(registry.default_identity().is_none());
    }

    #[test]
    fn list_preserves_insertion_order() {
        let registry = BotRegistry::new();
        registry.register(identity("bina"));
        registry.register(identity("binah"));
        registry.register(identity("rashi"));

        assert_eq!(registry.list(), vec!["bina", "binah", "rashi"]);
        assert_eq!(registry.count(), 3);
    }

    #[test]
    fn reregistration_replaces_and_keeps_position() {
        let registry = BotRegistry::new();
        registry.register(identity("bina"));
        registry.register(identity("binah"));
        registry.register(identity("bina"));

        assert_eq!(registry.list(), vec!["bina", "binah"]);
        assert_eq!(registry.count(), 2);
    }

    #[test]
    fn default_prefers_the_flagship_name() {
        let registry = BotRegistry::new();
        registry.register(identity("rashi"));
        registry.register(identity("bina"));

        let default = registry.default_identity().map(|i| i.name().to_string());
        assert_eq!(default.as_deref(), Some("bina"));
    }

    #[test]
    fn default_falls_back_to_first_registered() {
        let registry = BotRegistry::new();
        registry.register(identity("rashi"));
        registry.register(identity("ramban"));

        let default = registry.default_identity().map(|i| i.name().to_string());
        assert_eq!(default.as_deref(), Some("rashi"));
    }

    #[test]
    fn binah_builds_the_deep_variant() {
        let registry = BotRegistry::new();
        registry.register(identity("binah"));
        let identity = registry.get("binah").map(|i| i.variant());
        assert_eq!(identity, Some("deep"));
    }

    #[test]
    fn debug_never_leaks_credentials() {
        let rendered = format!("{:?}", identity("bina"));
        assert!(!rendered.contains("xoxb-test"), "{rendered}");
    }
}

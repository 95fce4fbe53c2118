use std::sync::Arc;

use bina_routing::{BotRegistry, DedupCache, EventRouter};

/// Shared handles behind every request handler. Cheap to clone; all
/// members are process-wide singletons owned here, not globals.
#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<BotRegistry>,
    pub router: Arc<EventRouter>,
    pub dedup: Arc<DedupCache>,
}

impl AppState {
    #[must_use]
    pub fn new(registry: Arc<BotRegistry>) -> Self {
        Self {
            router: Arc::new(EventRouter::new(Arc::clone(&registry))),
            dedup: Arc::new(DedupCache::new()),
            registry,
        }
    }
}

use {
    tokio::task::JoinHandle,
    tracing::{debug, info, warn},
};

use bina_slack::InboundEvent;

use crate::state::AppState;

/// Fire-and-forget event handling: dedup gate, then route and run the
/// workflow on a background task. Never returns an error to the caller;
/// every failure is internalized by the workflow's error reporter.
///
/// The key is marked before dispatch, so an upstream redelivery racing an
/// in-flight invocation is treated as already handled.
pub fn route_and_handle(
    state: &AppState,
    event: InboundEvent,
    explicit_bot: Option<String>,
) -> Option<JoinHandle<()>> {
    if let Some(key) = event.dedup_key() {
        if !state.dedup.first_encounter(&key) {
            debug!(key, "duplicate delivery suppressed");
            return None;
        }
    }

    let state = state.clone();
    Some(tokio::spawn(async move {
        let Some(identity) = state.router.route(&event, explicit_bot.as_deref()).await else {
            warn!("no bot identities registered, dropping event");
            return;
        };

        let outcome = identity.workflow().run(event).await;
        if outcome.error_occurred {
            info!(
                bot = identity.name(),
                error = outcome.error.as_deref().unwrap_or("unknown"),
                "workflow finished with error"
            );
        }
    }))
}

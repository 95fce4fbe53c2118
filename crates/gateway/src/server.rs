use {
    axum::{
        Router,
        extract::{Path, State},
        http::StatusCode,
        response::{IntoResponse, Json, Response},
        routing::{get, post},
    },
    tracing::{debug, info, warn},
};

use bina_slack::EventEnvelope;

use crate::{dispatch, state::AppState};

/// Build the webhook router (shared between production startup and tests).
pub fn build_app(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/slack/events", post(shared_events_handler))
        .route("/slack/events/{bot}", post(bot_events_handler))
        .with_state(state)
}

/// Serve until the process is stopped.
pub async fn serve(listener: tokio::net::TcpListener, state: AppState) -> std::io::Result<()> {
    if let Ok(addr) = listener.local_addr() {
        info!(%addr, bots = state.registry.count(), "gateway listening");
    }
    axum::serve(listener, build_app(state)).await
}

async fn health_handler(State(state): State<AppState>) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok",
        "bots": state.registry.list(),
        "count": state.registry.count(),
    }))
}

async fn shared_events_handler(State(state): State<AppState>, body: String) -> Response {
    handle_events(&state, &body, None)
}

async fn bot_events_handler(
    State(state): State<AppState>,
    Path(bot): Path<String>,
    body: String,
) -> Response {
    handle_events(&state, &body, Some(bot))
}

/// Webhooks must answer fast: the handshake synchronously, everything
/// else with an immediate 200 while processing continues in the
/// background. Malformed payloads are acknowledged too; retrying them
/// cannot make them parse.
fn handle_events(state: &AppState, body: &str, explicit_bot: Option<String>) -> Response {
    match EventEnvelope::parse(body) {
        Ok(EventEnvelope::UrlVerification { challenge }) => {
            Json(serde_json::json!({ "challenge": challenge })).into_response()
        },
        Ok(EventEnvelope::EventCallback { event, event_id }) => {
            debug!(event_id = event_id.as_deref().unwrap_or("-"), "event accepted");
            let _ = dispatch::route_and_handle(state, event, explicit_bot);
            StatusCode::OK.into_response()
        },
        Ok(EventEnvelope::Unsupported) => StatusCode::OK.into_response(),
        Err(e) => {
            warn!(error = %e, "unparseable event payload acknowledged");
            StatusCode::OK.into_response()
        },
    }
}

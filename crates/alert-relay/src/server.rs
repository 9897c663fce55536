//! HTTP server for Pub/Sub push deliveries.

use axum::{
    body::Bytes,
    extract::{DefaultBodyLimit, State},
    http::StatusCode,
    response::Json,
    routing::{get, post},
    Router,
};
use serde_json::{json, Value};
use tower_http::trace::TraceLayer;
use tracing::{info, info_span, warn, Instrument};

use crate::pubsub::PushEnvelope;
use crate::relay::AlertRelay;

/// Largest push body accepted: a 10 MB Pub/Sub message grows by a third
/// once base64-encoded, plus the envelope around it.
pub const MAX_PUSH_BODY_BYTES: usize = 16 * 1024 * 1024;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    /// Relay handler, shared by all requests.
    pub relay: AlertRelay,
}

/// Build the HTTP router for the relay service.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        // Pub/Sub push endpoints
        .route("/", post(pubsub_push_handler))
        .route("/pubsub/push", post(pubsub_push_handler))
        // Health check
        .route("/health", get(health_check))
        .layer(DefaultBodyLimit::max(MAX_PUSH_BODY_BYTES))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Health check endpoint.
async fn health_check() -> Json<Value> {
    Json(json!({ "status": "healthy" }))
}

/// Handle one Pub/Sub push delivery.
///
/// Always acknowledges with `204 No Content`. A failed relay is logged, and
/// the message is not handed back to Pub/Sub for redelivery.
pub async fn pubsub_push_handler(State(state): State<AppState>, body: Bytes) -> StatusCode {
    let envelope = match PushEnvelope::from_slice(&body) {
        Ok(envelope) => envelope,
        Err(e) => {
            warn!(error = %e, "Dropping undecodable push request");
            return StatusCode::NO_CONTENT;
        }
    };

    let message_id = envelope
        .message
        .message_id
        .clone()
        .unwrap_or_else(|| "unknown".to_string());

    info!(
        message_id = %message_id,
        subscription = envelope.subscription.as_deref().unwrap_or("unknown"),
        publish_time = ?envelope.message.publish_time,
        "Received Pub/Sub push"
    );

    let event = match envelope.into_event() {
        Ok(event) => event,
        Err(e) => {
            warn!(message_id = %message_id, error = %e, "Dropping push message with undecodable data");
            return StatusCode::NO_CONTENT;
        }
    };

    state
        .relay
        .handle(event)
        .instrument(info_span!("relay", message_id = %message_id))
        .await;

    StatusCode::NO_CONTENT
}

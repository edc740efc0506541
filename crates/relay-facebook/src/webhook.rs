//! Webhook server for Facebook Messenger
//!
//! Serves the liveness page, the subscription handshake and message
//! delivery callbacks.

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use crate::api::{is_page_event, parse_webhook, verify_subscription, VerifyParams, WebhookPayload};
use crate::error::{FacebookError, Result};
use crate::handler::MessengerHandler;

/// Body of `GET /`
pub const LIVENESS_MESSAGE: &str = "Facebook Messenger Chatbot is running!";

/// Webhook server state
pub struct WebhookState {
    pub verify_token: String,
    pub handler: Arc<MessengerHandler>,
}

impl WebhookState {
    pub fn new(verify_token: impl Into<String>, handler: Arc<MessengerHandler>) -> Self {
        Self {
            verify_token: verify_token.into(),
            handler,
        }
    }
}

/// Create webhook router
pub fn create_webhook_router(state: WebhookState) -> Router {
    Router::new()
        .route("/", get(home))
        .route("/webhook", get(verify_webhook).post(receive_webhook))
        .layer(TraceLayer::new_for_http())
        .with_state(Arc::new(state))
}

/// Start webhook server on `addr` (`host:port`)
pub async fn start_webhook_server(state: WebhookState, addr: &str) -> Result<()> {
    let app = create_webhook_router(state);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| FacebookError::Server(format!("failed to bind {}: {}", addr, e)))?;

    info!("Messenger webhook server listening on {}", addr);

    axum::serve(listener, app)
        .await
        .map_err(|e| FacebookError::Server(e.to_string()))?;

    Ok(())
}

async fn home() -> &'static str {
    LIVENESS_MESSAGE
}

/// Handle the subscription handshake
async fn verify_webhook(
    State(state): State<Arc<WebhookState>>,
    Query(params): Query<VerifyParams>,
) -> Response {
    match verify_subscription(&state.verify_token, &params) {
        Ok(challenge) => (StatusCode::OK, challenge).into_response(),
        Err(FacebookError::MissingVerifyParams) => {
            (StatusCode::BAD_REQUEST, "Bad Request").into_response()
        }
        Err(_) => (StatusCode::FORBIDDEN, "Forbidden").into_response(),
    }
}

/// Handle incoming webhook
///
/// The object type is checked before the body is read as a Messenger
/// payload. Page events are acknowledged with 200 whatever happened to the
/// individual replies.
async fn receive_webhook(State(state): State<Arc<WebhookState>>, body: Bytes) -> Response {
    let body = match parse_webhook(&body) {
        Ok(body) => body,
        Err(e) => {
            warn!("Rejecting webhook: {}", e);
            return (StatusCode::BAD_REQUEST, "Bad Request").into_response();
        }
    };

    if !is_page_event(&body) {
        warn!("Ignoring webhook for object {}", body.get("object").unwrap_or(&serde_json::Value::Null));
        return (StatusCode::NOT_FOUND, "Not Found").into_response();
    }

    let payload = match WebhookPayload::from_value(body) {
        Ok(payload) => payload,
        Err(e) => {
            warn!("Rejecting page webhook: {}", e);
            return (StatusCode::BAD_REQUEST, "Bad Request").into_response();
        }
    };

    state.handler.process_payload(&payload).await;

    (StatusCode::OK, "OK").into_response()
}

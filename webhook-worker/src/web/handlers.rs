//! Webhook endpoint handlers.
//!
//! The delivery handler only:
//! 1. Authenticates the request
//! 2. Hands the accepted delivery to the dispatcher
//! 3. Returns immediately
//!
//! Event-specific processing happens downstream of the dispatcher.

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{any, get},
    Json, Router,
};
use serde::Serialize;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

use crate::dispatch::Dispatcher;
use crate::error::AuthError;
use crate::web::auth::WebhookAuthenticator;
use crate::web::response::RecordedResponse;

/// Path GitCode deliveries are posted to.
pub const WEBHOOK_PATH: &str = "/webhooks/gitcode";

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub authenticator: Arc<WebhookAuthenticator>,
    pub dispatcher: Arc<dyn Dispatcher>,
}

impl AppState {
    pub fn new(authenticator: WebhookAuthenticator, dispatcher: Arc<dyn Dispatcher>) -> Self {
        Self {
            authenticator: Arc::new(authenticator),
            dispatcher,
        }
    }
}

/// Build the application router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        // `any` so that non-POST methods reach the authenticator and get its 405.
        .route(WEBHOOK_PATH, any(gitcode_webhook))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// =============================================================================
// Health Check
// =============================================================================

/// Health check response.
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

/// Health check endpoint.
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}

// =============================================================================
// GitCode Webhook
// =============================================================================

/// Webhook response.
#[derive(Serialize)]
pub struct WebhookResponse {
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delivery_id: Option<String>,
}

/// GitCode webhook endpoint.
///
/// Rejections are answered with the plain-text response written by the
/// authenticator. Accepted deliveries are dispatched and answered with
/// `200 {"status":"enqueued"}`.
pub async fn gitcode_webhook(State(state): State<AppState>, request: Request) -> Response {
    let mut sink = RecordedResponse::new();

    let result = state
        .authenticator
        .authenticate(Some(&mut sink), Some(request))
        .await;

    let delivery = match result {
        Ok(delivery) => delivery,
        Err(AuthError::Rejected { .. }) => return sink.into_response(),
        Err(e) => {
            error!(error = %e, "webhook_authenticator_failed");
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(WebhookResponse {
                    status: "error",
                    delivery_id: None,
                }),
            )
                .into_response();
        }
    };

    if let Err(e) = state.dispatcher.dispatch(&delivery).await {
        error!(
            error = %e,
            event_type = %delivery.event_type(),
            event_guid = %delivery.event_guid(),
            "webhook_dispatch_failed"
        );
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(WebhookResponse {
                status: "error",
                delivery_id: None,
            }),
        )
            .into_response();
    }

    info!(
        event_type = %delivery.event_type(),
        event_guid = %delivery.event_guid(),
        "webhook_enqueued"
    );

    let delivery_id = Some(delivery.event_guid())
        .filter(|id| !id.is_empty())
        .map(str::to_string);

    (
        StatusCode::OK,
        Json(WebhookResponse {
            status: "enqueued",
            delivery_id,
        }),
    )
        .into_response()
}

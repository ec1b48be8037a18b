//! Web server module for handling inbound GitCode webhooks.
//!
//! This module provides a thin web server that:
//! - Receives deliveries from GitCode
//! - Authenticates them (framing checks + HMAC-SHA256 signature)
//! - Hands accepted deliveries to a dispatcher
//! - Answers rejections with a plain-text status

pub mod auth;
pub mod handlers;
pub mod payload;
pub mod response;
pub mod signature;

pub use auth::{
    AuthenticationContext, WebhookAuthenticator, EXPECTED_USER_AGENT, HEADER_EVENT_GUID,
    HEADER_EVENT_TYPE, HEADER_SIGNATURE, JSON_CONTENT_TYPE,
};
pub use handlers::{
    gitcode_webhook, health, router, AppState, HealthResponse, WebhookResponse, WEBHOOK_PATH,
};
pub use payload::{capture_payload, CaptureError, PayloadLimits};
pub use response::{is_error_status, write_error, RecordedResponse, ResponseSink};
pub use signature::{sign_payload, verify_signature, SigningSecret, SIGNATURE_PREFIX};

//! GitCode Hook - authenticating receiver for GitCode webhook deliveries.
//!
//! This library provides the modules behind the `gitcode-hook-web` binary:
//! - `web`: delivery authentication (framing checks + HMAC-SHA256) and the
//!   axum handlers around it
//! - `dispatch` / `queue`: hand-off of accepted deliveries to RabbitMQ
//! - `openapi`: thin client for the GitCode pull-request REST API
//!
//! ## Architecture
//!
//! ```text
//! GitCode → Web Server → authenticate → Dispatcher → gitcode_webhooks queue
//! ```

pub mod config;
pub mod dispatch;
pub mod error;
pub mod openapi;
pub mod queue;
pub mod web;

// Re-export commonly used types
pub use config::Config;
pub use dispatch::{Dispatcher, LogDispatcher};
pub use error::{AuthError, Rejection};
pub use queue::{Publisher, QueuedDelivery, WEBHOOK_QUEUE};
pub use web::{AppState, AuthenticationContext, WebhookAuthenticator};

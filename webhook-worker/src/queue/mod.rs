//! Queue module for RabbitMQ operations.
//!
//! This module provides:
//! - The message shape for accepted deliveries
//! - Async publisher for enqueueing them
//!
//! ## Architecture
//!
//! ```text
//! GitCode → Web Server (authenticate) → gitcode_webhooks queue → consumers
//! ```

pub mod publisher;
pub mod types;

pub use publisher::Publisher;
pub use types::{QueuedDelivery, HEADER_DELIVERY, HEADER_EVENT, WEBHOOK_QUEUE};

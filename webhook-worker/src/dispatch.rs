//! Hand-off of authenticated deliveries to downstream processing.

use anyhow::Result;
use async_trait::async_trait;
use tracing::info;

use crate::queue::{Publisher, QueuedDelivery};
use crate::web::AuthenticationContext;

/// Receives every delivery that passed authentication.
#[async_trait]
pub trait Dispatcher: Send + Sync {
    async fn dispatch(&self, delivery: &AuthenticationContext) -> Result<()>;
}

#[async_trait]
impl Dispatcher for Publisher {
    async fn dispatch(&self, delivery: &AuthenticationContext) -> Result<()> {
        self.publish_delivery(&QueuedDelivery::from(delivery)).await
    }
}

/// Dispatcher used when no broker is configured: records the delivery in
/// the log and drops it.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogDispatcher;

#[async_trait]
impl Dispatcher for LogDispatcher {
    async fn dispatch(&self, delivery: &AuthenticationContext) -> Result<()> {
        info!(
            event_type = %delivery.event_type(),
            event_guid = %delivery.event_guid(),
            payload_length = delivery.payload().len(),
            "webhook_dispatch_logged"
        );
        Ok(())
    }
}

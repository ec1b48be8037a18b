//! Queue message layout for accepted deliveries.
//!
//! The message body is the delivery payload exactly as signed by GitCode.
//! Delivery metadata travels in AMQP properties and headers so the payload
//! is never re-encoded.

use bytes::Bytes;

use crate::web::AuthenticationContext;

/// Queue name for authenticated GitCode deliveries.
pub const WEBHOOK_QUEUE: &str = "gitcode_webhooks";

/// AMQP header carrying the event type.
pub const HEADER_EVENT: &str = "x-gitcode-event";

/// AMQP header carrying the delivery GUID.
pub const HEADER_DELIVERY: &str = "x-gitcode-delivery";

/// An accepted delivery as it is placed on the queue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueuedDelivery {
    /// Value of `X-GitCode-Event`
    pub event_type: String,
    /// Value of `X-GitCode-Delivery`, if the sender supplied one
    pub delivery_id: Option<String>,
    /// Raw JSON body
    pub payload: Bytes,
}

impl QueuedDelivery {
    /// Message ID used for broker-side tracking.
    ///
    /// Falls back to the event type when no delivery GUID was sent.
    pub fn message_id(&self) -> String {
        match &self.delivery_id {
            Some(id) => format!("gitcode-{}", id),
            None => format!("gitcode-{}", self.event_type.replace(' ', "-").to_lowercase()),
        }
    }
}

impl From<&AuthenticationContext> for QueuedDelivery {
    fn from(ctx: &AuthenticationContext) -> Self {
        Self {
            event_type: ctx.event_type().to_string(),
            delivery_id: Some(ctx.event_guid())
                .filter(|id| !id.is_empty())
                .map(str::to_string),
            payload: ctx.payload().clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_id_with_delivery() {
        let delivery = QueuedDelivery {
            event_type: "Push Hook".to_string(),
            delivery_id: Some("abc-123".to_string()),
            payload: Bytes::from_static(b"{}"),
        };
        assert_eq!(delivery.message_id(), "gitcode-abc-123");
    }

    #[test]
    fn test_message_id_without_delivery() {
        let delivery = QueuedDelivery {
            event_type: "Merge Request Hook".to_string(),
            delivery_id: None,
            payload: Bytes::new(),
        };
        assert_eq!(delivery.message_id(), "gitcode-merge-request-hook");
    }
}

//! Async RabbitMQ publisher for accepted deliveries.
//!
//! This module provides a connection-managed publisher that can be shared
//! across request handlers.

use std::sync::Arc;

use anyhow::{Context, Result};
use lapin::{
    options::{BasicPublishOptions, QueueDeclareOptions},
    types::{AMQPValue, FieldTable},
    BasicProperties, Channel, Connection, ConnectionProperties,
};
use tokio::sync::RwLock;
use tracing::{info, warn};

use super::types::{QueuedDelivery, HEADER_DELIVERY, HEADER_EVENT, WEBHOOK_QUEUE};

/// Async RabbitMQ publisher with connection management.
///
/// The publisher connects lazily on first publish and reconnects when the
/// channel is no longer usable.
#[derive(Clone)]
pub struct Publisher {
    inner: Arc<PublisherInner>,
}

struct PublisherInner {
    url: String,
    connection: RwLock<Option<Connection>>,
    channel: RwLock<Option<Channel>>,
}

impl Publisher {
    /// Create a new publisher with the given RabbitMQ URL.
    pub fn new(url: String) -> Self {
        Self {
            inner: Arc::new(PublisherInner {
                url,
                connection: RwLock::new(None),
                channel: RwLock::new(None),
            }),
        }
    }

    /// Ensure we have a valid connection and channel.
    async fn ensure_connected(&self) -> Result<Channel> {
        {
            let channel = self.inner.channel.read().await;
            if let Some(ch) = channel.as_ref() {
                if ch.status().connected() {
                    return Ok(ch.clone());
                }
            }
        }

        let mut connection = self.inner.connection.write().await;
        let mut channel = self.inner.channel.write().await;

        // Another task may have reconnected while we waited for the locks.
        if let Some(ch) = channel.as_ref() {
            if ch.status().connected() {
                return Ok(ch.clone());
            }
        }

        info!("rabbitmq_publisher_connecting");

        let conn = Connection::connect(&self.inner.url, ConnectionProperties::default())
            .await
            .context("Failed to connect to RabbitMQ")?;

        info!("rabbitmq_publisher_connected");

        let ch = conn
            .create_channel()
            .await
            .context("Failed to create channel")?;

        ch.queue_declare(
            WEBHOOK_QUEUE,
            QueueDeclareOptions {
                durable: true,
                ..Default::default()
            },
            FieldTable::default(),
        )
        .await
        .context("Failed to declare webhook queue")?;

        info!(queue = WEBHOOK_QUEUE, "rabbitmq_queue_declared");

        *connection = Some(conn);
        *channel = Some(ch.clone());

        Ok(ch)
    }

    /// Publish an accepted delivery to the gitcode_webhooks queue.
    pub async fn publish_delivery(&self, delivery: &QueuedDelivery) -> Result<()> {
        let channel = self.ensure_connected().await?;

        let message_id = delivery.message_id();

        channel
            .basic_publish(
                "",
                WEBHOOK_QUEUE,
                BasicPublishOptions::default(),
                &delivery.payload,
                delivery_properties(delivery, &message_id),
            )
            .await
            .context("Failed to publish to webhook queue")?
            .await
            .context("Failed to confirm publish")?;

        info!(
            queue = WEBHOOK_QUEUE,
            message_id = %message_id,
            event_type = %delivery.event_type,
            body_length = delivery.payload.len(),
            "rabbitmq_delivery_published"
        );

        Ok(())
    }

    /// Close the connection gracefully.
    pub async fn close(&self) {
        let mut connection = self.inner.connection.write().await;
        let mut channel = self.inner.channel.write().await;

        if let Some(ch) = channel.take() {
            if let Err(e) = ch.close(200, "Normal shutdown").await {
                warn!(error = %e, "rabbitmq_channel_close_error");
            }
        }

        if let Some(conn) = connection.take() {
            if let Err(e) = conn.close(200, "Normal shutdown").await {
                warn!(error = %e, "rabbitmq_connection_close_error");
            }
        }

        info!("rabbitmq_publisher_closed");
    }
}

/// AMQP properties carrying the delivery metadata alongside the raw payload.
fn delivery_properties(delivery: &QueuedDelivery, message_id: &str) -> BasicProperties {
    let mut headers = FieldTable::default();
    headers.insert(
        HEADER_EVENT.into(),
        AMQPValue::LongString(delivery.event_type.clone().into()),
    );
    if let Some(id) = &delivery.delivery_id {
        headers.insert(HEADER_DELIVERY.into(), AMQPValue::LongString(id.clone().into()));
    }

    BasicProperties::default()
        .with_delivery_mode(2) // Persistent
        .with_content_type("application/json".into())
        .with_type(delivery.event_type.clone().into())
        .with_message_id(message_id.to_string().into())
        .with_headers(headers)
}

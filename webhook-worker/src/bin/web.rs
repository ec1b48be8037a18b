//! GitCode Hook Web Server - authenticating webhook receiver.
//!
//! This binary provides a thin web server that:
//! - Receives deliveries from GitCode
//! - Verifies framing and the HMAC-SHA256 signature
//! - Hands accepted deliveries to RabbitMQ (or the log, without a broker)
//! - Answers rejections with the matching status code

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use tokio::{net::TcpListener, signal};
use tracing::info;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use gitcode_hook::web::{router, WEBHOOK_PATH};
use gitcode_hook::{
    AppState, Config, Dispatcher, LogDispatcher, Publisher, WebhookAuthenticator,
};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize structured JSON logging
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().json().flatten_event(true))
        .init();

    info!("web_server_starting");

    let config = Config::from_env();
    info!(
        port = config.port,
        webhook_secret_configured = config.webhook_secret.is_some(),
        broker_configured = config.cloudamqp_url.is_some(),
        max_payload_bytes = config.max_payload_bytes,
        read_timeout_ms = config.read_timeout_ms,
        "config_loaded"
    );

    let secret = config
        .webhook_secret
        .as_deref()
        .ok_or_else(|| anyhow!("GITCODE_WEBHOOK_SECRET must be set"))?;
    let authenticator = WebhookAuthenticator::new(secret)
        .context("Invalid webhook secret")?
        .with_limits(config.payload_limits())
        .context("Invalid webhook payload limits")?;

    let publisher = config.cloudamqp_url.clone().map(Publisher::new);
    let dispatcher: Arc<dyn Dispatcher> = match &publisher {
        Some(publisher) => {
            info!("rabbitmq_publisher_created");
            Arc::new(publisher.clone())
        }
        None => {
            info!("dispatcher_log_only");
            Arc::new(LogDispatcher)
        }
    };

    let app = router(AppState::new(authenticator, dispatcher));

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = TcpListener::bind(addr)
        .await
        .context("Failed to bind to address")?;

    info!(address = %addr, path = WEBHOOK_PATH, "web_server_listening");

    // Run server with graceful shutdown
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    if let Some(publisher) = publisher {
        publisher.close().await;
    }

    info!("web_server_shutdown_complete");

    Ok(())
}

/// Create a future that completes when a shutdown signal is received.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "ctrl_c_handler_failed");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "sigterm_handler_failed");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received SIGINT"),
        _ = terminate => info!("Received SIGTERM"),
    }

    info!("web_server_shutting_down");
}

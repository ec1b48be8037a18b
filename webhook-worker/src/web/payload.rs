//! Single-shot capture of a delivery body.

use std::time::Duration;

use axum::body::{self, Body, Bytes};
use tracing::warn;

/// Bounds applied while reading a body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PayloadLimits {
    /// Largest body accepted, in bytes.
    pub max_bytes: usize,
    /// Deadline for draining the whole body.
    pub read_timeout: Duration,
}

impl Default for PayloadLimits {
    fn default() -> Self {
        Self {
            max_bytes: 25 * 1024 * 1024,
            read_timeout: Duration::from_secs(10),
        }
    }
}

/// Why a body could not be captured.
#[derive(Debug, thiserror::Error)]
pub enum CaptureError {
    #[error("failed to read request body: {0}")]
    Read(#[from] axum::Error),
    #[error("timed out after {0:?} reading request body")]
    Timeout(Duration),
}

/// Read the whole body into an owned buffer.
///
/// `None` stands for a request without a body and yields an empty payload.
/// The body is consumed on every path, so the underlying stream is released
/// whether the read succeeds, fails, or times out.
pub async fn capture_payload(
    body: Option<Body>,
    limits: PayloadLimits,
) -> Result<Bytes, CaptureError> {
    let body = match body {
        Some(body) => body,
        None => return Ok(Bytes::new()),
    };

    match tokio::time::timeout(limits.read_timeout, body::to_bytes(body, limits.max_bytes)).await
    {
        Ok(Ok(bytes)) => Ok(bytes),
        Ok(Err(e)) => {
            warn!(error = %e, max_bytes = limits.max_bytes, "webhook_body_read_failed");
            Err(CaptureError::Read(e))
        }
        Err(_) => {
            warn!(
                timeout_ms = limits.read_timeout.as_millis() as u64,
                "webhook_body_read_timeout"
            );
            Err(CaptureError::Timeout(limits.read_timeout))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_capture_absent_body() {
        let bytes = capture_payload(None, PayloadLimits::default()).await.unwrap();
        assert!(bytes.is_empty());
    }

    #[tokio::test]
    async fn test_capture_empty_body() {
        let bytes = capture_payload(Some(Body::empty()), PayloadLimits::default())
            .await
            .unwrap();
        assert!(bytes.is_empty());
    }

    #[tokio::test]
    async fn test_capture_exact_bytes() {
        let raw: &[u8] = b"  {\"a\":1}\r\n\x00\xff ";
        let bytes = capture_payload(Some(Body::from(raw.to_vec())), PayloadLimits::default())
            .await
            .unwrap();
        assert_eq!(&bytes[..], raw);
    }

    #[tokio::test]
    async fn test_capture_too_large() {
        let limits = PayloadLimits {
            max_bytes: 4,
            ..PayloadLimits::default()
        };
        let result = capture_payload(Some(Body::from("12345")), limits).await;
        assert!(matches!(result, Err(CaptureError::Read(_))));
    }

    #[tokio::test]
    async fn test_capture_stream_error() {
        let stream = futures::stream::iter(vec![
            Ok(Bytes::from_static(b"{\"partial\":")),
            Err(std::io::Error::new(
                std::io::ErrorKind::ConnectionReset,
                "peer went away",
            )),
        ]);
        let result = capture_payload(Some(Body::from_stream(stream)), PayloadLimits::default()).await;
        assert!(matches!(result, Err(CaptureError::Read(_))));
    }

    #[tokio::test]
    async fn test_capture_stalled_body_times_out() {
        let stream = futures::stream::pending::<Result<Bytes, std::io::Error>>();
        let limits = PayloadLimits {
            read_timeout: Duration::from_millis(50),
            ..PayloadLimits::default()
        };
        let result = capture_payload(Some(Body::from_stream(stream)), limits).await;
        assert!(matches!(result, Err(CaptureError::Timeout(_))));
    }
}

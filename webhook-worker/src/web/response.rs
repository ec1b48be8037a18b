//! Writing rejection responses.
//!
//! The authenticator writes rejections into a [`ResponseSink`] and returns
//! an equivalent [`AuthError`] to its caller, so both the sender and the
//! caller observe the same outcome.

use axum::{
    body::Body,
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};

use crate::error::AuthError;

/// Destination for an error response.
///
/// Implementations must accept the status before any body bytes.
pub trait ResponseSink: Send {
    fn write_status(&mut self, status: StatusCode);
    fn write_body(&mut self, body: &[u8]);
}

/// A response captured in memory, later turned into an axum [`Response`].
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RecordedResponse {
    status: Option<StatusCode>,
    body: Vec<u8>,
}

impl RecordedResponse {
    /// An empty recording with no status yet.
    pub fn new() -> Self {
        Self::default()
    }

    /// Status written so far, if any.
    pub fn status(&self) -> Option<StatusCode> {
        self.status
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// True until something has been written.
    pub fn is_empty(&self) -> bool {
        self.status.is_none() && self.body.is_empty()
    }
}

impl ResponseSink for RecordedResponse {
    fn write_status(&mut self, status: StatusCode) {
        // First status wins, as with a real response writer.
        if self.status.is_none() {
            self.status = Some(status);
        }
    }

    fn write_body(&mut self, body: &[u8]) {
        if self.status.is_none() {
            self.status = Some(StatusCode::OK);
        }
        self.body.extend_from_slice(body);
    }
}

impl IntoResponse for RecordedResponse {
    fn into_response(self) -> Response {
        let status = self.status.unwrap_or(StatusCode::OK);
        let mut response = Response::new(Body::from(self.body));
        *response.status_mut() = status;
        let headers = response.headers_mut();
        headers.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("text/plain; charset=utf-8"),
        );
        headers.insert(
            header::X_CONTENT_TYPE_OPTIONS,
            HeaderValue::from_static("nosniff"),
        );
        response
    }
}

/// Whether `status` lies in a registered client or server error range
/// (400-451, 500-511).
pub fn is_error_status(status: u16) -> bool {
    (400..=451).contains(&status) || (500..=511).contains(&status)
}

/// Write an error response and return the matching error for the caller.
///
/// The status range is checked first so that a misuse never reaches the
/// sender, then the sink.
pub fn write_error(
    sink: Option<&mut dyn ResponseSink>,
    status: u16,
    message: &str,
) -> AuthError {
    if !is_error_status(status) {
        return AuthError::InvalidStatusCodeUsage(status);
    }
    let status = match StatusCode::from_u16(status) {
        Ok(status) => status,
        Err(_) => return AuthError::InvalidStatusCodeUsage(status),
    };
    let sink = match sink {
        Some(sink) => sink,
        None => return AuthError::NilResponseSink,
    };

    sink.write_status(status);
    sink.write_body(message.as_bytes());

    AuthError::Rejected {
        status,
        message: message.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_error_records_status_then_body() {
        let mut sink = RecordedResponse::new();
        let err = write_error(Some(&mut sink), 401, "401 Unauthorized: Missing X-GitCode-Token");

        assert_eq!(sink.status(), Some(StatusCode::UNAUTHORIZED));
        assert_eq!(sink.body(), b"401 Unauthorized: Missing X-GitCode-Token");
        assert_eq!(
            err,
            AuthError::Rejected {
                status: StatusCode::UNAUTHORIZED,
                message: "401 Unauthorized: Missing X-GitCode-Token".to_string(),
            }
        );
    }

    #[test]
    fn test_write_error_rejects_non_error_codes() {
        for code in [100, 200, 204, 302, 399, 452, 499, 512, 600] {
            let mut sink = RecordedResponse::new();
            let err = write_error(Some(&mut sink), code, "nope");
            assert_eq!(err, AuthError::InvalidStatusCodeUsage(code));
            assert!(sink.is_empty(), "code {} must not be written", code);
        }
    }

    #[test]
    fn test_write_error_accepts_boundaries() {
        for code in [400, 451, 500, 511] {
            let mut sink = RecordedResponse::new();
            let err = write_error(Some(&mut sink), code, "boundary");
            assert_eq!(err.status().map(|s| s.as_u16()), Some(code));
        }
    }

    #[test]
    fn test_write_error_without_sink() {
        assert_eq!(write_error(None, 400, "bad"), AuthError::NilResponseSink);
        // Range misuse is reported even without a sink.
        assert_eq!(
            write_error(None, 200, "ok"),
            AuthError::InvalidStatusCodeUsage(200)
        );
    }

    #[test]
    fn test_recorded_response_into_response() {
        let mut sink = RecordedResponse::new();
        let _ = write_error(Some(&mut sink), 403, "403 Forbidden: Invalid X-GitCode-Token");
        let response = sink.into_response();

        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        assert_eq!(
            response.headers().get(header::CONTENT_TYPE).unwrap(),
            "text/plain; charset=utf-8"
        );
        assert_eq!(
            response.headers().get(header::X_CONTENT_TYPE_OPTIONS).unwrap(),
            "nosniff"
        );
    }
}

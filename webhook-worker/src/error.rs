//! Error taxonomy for webhook authentication.
//!
//! Every rejection maps to a fixed HTTP status and a fixed plain-text message
//! that is written back to the sender.

use axum::http::StatusCode;
use thiserror::Error;

/// Why a delivery was turned away.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    /// The request method was not `POST`.
    MethodNotAllowed,
    /// `User-Agent` did not identify the GitCode webhook sender.
    InvalidSender,
    /// `Content-Type` was missing or not `application/json`.
    UnsupportedMediaType,
    /// `X-GitCode-Event` was missing or empty.
    MissingEventType,
    /// The body could not be fully read.
    BodyReadFailure,
    /// `X-GitCode-Signature-256` was missing or empty.
    MissingSignature,
    /// A signature was offered but did not match the payload.
    InvalidSignature,
}

impl Rejection {
    /// Status code written to the sender.
    pub fn status(self) -> StatusCode {
        match self {
            Rejection::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            Rejection::InvalidSender
            | Rejection::UnsupportedMediaType
            | Rejection::MissingEventType
            | Rejection::BodyReadFailure => StatusCode::BAD_REQUEST,
            Rejection::MissingSignature => StatusCode::UNAUTHORIZED,
            Rejection::InvalidSignature => StatusCode::FORBIDDEN,
        }
    }

    /// Plain-text body written to the sender.
    pub fn message(self) -> &'static str {
        match self {
            Rejection::MethodNotAllowed => "Method Not Allowed",
            Rejection::InvalidSender => "400 Bad Request: Invalid User-Agent Header",
            Rejection::UnsupportedMediaType => {
                "400 Bad Request: Hook only accepts content-type: application/json"
            }
            Rejection::MissingEventType => "400 Bad Request: Missing X-GitCode-Event Header",
            Rejection::BodyReadFailure => "400 Bad Request: Failed to read request body",
            Rejection::MissingSignature => "401 Unauthorized: Missing X-GitCode-Token",
            Rejection::InvalidSignature => "403 Forbidden: Invalid X-GitCode-Token",
        }
    }

    /// Short snake_case label used in log events.
    pub fn reason(self) -> &'static str {
        match self {
            Rejection::MethodNotAllowed => "method_not_allowed",
            Rejection::InvalidSender => "invalid_sender",
            Rejection::UnsupportedMediaType => "unsupported_media_type",
            Rejection::MissingEventType => "missing_event_type",
            Rejection::BodyReadFailure => "body_read_failure",
            Rejection::MissingSignature => "missing_signature",
            Rejection::InvalidSignature => "invalid_signature",
        }
    }
}

/// Errors surfaced by the authenticator to its caller.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AuthError {
    /// The authenticator was configured with an unusable value.
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(&'static str),

    /// No request was handed to the authenticator.
    #[error("http request should be non-nil")]
    NilRequest,

    /// No response sink was available to write a rejection into.
    #[error("http response should be non-nil")]
    NilResponseSink,

    /// The error path was asked to write a status outside the error ranges.
    #[error("http response status code can not be setting to {0}")]
    InvalidStatusCodeUsage(u16),

    /// The delivery was rejected and the response has been written.
    #[error("{message}")]
    Rejected {
        status: StatusCode,
        message: String,
    },
}

impl AuthError {
    /// Status written to the sender, if any was.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            AuthError::Rejected { status, .. } => Some(*status),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejection_statuses() {
        assert_eq!(Rejection::MethodNotAllowed.status(), StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(Rejection::InvalidSender.status(), StatusCode::BAD_REQUEST);
        assert_eq!(Rejection::UnsupportedMediaType.status(), StatusCode::BAD_REQUEST);
        assert_eq!(Rejection::MissingEventType.status(), StatusCode::BAD_REQUEST);
        assert_eq!(Rejection::BodyReadFailure.status(), StatusCode::BAD_REQUEST);
        assert_eq!(Rejection::MissingSignature.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(Rejection::InvalidSignature.status(), StatusCode::FORBIDDEN);
    }

    #[test]
    fn test_missing_and_invalid_signature_are_distinct() {
        assert_ne!(
            Rejection::MissingSignature.status(),
            Rejection::InvalidSignature.status()
        );
        assert_ne!(
            Rejection::MissingSignature.message(),
            Rejection::InvalidSignature.message()
        );
    }

    #[test]
    fn test_error_display() {
        assert_eq!(
            AuthError::InvalidStatusCodeUsage(200).to_string(),
            "http response status code can not be setting to 200"
        );
        let rejected = AuthError::Rejected {
            status: StatusCode::FORBIDDEN,
            message: Rejection::InvalidSignature.message().to_string(),
        };
        assert_eq!(rejected.to_string(), "403 Forbidden: Invalid X-GitCode-Token");
        assert_eq!(rejected.status(), Some(StatusCode::FORBIDDEN));
        assert_eq!(AuthError::NilRequest.status(), None);
    }
}

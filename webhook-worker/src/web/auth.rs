//! GitCode webhook authentication.
//!
//! Each delivery passes through an ordered, fail-fast sequence:
//!
//! ```text
//! method → User-Agent → Content-Type → event header → signature header
//!        → body capture → HMAC verification → accepted
//! ```
//!
//! Cheap header checks run before the body is read, and the presence of a
//! signature is checked before any MAC is computed, so a request with no
//! credential (401) is never confused with a request carrying a wrong one
//! (403).

use std::borrow::Cow;

use axum::{
    body::{Body, Bytes},
    extract::Request,
    http::{header, HeaderMap, Method},
};
use tracing::{debug, info, warn};

use crate::error::{AuthError, Rejection};
use crate::web::payload::{capture_payload, PayloadLimits};
use crate::web::response::{write_error, ResponseSink};
use crate::web::signature::{verify_signature, SigningSecret};

/// Header carrying the event type, e.g. `Merge Request Hook`.
pub const HEADER_EVENT_TYPE: &str = "X-GitCode-Event";
/// Header carrying the delivery identifier.
pub const HEADER_EVENT_GUID: &str = "X-GitCode-Delivery";
/// Header carrying the `sha256=` signature.
pub const HEADER_SIGNATURE: &str = "X-GitCode-Signature-256";
/// `User-Agent` sent by the GitCode webhook sender.
pub const EXPECTED_USER_AGENT: &str = "git-gitcode-hook";
/// Required `Content-Type` prefix.
pub const JSON_CONTENT_TYPE: &str = "application/json";

/// Everything extracted from an accepted delivery.
///
/// Built fresh for every request and handed to the caller by value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticationContext {
    payload: Bytes,
    event_type: String,
    event_guid: String,
}

impl AuthenticationContext {
    /// The body exactly as signed by the sender.
    pub fn payload(&self) -> &Bytes {
        &self.payload
    }

    /// Value of `X-GitCode-Event`; never empty.
    pub fn event_type(&self) -> &str {
        &self.event_type
    }

    /// Value of `X-GitCode-Delivery`; may be empty.
    pub fn event_guid(&self) -> &str {
        &self.event_guid
    }

    /// Take ownership of the payload, dropping the header values.
    pub fn into_payload(self) -> Bytes {
        self.payload
    }
}

/// Verifies inbound GitCode deliveries against a shared secret.
///
/// Holds no per-request state and can be shared across tasks behind an
/// `Arc`.
#[derive(Debug, Clone)]
pub struct WebhookAuthenticator {
    secret: SigningSecret,
    limits: PayloadLimits,
}

impl WebhookAuthenticator {
    /// Create an authenticator, rejecting an empty secret up front.
    pub fn new(secret: impl AsRef<[u8]>) -> Result<Self, AuthError> {
        Ok(Self {
            secret: SigningSecret::new(secret)?,
            limits: PayloadLimits::default(),
        })
    }

    /// Override the body size and read deadline.
    ///
    /// Both the size limit and the deadline must be non-zero.
    pub fn with_limits(mut self, limits: PayloadLimits) -> Result<Self, AuthError> {
        if limits.max_bytes == 0 {
            return Err(AuthError::InvalidConfiguration(
                "max payload size must be greater than zero",
            ));
        }
        if limits.read_timeout.is_zero() {
            return Err(AuthError::InvalidConfiguration(
                "read timeout must be greater than zero",
            ));
        }
        self.limits = limits;
        Ok(self)
    }

    /// Replace the shared secret. An empty secret leaves the old one in place.
    pub fn set_secret(&mut self, secret: impl AsRef<[u8]>) -> Result<(), AuthError> {
        self.secret = SigningSecret::new(secret)?;
        Ok(())
    }

    /// Limits applied to every body capture.
    pub fn limits(&self) -> PayloadLimits {
        self.limits
    }

    /// Authenticate one delivery.
    ///
    /// On rejection the response has already been written into `sink` and
    /// the returned error mirrors it. `None` for `request` or `sink` maps to
    /// [`AuthError::NilRequest`] / [`AuthError::NilResponseSink`].
    pub async fn authenticate(
        &self,
        sink: Option<&mut dyn ResponseSink>,
        request: Option<Request>,
    ) -> Result<AuthenticationContext, AuthError> {
        let request = match request {
            Some(request) => request,
            None => return Err(AuthError::NilRequest),
        };

        let (parts, body) = request.into_parts();
        self.authenticate_parts(sink, &parts.method, &parts.headers, Some(body))
            .await
    }

    /// Authenticate a delivery whose body is supplied separately.
    ///
    /// `body` of `None` means the request had no body at all, which is
    /// accepted as a zero-length payload.
    pub async fn authenticate_parts(
        &self,
        sink: Option<&mut dyn ResponseSink>,
        method: &Method,
        headers: &HeaderMap,
        body: Option<Body>,
    ) -> Result<AuthenticationContext, AuthError> {
        let (event_type, event_guid, signature) = match check_headers(method, headers) {
            Ok(checked) => checked,
            Err(rejection) => return Err(reject(sink, rejection)),
        };

        let payload = match capture_payload(body, self.limits).await {
            Ok(payload) => payload,
            Err(e) => {
                debug!(error = %e, "webhook_capture_failed");
                return Err(reject(sink, Rejection::BodyReadFailure));
            }
        };

        if !verify_signature(&signature, self.secret.expose_secret(), &payload) {
            return Err(reject(sink, Rejection::InvalidSignature));
        }

        info!(
            event_type = %event_type,
            event_guid = %event_guid,
            payload_length = payload.len(),
            "webhook_authenticated"
        );

        Ok(AuthenticationContext {
            payload,
            event_type,
            event_guid,
        })
    }
}

/// Run the method and header checks in order.
///
/// Returns `(event_type, event_guid, signature)` on success.
fn check_headers(
    method: &Method,
    headers: &HeaderMap,
) -> Result<(String, String, String), Rejection> {
    if *method != Method::POST {
        return Err(Rejection::MethodNotAllowed);
    }

    if header_str(headers, header::USER_AGENT.as_str()) != EXPECTED_USER_AGENT {
        return Err(Rejection::InvalidSender);
    }

    if !header_str(headers, header::CONTENT_TYPE.as_str()).starts_with(JSON_CONTENT_TYPE) {
        return Err(Rejection::UnsupportedMediaType);
    }

    let event_type = header_str(headers, HEADER_EVENT_TYPE);
    if event_type.is_empty() {
        return Err(Rejection::MissingEventType);
    }

    let signature = header_str(headers, HEADER_SIGNATURE);
    if signature.is_empty() {
        return Err(Rejection::MissingSignature);
    }

    Ok((
        event_type.into_owned(),
        header_str(headers, HEADER_EVENT_GUID).into_owned(),
        signature.into_owned(),
    ))
}

/// First value of a header, or `""` if absent.
///
/// Values are decoded as UTF-8 rather than restricted to visible ASCII;
/// invalid sequences are replaced instead of dropping the whole value.
fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Cow<'a, str> {
    match headers.get(name) {
        Some(value) => String::from_utf8_lossy(value.as_bytes()),
        None => Cow::Borrowed(""),
    }
}

fn reject(sink: Option<&mut dyn ResponseSink>, rejection: Rejection) -> AuthError {
    warn!(
        status = rejection.status().as_u16(),
        reason = rejection.reason(),
        "webhook_rejected"
    );
    write_error(sink, rejection.status().as_u16(), rejection.message())
}

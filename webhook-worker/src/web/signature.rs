//! GitCode webhook signature verification.
//!
//! GitCode signs each delivery with HMAC-SHA256 over the raw request body,
//! keyed by the hook's secret, and sends it as
//! `X-GitCode-Signature-256: sha256=<lowercase hex digest>`.

use std::fmt;
use std::sync::Arc;

use hmac::{Hmac, Mac};
use sha2::Sha256;
use subtle::ConstantTimeEq;
use tracing::warn;

use crate::error::AuthError;

type HmacSha256 = Hmac<Sha256>;

/// Scheme prefix carried by every signature header value.
pub const SIGNATURE_PREFIX: &str = "sha256=";

/// Shared webhook secret.
///
/// Cheap to clone and safe to read from any number of tasks. `Debug` and
/// `Display` never print the key material.
#[derive(Clone)]
pub struct SigningSecret {
    key: Arc<[u8]>,
}

impl SigningSecret {
    /// Wrap a secret, rejecting an empty one.
    pub fn new(secret: impl AsRef<[u8]>) -> Result<Self, AuthError> {
        let secret = secret.as_ref();
        if secret.is_empty() {
            return Err(AuthError::InvalidConfiguration(
                "token should be non-nil/non-empty",
            ));
        }
        Ok(Self { key: Arc::from(secret) })
    }

    /// Raw key material. Never log the result.
    pub fn expose_secret(&self) -> &[u8] {
        &self.key
    }
}

impl fmt::Debug for SigningSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SigningSecret([REDACTED])")
    }
}

impl fmt::Display for SigningSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[REDACTED]")
    }
}

/// Compute the lowercase hex HMAC-SHA256 of `payload` keyed by `secret`.
fn hmac_hex(secret: &[u8], payload: &[u8]) -> Option<String> {
    let mut mac = match HmacSha256::new_from_slice(secret) {
        Ok(m) => m,
        Err(_) => {
            warn!("webhook_signature_invalid_key");
            return None;
        }
    };
    mac.update(payload);
    Some(hex::encode(mac.finalize().into_bytes()))
}

/// Produce the `X-GitCode-Signature-256` header value for a payload.
pub fn sign_payload(secret: &SigningSecret, payload: &[u8]) -> Result<String, AuthError> {
    hmac_hex(secret.expose_secret(), payload)
        .map(|digest| format!("{}{}", SIGNATURE_PREFIX, digest))
        .ok_or(AuthError::InvalidConfiguration("secret is not a valid HMAC key"))
}

/// Verify a GitCode webhook signature.
///
/// # Arguments
///
/// * `signature` - The full `X-GitCode-Signature-256` header value
/// * `secret` - The hook's shared secret
/// * `payload` - The request body exactly as received
///
/// # Returns
///
/// `true` only if the header carries the `sha256=` scheme and its digest
/// matches. A header without the scheme is rejected before any MAC is
/// computed.
pub fn verify_signature(signature: &str, secret: &[u8], payload: &[u8]) -> bool {
    let provided = match signature.strip_prefix(SIGNATURE_PREFIX) {
        Some(digest) => digest,
        None => {
            warn!(
                signature_length = signature.len(),
                "webhook_signature_missing_scheme"
            );
            return false;
        }
    };

    let expected = match hmac_hex(secret, payload) {
        Some(digest) => digest,
        None => return false,
    };

    let valid = constant_time_compare(&expected, provided);

    if !valid {
        warn!(
            expected_length = expected.len(),
            actual_length = provided.len(),
            payload_length = payload.len(),
            "webhook_signature_mismatch"
        );
    }

    valid
}

/// Constant-time string comparison to prevent timing attacks.
///
/// Only the lengths leak; a digest's length is public.
fn constant_time_compare(a: &str, b: &str) -> bool {
    bool::from(a.as_bytes().ct_eq(b.as_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn secret(s: &str) -> SigningSecret {
        SigningSecret::new(s).unwrap()
    }

    #[test]
    fn test_empty_secret_rejected() {
        assert!(matches!(
            SigningSecret::new(""),
            Err(AuthError::InvalidConfiguration(_))
        ));
        assert!(matches!(
            SigningSecret::new(Vec::<u8>::new()),
            Err(AuthError::InvalidConfiguration(_))
        ));
    }

    #[test]
    fn test_secret_is_redacted() {
        let s = secret("s3cr3t");
        assert!(!format!("{:?}", s).contains("s3cr3t"));
        assert_eq!(s.to_string(), "[REDACTED]");
        assert_eq!(s.expose_secret(), b"s3cr3t");
    }

    #[test]
    fn test_sign_known_vector() {
        // RFC 4231 test case 2
        let s = secret("Jefe");
        let sig = sign_payload(&s, b"what do ya want for nothing?").unwrap();
        assert_eq!(
            sig,
            "sha256=5bdcc146bf60754e6a042426089575c75a003f089d2739839dec58b964ec3843"
        );
    }

    #[test]
    fn test_verify_signature_valid() {
        let s = secret("s3cr3t");
        let payload = br#"{"a":1}"#;
        let sig = sign_payload(&s, payload).unwrap();
        assert!(verify_signature(&sig, s.expose_secret(), payload));
    }

    #[test]
    fn test_verify_signature_missing_prefix() {
        let s = secret("s3cr3t");
        let payload = br#"{"a":1}"#;
        let sig = sign_payload(&s, payload).unwrap();
        let bare = sig.strip_prefix(SIGNATURE_PREFIX).unwrap();
        assert!(!verify_signature(bare, s.expose_secret(), payload));
        assert!(!verify_signature(
            &format!("sha1={}", bare),
            s.expose_secret(),
            payload
        ));
    }

    #[test]
    fn test_verify_signature_uppercase_hex_rejected() {
        let s = secret("s3cr3t");
        let payload = b"payload";
        let sig = sign_payload(&s, payload).unwrap();
        let upper = format!(
            "{}{}",
            SIGNATURE_PREFIX,
            sig.strip_prefix(SIGNATURE_PREFIX).unwrap().to_uppercase()
        );
        assert!(!verify_signature(&upper, s.expose_secret(), payload));
    }

    #[test]
    fn test_verify_signature_wrong_payload() {
        let s = secret("s3cr3t");
        let sig = sign_payload(&s, br#"{"a":1}"#).unwrap();
        assert!(!verify_signature(&sig, s.expose_secret(), br#"{"a":1} "#));
        assert!(!verify_signature(&sig, s.expose_secret(), b""));
    }

    #[test]
    fn test_verify_signature_truncated() {
        let s = secret("s3cr3t");
        let sig = sign_payload(&s, b"x").unwrap();
        assert!(!verify_signature(&sig[..sig.len() - 1], s.expose_secret(), b"x"));
        assert!(!verify_signature(SIGNATURE_PREFIX, s.expose_secret(), b"x"));
    }

    #[test]
    fn test_constant_time_compare() {
        assert!(constant_time_compare("abc", "abc"));
        assert!(!constant_time_compare("abc", "abd"));
        assert!(!constant_time_compare("abc", "abcd"));
        assert!(constant_time_compare("", ""));
    }
}

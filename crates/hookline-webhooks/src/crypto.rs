//! HMAC-SHA256 verification of inbound event signatures.
//!
//! Subscribers that configure a shared secret must sign the events they
//! submit: the envelope carries a `body` field (the signed content) and a
//! `signature` field (hex HMAC-SHA256 digest of `body` keyed by the
//! secret). Verification is pure and runs before admission, so a rejected
//! event never produces a task or an audit record.

use hmac::{Hmac, Mac};
use sha2::Sha256;

use crate::error::WebhookError;

type HmacSha256 = Hmac<Sha256>;

/// Compute the HMAC-SHA256 hex digest of `body` keyed by `secret`.
#[must_use]
pub fn compute_signature(secret: &str, body: &str) -> String {
    let mut mac = <HmacSha256 as Mac>::new_from_slice(secret.as_bytes())
        .expect("HMAC can take key of any size");
    mac.update(body.as_bytes());
    hex::encode(mac.finalize().into_bytes())
}

/// Verify an inbound event envelope against a subscriber secret.
///
/// The envelope must carry string fields `signature` and `body`; digests
/// are compared in constant time.
pub fn verify_event_signature(
    secret: &str,
    payload: &serde_json::Value,
) -> Result<(), WebhookError> {
    let signature = payload
        .get("signature")
        .and_then(|v| v.as_str())
        .ok_or(WebhookError::MissingSignature)?;

    let body = payload
        .get("body")
        .and_then(|v| v.as_str())
        .ok_or(WebhookError::MissingBody)?;

    let computed = compute_signature(secret, body);
    if !constant_time_eq(signature.as_bytes(), computed.as_bytes()) {
        return Err(WebhookError::InvalidSignature);
    }

    Ok(())
}

/// Constant-time byte comparison to prevent timing attacks.
fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    use subtle::ConstantTimeEq;
    a.ct_eq(b).into()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

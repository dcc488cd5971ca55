//! Request signature verification.
//!
//! Contract: `X-Slack-Signature` carries `v0=<hex hmac-sha256>` over
//! `"v0:<timestamp>:<raw body>"` keyed by the shared signing secret, and
//! `X-Slack-Request-Timestamp` must be within a 5-minute window. A failed
//! check rejects the whole request before any state change.

use hmac::{Hmac, Mac};
use sha2::Sha256;
use thiserror::Error;

type HmacSha256 = Hmac<Sha256>;

pub const SIGNATURE_HEADER: &str = "X-Slack-Signature";
pub const TIMESTAMP_HEADER: &str = "X-Slack-Request-Timestamp";

const SIGNATURE_VERSION: &str = "v0";
const STALENESS_WINDOW_SECS: i64 = 5 * 60;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum SignatureError {
    #[error("missing header: {name}")]
    MissingHeader { name: &'static str },

    #[error("request timestamp `{raw}` is not a unix epoch integer")]
    InvalidTimestamp { raw: String },

    #[error("request timestamp is outside the {STALENESS_WINDOW_SECS}s staleness window")]
    Stale,

    #[error("signing secret rejected by hmac")]
    InvalidSecret,

    #[error("signature mismatch")]
    Mismatch,
}

/// Verify an inbound request against the signing secret, using the current
/// wall clock for the staleness check.
pub fn verify(
    secret: &str,
    timestamp: &str,
    body: &[u8],
    signature: &str,
) -> Result<(), SignatureError> {
    let now = time::OffsetDateTime::now_utc().unix_timestamp();
    verify_at(secret, timestamp, body, signature, now)
}

/// Clock-injected verification; `now_epoch_secs` is the receiver's clock.
pub fn verify_at(
    secret: &str,
    timestamp: &str,
    body: &[u8],
    signature: &str,
    now_epoch_secs: i64,
) -> Result<(), SignatureError> {
    let ts: i64 = timestamp
        .trim()
        .parse()
        .map_err(|_| SignatureError::InvalidTimestamp {
            raw: timestamp.to_string(),
        })?;
    if (now_epoch_secs - ts).abs() > STALENESS_WINDOW_SECS {
        return Err(SignatureError::Stale);
    }

    let expected = compute(secret, timestamp, body)?;
    if constant_time_eq(signature.as_bytes(), expected.as_bytes()) {
        Ok(())
    } else {
        Err(SignatureError::Mismatch)
    }
}

/// Compute the expected `v0=<hex>` signature for a request.
pub fn compute(secret: &str, timestamp: &str, body: &[u8]) -> Result<String, SignatureError> {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|_| SignatureError::InvalidSecret)?;
    mac.update(SIGNATURE_VERSION.as_bytes());
    mac.update(b":");
    mac.update(timestamp.as_bytes());
    mac.update(b":");
    mac.update(body);
    Ok(format!(
        "{SIGNATURE_VERSION}={}",
        hex_encode(mac.finalize().into_bytes().as_slice())
    ))
}

fn hex_encode(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

/// Constant-time byte comparison to prevent timing attacks.
fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter()
        .zip(b.iter())
        .fold(0u8, |acc, (x, y)| acc | (x ^ y))
        == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "test-signing-secret";
    const NOW: i64 = 1_700_000_000;

    fn signed(body: &[u8], ts: i64) -> (String, String) {
        let timestamp = ts.to_string();
        let signature = compute(SECRET, &timestamp, body).unwrap();
        (timestamp, signature)
    }

    #[test]
    fn accepts_a_correctly_signed_body() {
        let body = br#"{"type":"event_callback"}"#;
        let (timestamp, signature) = signed(body, NOW);
        verify_at(SECRET, &timestamp, body, &signature, NOW).unwrap();
    }

    #[test]
    fn rejects_tampered_body() {
        let (timestamp, signature) = signed(b"original", NOW);
        let err = verify_at(SECRET, &timestamp, b"tampered", &signature, NOW).unwrap_err();
        assert_eq!(err, SignatureError::Mismatch);
    }

    #[test]
    fn rejects_wrong_secret() {
        let (timestamp, signature) = signed(b"body", NOW);
        let err = verify_at("other-secret", &timestamp, b"body", &signature, NOW).unwrap_err();
        assert_eq!(err, SignatureError::Mismatch);
    }

    #[test]
    fn rejects_stale_timestamp() {
        let (timestamp, signature) = signed(b"body", NOW - 600);
        let err = verify_at(SECRET, &timestamp, b"body", &signature, NOW).unwrap_err();
        assert_eq!(err, SignatureError::Stale);
    }

    #[test]
    fn rejects_future_timestamp_outside_window() {
        let (timestamp, signature) = signed(b"body", NOW + 600);
        let err = verify_at(SECRET, &timestamp, b"body", &signature, NOW).unwrap_err();
        assert_eq!(err, SignatureError::Stale);
    }

    #[test]
    fn rejects_non_numeric_timestamp() {
        let err = verify_at(SECRET, "yesterday", b"body", "v0=00", NOW).unwrap_err();
        assert!(matches!(err, SignatureError::InvalidTimestamp { .. }));
    }
}

//! Signed-webhook verification.
//!
//! Inbound deliveries carry three headers: a delivery id, a unix-seconds
//! timestamp, and a signature header holding one or more `<version>,<value>`
//! tokens. The signed payload is the exact concatenation
//! `"{id}.{timestamp}.{raw body}"`, MACed with HMAC-SHA256 and encoded as
//! unpadded URL-safe base64.
//!
//! Verification is a pure function: deterministic, side-effect free, and
//! independent of request ordering. Freshness is checked before the MAC so
//! replayed deliveries are rejected without touching the secret.

use base64::Engine as _;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Header carrying the unique delivery identifier.
pub const ID_HEADER: &str = "webhook-id";
/// Header carrying the delivery timestamp (unix seconds, decimal string).
pub const TIMESTAMP_HEADER: &str = "webhook-timestamp";
/// Header carrying space-separated `<version>,<value>` signature tokens.
pub const SIGNATURE_HEADER: &str = "webhook-signature";

/// Signature scheme version accepted by this verifier.
pub const SIGNATURE_VERSION: &str = "v1";

/// Maximum accepted clock skew between delivery timestamp and now.
pub const MAX_TIMESTAMP_SKEW_SECONDS: i64 = 300;

/// Why a webhook delivery failed verification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum SignatureError {
    /// One or more of the three signature headers is absent.
    #[error("missing webhook signature headers")]
    MissingHeaders,
    /// The delivery timestamp is malformed or outside the accepted window.
    #[error("webhook timestamp outside the accepted window")]
    StaleTimestamp,
    /// No `v1` token in the signature header matches the computed digest.
    #[error("webhook signature does not match")]
    InvalidSignature,
}

/// The three signature headers as received, unparsed.
///
/// `None` means the header was absent; empty values are treated as absent.
#[derive(Debug, Clone, Default)]
pub struct SignatureHeaders {
    /// `webhook-id` value.
    pub id: Option<String>,
    /// `webhook-timestamp` value.
    pub timestamp: Option<String>,
    /// `webhook-signature` value.
    pub signature: Option<String>,
}

impl SignatureHeaders {
    /// Builds the header set from optional raw values.
    #[must_use]
    pub fn new(
        id: Option<impl Into<String>>,
        timestamp: Option<impl Into<String>>,
        signature: Option<impl Into<String>>,
    ) -> Self {
        Self {
            id: id.map(Into::into),
            timestamp: timestamp.map(Into::into),
            signature: signature.map(Into::into),
        }
    }
}

/// Verifies the authenticity and freshness of a webhook delivery.
///
/// `now` is the current unix time in seconds, passed explicitly so the
/// function stays deterministic under test.
///
/// # Errors
///
/// - [`SignatureError::MissingHeaders`] when any header is absent or empty.
/// - [`SignatureError::StaleTimestamp`] when the timestamp does not parse or
///   is more than [`MAX_TIMESTAMP_SKEW_SECONDS`] away from `now`.
/// - [`SignatureError::InvalidSignature`] when no `v1` token matches.
pub fn verify(
    secret: &str,
    headers: &SignatureHeaders,
    body: &[u8],
    now: i64,
) -> Result<(), SignatureError> {
    let id = present(headers.id.as_deref()).ok_or(SignatureError::MissingHeaders)?;
    let timestamp = present(headers.timestamp.as_deref()).ok_or(SignatureError::MissingHeaders)?;
    let signature = present(headers.signature.as_deref()).ok_or(SignatureError::MissingHeaders)?;

    let delivered_at: i64 = timestamp
        .parse()
        .map_err(|_| SignatureError::StaleTimestamp)?;
    if (now - delivered_at).abs() > MAX_TIMESTAMP_SKEW_SECONDS {
        return Err(SignatureError::StaleTimestamp);
    }

    let mac = signed_payload_mac(secret, id, timestamp, body)
        .map_err(|_| SignatureError::InvalidSignature)?;

    for token in signature.split(' ').filter(|t| !t.is_empty()) {
        let Some((version, value)) = token.split_once(',') else {
            continue;
        };
        if version != SIGNATURE_VERSION {
            continue;
        }
        let Ok(candidate) = URL_SAFE_NO_PAD.decode(value) else {
            continue;
        };
        // Mac::verify_slice is constant-time over the digest bytes.
        if mac.clone().verify_slice(&candidate).is_ok() {
            return Ok(());
        }
    }

    Err(SignatureError::InvalidSignature)
}

/// Computes the `v1,<value>` signature token for a delivery.
///
/// Used by tests and by anything that needs to emit deliveries in the same
/// scheme (e.g. a local simulator).
#[must_use]
pub fn sign(secret: &str, id: &str, timestamp: &str, body: &[u8]) -> String {
    let digest = signed_payload_mac(secret, id, timestamp, body)
        .map(|mac| URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes()))
        .unwrap_or_default();
    format!("{SIGNATURE_VERSION},{digest}")
}

fn signed_payload_mac(
    secret: &str,
    id: &str,
    timestamp: &str,
    body: &[u8],
) -> Result<HmacSha256, hmac::digest::InvalidLength> {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())?;
    mac.update(id.as_bytes());
    mac.update(b".");
    mac.update(timestamp.as_bytes());
    mac.update(b".");
    mac.update(body);
    Ok(mac)
}

fn present(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}

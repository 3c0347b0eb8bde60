//! Signature verification for purchase confirmations.
//!
//! The payment provider confirms purchases by POSTing to `/purchases`. Each
//! request is signed with a shared secret:
//!
//! ```text
//! X-Signature-Timestamp: 1735689600
//! X-Signature:           hex(HMAC-SHA256(secret, "{timestamp}.{raw body}"))
//! ```
//!
//! The timestamp must be within the tolerance window of the server clock, so
//! a captured request cannot be replayed later. Signatures are compared in
//! constant time.
//!
//! # Example
//!
//! ```rust
//! use photo_storefront::server::webhook::WebhookVerifier;
//! use std::time::Duration;
//!
//! let verifier = WebhookVerifier::new("shared-secret", Duration::from_secs(300));
//! let body = br#"{"photo_set_id":"ps_YWJj","publicId":"a/b"}"#;
//!
//! let (signature, timestamp) = verifier.sign_now(body);
//! assert!(verifier.verify(timestamp, &signature, body).is_ok());
//! ```

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use axum::{
    body::Body,
    extract::{Request, State},
    http::{HeaderMap, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use subtle::ConstantTimeEq;
use tracing::{debug, warn};

use super::handlers::ErrorResponse;

/// HMAC-SHA256 type alias
type HmacSha256 = Hmac<Sha256>;

/// Header carrying the hex signature.
pub const SIGNATURE_HEADER: &str = "x-signature";

/// Header carrying the Unix timestamp the signature was made at.
pub const TIMESTAMP_HEADER: &str = "x-signature-timestamp";

/// Default accepted clock skew in either direction.
pub const DEFAULT_WEBHOOK_TOLERANCE: Duration = Duration::from_secs(300);

/// Largest webhook body we buffer for verification.
const MAX_WEBHOOK_BODY: usize = 64 * 1024;

/// Webhook verification failures.
#[derive(Debug, Clone)]
pub enum SignatureError {
    MissingSignature,
    MissingTimestamp,
    InvalidTimestamp,
    InvalidSignatureFormat,
    InvalidSignature,

    /// Timestamp outside the tolerance window
    Stale { timestamp: u64, current_time: u64 },

    BodyTooLarge,
}

impl std::fmt::Display for SignatureError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SignatureError::MissingSignature => write!(f, "Missing signature header"),
            SignatureError::MissingTimestamp => write!(f, "Missing signature timestamp header"),
            SignatureError::InvalidTimestamp => write!(f, "Invalid signature timestamp"),
            SignatureError::InvalidSignatureFormat => write!(f, "Invalid signature format"),
            SignatureError::InvalidSignature => write!(f, "Invalid signature"),
            SignatureError::Stale {
                timestamp,
                current_time,
            } => write!(
                f,
                "Signature timestamp {} is outside the allowed window (current time: {})",
                timestamp, current_time
            ),
            SignatureError::BodyTooLarge => write!(f, "Webhook body too large"),
        }
    }
}

impl IntoResponse for SignatureError {
    fn into_response(self) -> Response {
        let (status, kind) = match &self {
            SignatureError::MissingSignature => (StatusCode::UNAUTHORIZED, "missing_signature"),
            SignatureError::MissingTimestamp => (StatusCode::UNAUTHORIZED, "missing_timestamp"),
            SignatureError::InvalidSignature => (StatusCode::UNAUTHORIZED, "invalid_signature"),
            SignatureError::Stale { .. } => (StatusCode::UNAUTHORIZED, "stale_signature"),
            SignatureError::InvalidTimestamp => (StatusCode::BAD_REQUEST, "invalid_timestamp"),
            SignatureError::InvalidSignatureFormat => {
                (StatusCode::BAD_REQUEST, "invalid_signature_format")
            }
            SignatureError::BodyTooLarge => (StatusCode::PAYLOAD_TOO_LARGE, "body_too_large"),
        };
        let message = self.to_string();

        // A wrong signature may be someone forging purchases
        match &self {
            SignatureError::InvalidSignature => {
                warn!(kind, status = status.as_u16(), "Webhook rejected: {}", message);
            }
            _ => {
                debug!(kind, status = status.as_u16(), "Webhook rejected: {}", message);
            }
        }

        let error_response = ErrorResponse::with_status(message, kind, status);
        (status, Json(error_response)).into_response()
    }
}

/// Signs and verifies webhook payloads with HMAC-SHA256.
#[derive(Clone)]
pub struct WebhookVerifier {
    secret_key: Vec<u8>,
    tolerance: Duration,
}

impl WebhookVerifier {
    pub fn new(secret_key: impl AsRef<[u8]>, tolerance: Duration) -> Self {
        Self {
            secret_key: secret_key.as_ref().to_vec(),
            tolerance,
        }
    }

    pub fn tolerance(&self) -> Duration {
        self.tolerance
    }

    /// Sign `body` at an explicit timestamp. Returns the hex signature.
    pub fn sign(&self, timestamp: u64, body: &[u8]) -> String {
        let mut mac =
            HmacSha256::new_from_slice(&self.secret_key).expect("HMAC can take key of any size");
        mac.update(timestamp.to_string().as_bytes());
        mac.update(b".");
        mac.update(body);
        hex::encode(mac.finalize().into_bytes())
    }

    /// Sign `body` at the current time. Returns `(signature, timestamp)`.
    pub fn sign_now(&self, body: &[u8]) -> (String, u64) {
        let timestamp = unix_now();
        (self.sign(timestamp, body), timestamp)
    }

    /// Check a signature and its timestamp.
    pub fn verify(&self, timestamp: u64, signature: &str, body: &[u8]) -> Result<(), SignatureError> {
        let current_time = unix_now();
        if current_time.abs_diff(timestamp) > self.tolerance.as_secs() {
            return Err(SignatureError::Stale {
                timestamp,
                current_time,
            });
        }

        let provided = hex::decode(signature).map_err(|_| SignatureError::InvalidSignatureFormat)?;
        let expected =
            hex::decode(self.sign(timestamp, body)).map_err(|_| SignatureError::InvalidSignatureFormat)?;

        if provided.ct_eq(&expected).into() {
            Ok(())
        } else {
            Err(SignatureError::InvalidSignature)
        }
    }

    /// Verify the signature headers of a request against its raw body.
    pub fn verify_request(&self, headers: &HeaderMap, body: &[u8]) -> Result<(), SignatureError> {
        let signature = headers
            .get(SIGNATURE_HEADER)
            .ok_or(SignatureError::MissingSignature)?
            .to_str()
            .map_err(|_| SignatureError::InvalidSignatureFormat)?;
        let timestamp = headers
            .get(TIMESTAMP_HEADER)
            .ok_or(SignatureError::MissingTimestamp)?
            .to_str()
            .map_err(|_| SignatureError::InvalidTimestamp)?
            .trim()
            .parse::<u64>()
            .map_err(|_| SignatureError::InvalidTimestamp)?;

        self.verify(timestamp, signature.trim(), body)
    }
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

/// Axum middleware that rejects unsigned or mis-signed webhook requests.
///
/// The body is buffered for verification and handed on unchanged.
pub async fn webhook_middleware(
    State(verifier): State<WebhookVerifier>,
    request: Request,
    next: Next,
) -> Result<Response, SignatureError> {
    let (parts, body) = request.into_parts();
    let bytes = axum::body::to_bytes(body, MAX_WEBHOOK_BODY)
        .await
        .map_err(|_| SignatureError::BodyTooLarge)?;

    verifier.verify_request(&parts.headers, &bytes)?;

    let request = Request::from_parts(parts, Body::from(bytes));
    Ok(next.run(request).await)
}

use hmac::{Hmac, Mac};
use sha2::Sha256;
use thiserror::Error;

type HmacSha256 = Hmac<Sha256>;

/// Header carrying the hex-encoded HMAC-SHA256 digest of the raw body.
pub const SIGNATURE_HEADER: &str = "X-Payment-Signature";

/// Webhook-level error.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum WebhookError {
    /// No signature header was supplied.
    #[error("missing signature")]
    MissingSignature,

    /// The supplied signature does not match the computed digest.
    #[error("invalid signature")]
    InvalidSignature,

    /// The body failed to parse after successful verification.
    #[error("malformed payload: {0}")]
    MalformedPayload(String),
}

/// Verifies payment webhook signatures against a shared secret.
#[derive(Clone)]
pub struct SignatureVerifier {
    secret: Vec<u8>,
}

impl SignatureVerifier {
    pub fn new(secret: impl Into<Vec<u8>>) -> Self {
        Self {
            secret: secret.into(),
        }
    }

    /// Verify a caller-supplied signature over the raw body bytes.
    ///
    /// The comparison runs in constant time (`Mac::verify_slice`), so the
    /// position of the first differing byte leaks nothing.
    pub fn verify(&self, raw_body: &[u8], signature: Option<&str>) -> Result<(), WebhookError> {
        let signature = signature.ok_or(WebhookError::MissingSignature)?;
        let digest =
            hex::decode(signature.trim()).map_err(|_| WebhookError::InvalidSignature)?;

        let mut mac = HmacSha256::new_from_slice(&self.secret)
            .expect("HMAC can take key of any size");
        mac.update(raw_body);
        mac.verify_slice(&digest)
            .map_err(|_| WebhookError::InvalidSignature)
    }

    /// Compute the lowercase hex digest for a body. The counterpart of
    /// [`verify`](Self::verify); senders use it to sign outbound payloads.
    pub fn sign(&self, raw_body: &[u8]) -> String {
        let mut mac = HmacSha256::new_from_slice(&self.secret)
            .expect("HMAC can take key of any size");
        mac.update(raw_body);
        hex::encode(mac.finalize().into_bytes())
    }
}

impl core::fmt::Debug for SignatureVerifier {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        // Never expose the secret.
        f.debug_struct("SignatureVerifier").finish_non_exhaustive()
    }
}

//! Payment webhook authentication and payload model.
//!
//! Inbound events are trusted only after their HMAC-SHA256 signature over
//! the **raw request bytes** checks out; parsing happens strictly after
//! verification. Re-serializing the body before verifying would change its
//! byte layout and break the signature, so callers must hand over the bytes
//! exactly as received.

pub mod event;
pub mod signature;

pub use event::{PaymentEvent, EVENT_PAYMENT_SUCCEEDED};
pub use signature::{SignatureVerifier, WebhookError, SIGNATURE_HEADER};

//! Builder credential verification.
//!
//! CI proves it may deploy either by presenting a shared secret whose
//! SHA-256 digest is configured, or by signing the raw request body with
//! an Ed25519 key whose public half is configured. One scheme is active per
//! process; the credential set is loaded at startup and never changes.

mod credential;
mod keys;
mod verifier;

pub use credential::{AuthScheme, BuilderAuthConfig, BuilderCredential};
pub use keys::parse_public_key;
pub use verifier::{BuilderRequest, KeyVerifier};

/// Errors produced while loading credentials or verifying a request.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("Missing builder key")]
    MissingBuilderKey,

    #[error("Invalid builder key")]
    InvalidBuilderKey,

    #[error("Missing signature")]
    MissingSignature,

    #[error("Invalid signature")]
    InvalidSignature,

    #[error("no builder credentials configured")]
    NoCredentials,

    #[error("invalid key hash {0:?}: expected 64 hex characters")]
    InvalidKeyHash(String),

    #[error("invalid public key: {0}")]
    InvalidPublicKey(String),
}

impl AuthError {
    /// Returns `true` for errors caused by the request rather than configuration.
    pub fn is_rejection(&self) -> bool {
        matches!(
            self,
            AuthError::MissingBuilderKey
                | AuthError::InvalidBuilderKey
                | AuthError::MissingSignature
                | AuthError::InvalidSignature
        )
    }
}

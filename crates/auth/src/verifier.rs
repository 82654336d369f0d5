use base64::{Engine, engine::general_purpose::STANDARD};
use ed25519_dalek::{SIGNATURE_LENGTH, Signature, Verifier};
use sha2::{Digest, Sha256};

use crate::credential::{AuthScheme, BuilderAuthConfig, BuilderCredential};
use crate::AuthError;

/// The credential material a deploy request carries.
#[derive(Debug, Clone, Copy, Default)]
pub struct BuilderRequest<'a> {
    /// Value of `X-Builder-Key`, if present.
    pub builder_key: Option<&'a str>,
    /// Value of `X-Signature`, if present.
    pub signature: Option<&'a str>,
    /// Raw request body, exactly as received.
    pub body: &'a [u8],
}

/// Decides whether a deploy request is authorized.
#[derive(Debug)]
pub struct KeyVerifier {
    credential: BuilderCredential,
}

impl KeyVerifier {
    /// Creates a verifier. An empty credential set is refused.
    pub fn new(credential: BuilderCredential) -> Result<Self, AuthError> {
        if credential.is_empty() {
            return Err(AuthError::NoCredentials);
        }
        Ok(Self { credential })
    }

    /// Parses and validates a `[builder_auth]` config section.
    pub fn from_config(config: &BuilderAuthConfig) -> Result<Self, AuthError> {
        let verifier = Self::new(BuilderCredential::try_from(config)?)?;
        tracing::info!(
            scheme = %verifier.scheme(),
            count = verifier.credential.len(),
            "builder credentials loaded"
        );
        Ok(verifier)
    }

    pub fn scheme(&self) -> AuthScheme {
        self.credential.scheme()
    }

    /// Checks the request against the configured credential set.
    pub fn verify(&self, req: &BuilderRequest<'_>) -> Result<(), AuthError> {
        match &self.credential {
            BuilderCredential::SharedSecret { key_hashes } => {
                let key = req
                    .builder_key
                    .filter(|k| !k.is_empty())
                    .ok_or(AuthError::MissingBuilderKey)?;
                let digest = hex::encode(Sha256::digest(key.as_bytes()));
                if key_hashes.contains(&digest) {
                    Ok(())
                } else {
                    Err(AuthError::InvalidBuilderKey)
                }
            }
            BuilderCredential::Signature { public_keys } => {
                let encoded = req
                    .signature
                    .filter(|s| !s.is_empty())
                    .ok_or(AuthError::MissingSignature)?;
                let signature = decode_signature(encoded)?;
                if public_keys
                    .iter()
                    .any(|key| key.verify(req.body, &signature).is_ok())
                {
                    Ok(())
                } else {
                    Err(AuthError::InvalidSignature)
                }
            }
        }
    }
}

fn decode_signature(encoded: &str) -> Result<Signature, AuthError> {
    let raw = STANDARD
        .decode(encoded.trim())
        .map_err(|_| AuthError::InvalidSignature)?;
    let bytes: [u8; SIGNATURE_LENGTH] = raw
        .as_slice()
        .try_into()
        .map_err(|_| AuthError::InvalidSignature)?;
    Ok(Signature::from_bytes(&bytes))
}

use std::collections::HashSet;

use ed25519_dalek::VerifyingKey;
use serde::{Deserialize, Serialize};

use crate::AuthError;
use crate::keys::parse_public_key;

/// Which deploy authentication scheme is active.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthScheme {
    /// `X-Builder-Key` whose SHA-256 hex digest is in `key_hashes`.
    SharedSecret,
    /// `X-Signature` over the raw body, verified against `public_keys`.
    Signature,
}

impl std::fmt::Display for AuthScheme {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AuthScheme::SharedSecret => f.write_str("shared_secret"),
            AuthScheme::Signature => f.write_str("signature"),
        }
    }
}

/// `[builder_auth]` section of the server config.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BuilderAuthConfig {
    pub scheme: AuthScheme,

    /// SHA-256 hex digests of accepted builder keys.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub key_hashes: Vec<String>,

    /// Accepted Ed25519 public keys (OpenSSH or PEM).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub public_keys: Vec<String>,
}

/// The parsed, immutable credential set.
#[derive(Debug, Clone)]
pub enum BuilderCredential {
    SharedSecret { key_hashes: HashSet<String> },
    Signature { public_keys: Vec<VerifyingKey> },
}

impl BuilderCredential {
    pub fn scheme(&self) -> AuthScheme {
        match self {
            BuilderCredential::SharedSecret { .. } => AuthScheme::SharedSecret,
            BuilderCredential::Signature { .. } => AuthScheme::Signature,
        }
    }

    /// Number of accepted credentials.
    pub fn len(&self) -> usize {
        match self {
            BuilderCredential::SharedSecret { key_hashes } => key_hashes.len(),
            BuilderCredential::Signature { public_keys } => public_keys.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl TryFrom<&BuilderAuthConfig> for BuilderCredential {
    type Error = AuthError;

    fn try_from(config: &BuilderAuthConfig) -> Result<Self, Self::Error> {
        match config.scheme {
            AuthScheme::SharedSecret => {
                if !config.public_keys.is_empty() {
                    tracing::warn!(
                        count = config.public_keys.len(),
                        "public_keys ignored: scheme is shared_secret"
                    );
                }
                let key_hashes = config
                    .key_hashes
                    .iter()
                    .map(|h| normalize_hash(h))
                    .collect::<Result<HashSet<_>, _>>()?;
                Ok(BuilderCredential::SharedSecret { key_hashes })
            }
            AuthScheme::Signature => {
                if !config.key_hashes.is_empty() {
                    tracing::warn!(
                        count = config.key_hashes.len(),
                        "key_hashes ignored: scheme is signature"
                    );
                }
                let public_keys = config
                    .public_keys
                    .iter()
                    .map(|k| parse_public_key(k))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(BuilderCredential::Signature { public_keys })
            }
        }
    }
}

/// Lowercases a configured digest and checks it is 32 bytes of hex.
fn normalize_hash(hash: &str) -> Result<String, AuthError> {
    let hash = hash.trim().to_ascii_lowercase();
    match hex::decode(&hash) {
        Ok(bytes) if bytes.len() == 32 => Ok(hash),
        _ => Err(AuthError::InvalidKeyHash(hash)),
    }
}

//! Ed25519 public key decoding (OpenSSH, PEM, bare base64).

use base64::{Engine, engine::general_purpose::STANDARD};
use ed25519_dalek::pkcs8::DecodePublicKey;
use ed25519_dalek::{PUBLIC_KEY_LENGTH, VerifyingKey};

use crate::AuthError;

const SSH_KEY_TYPE: &str = "ssh-ed25519";

/// Parses an Ed25519 public key in any supported encoding:
///
/// - OpenSSH: `ssh-ed25519 AAAAC3Nza... comment`
/// - PEM: `-----BEGIN PUBLIC KEY-----` wrapping a SubjectPublicKeyInfo
/// - bare base64 of the 32 raw key bytes
pub fn parse_public_key(text: &str) -> Result<VerifyingKey, AuthError> {
    let text = text.trim();

    if text.starts_with("-----BEGIN") {
        return VerifyingKey::from_public_key_pem(text)
            .map_err(|e| AuthError::InvalidPublicKey(format!("bad PEM public key: {e}")));
    }

    let raw = if text.starts_with(SSH_KEY_TYPE) {
        parse_openssh(text)?
    } else {
        decode(text)?
    };

    let bytes: [u8; PUBLIC_KEY_LENGTH] = raw
        .as_slice()
        .try_into()
        .map_err(|_| AuthError::InvalidPublicKey(format!("expected 32 bytes, got {}", raw.len())))?;

    VerifyingKey::from_bytes(&bytes).map_err(|e| AuthError::InvalidPublicKey(e.to_string()))
}

fn decode(b64: &str) -> Result<Vec<u8>, AuthError> {
    STANDARD
        .decode(b64)
        .map_err(|e| AuthError::InvalidPublicKey(format!("bad base64: {e}")))
}

/// Decodes the OpenSSH wire blob: `string "ssh-ed25519"`, `string key`.
fn parse_openssh(line: &str) -> Result<Vec<u8>, AuthError> {
    let mut parts = line.split_whitespace();
    let _key_type = parts.next();
    let blob_b64 = parts
        .next()
        .ok_or_else(|| AuthError::InvalidPublicKey("missing key data".into()))?;
    let blob = decode(blob_b64)?;

    let mut cursor = blob.as_slice();
    let key_type = read_ssh_string(&mut cursor)?;
    if key_type != SSH_KEY_TYPE.as_bytes() {
        return Err(AuthError::InvalidPublicKey(format!(
            "unsupported key type {:?}",
            String::from_utf8_lossy(key_type)
        )));
    }

    let key = read_ssh_string(&mut cursor)?;
    Ok(key.to_vec())
}

fn read_ssh_string<'a>(cursor: &mut &'a [u8]) -> Result<&'a [u8], AuthError> {
    let truncated = || AuthError::InvalidPublicKey("truncated ssh key blob".into());

    if cursor.len() < 4 {
        return Err(truncated());
    }
    let (len_bytes, rest) = cursor.split_at(4);
    let len = u32::from_be_bytes([len_bytes[0], len_bytes[1], len_bytes[2], len_bytes[3]]) as usize;
    if rest.len() < len {
        return Err(truncated());
    }
    let (value, rest) = rest.split_at(len);
    *cursor = rest;
    Ok(value)
}

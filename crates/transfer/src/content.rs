use base64::Engine;
use base64::alphabet;
use base64::engine::general_purpose::{GeneralPurpose, PAD};
use base64::engine::DecodePaddingMode;
use sha2::{Digest, Sha256};

use crate::TransferError;

/// Standard alphabet; padding optional, non-zero trailing bits allowed.
const LENIENT: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    PAD.with_decode_padding_mode(DecodePaddingMode::Indifferent)
        .with_decode_allow_trailing_bits(true),
);

/// Decodes the base64 `content` of the file at `path`.
///
/// Line breaks and other ASCII whitespace are ignored, so output wrapped
/// by `base64` or `openssl base64` decodes as-is.
pub fn decode_content(path: &str, content: &str) -> Result<Vec<u8>, TransferError> {
    let compact: Vec<u8> = content
        .bytes()
        .filter(|b| !b.is_ascii_whitespace())
        .collect();
    LENIENT
        .decode(compact)
        .map_err(|source| TransferError::InvalidContent {
            path: path.to_string(),
            source,
        })
}

/// Computes SHA-256 of `data` and returns the hex-encoded digest.
pub fn checksum_bytes(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}

/// Content type stored alongside a deployed object.
pub fn content_type_for(path: &str) -> &'static str {
    let ext = path
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default();

    match ext.as_str() {
        "json" => "application/json",
        "yml" | "yaml" => "text/yaml",
        "dmg" => "application/x-apple-diskimage",
        "zip" => "application/zip",
        "html" => "text/html",
        "js" => "application/javascript",
        "css" => "text/css",
        "svg" => "image/svg+xml",
        "png" => "image/png",
        _ => "application/octet-stream",
    }
}

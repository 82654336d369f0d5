//! Path safety and payload decoding for deployed artifacts.
//!
//! Every key a deploy writes, and every file name a download reads, passes
//! through this crate before it touches storage.

mod content;
mod validation;

pub use content::{checksum_bytes, content_type_for, decode_content};
pub use validation::{
    normalize_key, resolve_within_root, validate_download_name, validate_upload_path,
};

/// Errors produced by the transfer crate.
#[derive(Debug, thiserror::Error)]
pub enum TransferError {
    #[error("invalid path: {0}")]
    InvalidPath(String),

    #[error("invalid filename: {0}")]
    InvalidFilename(String),

    #[error("invalid base64 content for {path}: {source}")]
    InvalidContent {
        path: String,
        #[source]
        source: base64::DecodeError,
    },
}

//! Artifact storage for deployed releases and the web bundle.
//!
//! Artifacts are addressed by relative keys such as `releases/version.json`
//! or `web/index.html`. Two stores implement [`ArtifactStore`]: a local
//! directory tree and an S3-compatible bucket (DigitalOcean Spaces).
//! [`ArtifactWriter`] applies a deploy batch to whichever store is active.

mod local;
mod sigv4;
mod spaces;
mod writer;

use std::future::Future;
use std::pin::Pin;

pub use local::LocalStore;
pub use spaces::{SpacesConfig, SpacesStore};
pub use writer::{ArtifactWriter, DeployError, DeployOutcome};

/// Name of the empty marker written into a cleared directory.
pub const CLEAR_MARKER: &str = ".gitkeep";

/// A boxed future returned by store methods.
pub type StoreFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, StorageError>> + Send + 'a>>;

/// An object written to a store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredObject {
    pub key: String,
    pub size: u64,
    /// Public URL, for stores that publish objects.
    pub url: Option<String>,
}

/// Backend that holds deployed artifacts.
///
/// Implementations must reject keys that would escape their root.
pub trait ArtifactStore: Send + Sync + 'static {
    /// Short backend name for logs.
    fn name(&self) -> &'static str;

    /// Writes `data` at `key`, replacing any existing object.
    fn put<'a>(
        &'a self,
        key: &'a str,
        data: Vec<u8>,
        content_type: &'a str,
    ) -> StoreFuture<'a, StoredObject>;

    /// Reads the object at `key`; `None` when it does not exist.
    fn get<'a>(&'a self, key: &'a str) -> StoreFuture<'a, Option<Vec<u8>>>;

    /// Whether [`clear_prefix`](Self::clear_prefix) is available.
    fn supports_clear(&self) -> bool {
        false
    }

    /// Removes everything under `prefix` and leaves it as an empty directory.
    fn clear_prefix<'a>(&'a self, prefix: &'a str) -> StoreFuture<'a, ()> {
        let backend = self.name();
        Box::pin(std::future::ready(Err(StorageError::Unsupported(format!(
            "{backend} store cannot clear {prefix}"
        )))))
    }
}

/// Errors produced by artifact stores.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("I/O error on {key}: {source}")]
    Io {
        key: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid key: {0}")]
    InvalidKey(#[from] seance_transfer::TransferError),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("object storage error {status} on {key}: {body}")]
    Api {
        status: u16,
        key: String,
        body: String,
    },

    #[error("request signing failed: {0}")]
    Signing(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("unsupported: {0}")]
    Unsupported(String),
}

impl StorageError {
    pub(crate) fn io(key: &str, source: std::io::Error) -> Self {
        StorageError::Io {
            key: key.to_string(),
            source,
        }
    }
}

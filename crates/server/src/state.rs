use std::sync::Arc;

use seance_auth::KeyVerifier;
use seance_storage::{ArtifactStore, ArtifactWriter};

use crate::manifest::ManifestReader;

/// Where installers are published and what they are called.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Distribution {
    /// Origin clients use to reach this server, without a trailing slash.
    pub public_base_url: String,
    /// Product name used in installer file names.
    pub product_name: String,
}

impl Distribution {
    pub fn new(public_base_url: impl Into<String>, product_name: impl Into<String>) -> Self {
        Self {
            public_base_url: public_base_url.into().trim_end_matches('/').to_string(),
            product_name: product_name.into(),
        }
    }
}

/// Shared, immutable state handed to every request.
#[derive(Clone)]
pub struct AppState {
    pub(crate) verifier: Arc<KeyVerifier>,
    pub(crate) store: Arc<dyn ArtifactStore>,
    pub(crate) writer: ArtifactWriter,
    pub(crate) manifests: ManifestReader,
}

impl AppState {
    pub fn new(
        verifier: KeyVerifier,
        store: Arc<dyn ArtifactStore>,
        distribution: Distribution,
    ) -> Self {
        Self {
            verifier: Arc::new(verifier),
            writer: ArtifactWriter::new(Arc::clone(&store)),
            manifests: ManifestReader::new(Arc::clone(&store), distribution),
            store,
        }
    }

    pub fn store(&self) -> &Arc<dyn ArtifactStore> {
        &self.store
    }

    pub fn manifests(&self) -> &ManifestReader {
        &self.manifests
    }
}

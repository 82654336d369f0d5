//! Wires configuration, credentials, storage, and the HTTP server together.

use std::sync::Arc;

use anyhow::Context;
use seance_auth::KeyVerifier;
use seance_server::{AppState, Distribution, ServerConfig, UpdateServer};
use seance_storage::{ArtifactStore, LocalStore, SpacesConfig, SpacesStore};

use crate::config::{Config, StorageBackend};

/// Runs the server until Ctrl-C.
pub async fn run(config: Config) -> anyhow::Result<()> {
    let verifier =
        KeyVerifier::from_config(&config.builder_auth).context("loading builder credentials")?;
    let store = build_store(&config)?;
    let state = AppState::new(
        verifier,
        store,
        Distribution::new(&config.public_base_url, &config.product_name),
    );

    let server = UpdateServer::new(
        ServerConfig {
            bind: config.bind,
            port: config.port,
        },
        state,
    );
    let server_run = Arc::clone(&server);
    let mut task = tokio::spawn(async move { server_run.run().await });

    tokio::select! {
        result = &mut task => {
            // The listener only stops on its own when it fails.
            result??;
            return Ok(());
        }
        signal = tokio::signal::ctrl_c() => {
            signal.context("listening for Ctrl-C")?;
            tracing::info!("shutdown signal received");
        }
    }

    server.shutdown();
    task.await??;
    Ok(())
}

/// Creates the configured artifact store.
pub fn build_store(config: &Config) -> anyhow::Result<Arc<dyn ArtifactStore>> {
    match config.storage.backend {
        StorageBackend::Local => {
            std::fs::create_dir_all(&config.data_root).with_context(|| {
                format!("creating data root {}", config.data_root.display())
            })?;
            tracing::info!(root = %config.data_root.display(), "using local artifact store");
            Ok(Arc::new(LocalStore::new(&config.data_root)))
        }
        StorageBackend::Spaces => {
            let spaces = SpacesConfig::from_env().context("object storage configuration")?;
            Ok(Arc::new(SpacesStore::new(spaces)?))
        }
    }
}

//! Release metadata for the desktop auto-updater and the web client.
//!
//! Everything here is derived from `releases/version.json`, which the
//! release pipeline deploys. It is re-read from the store on every request
//! so a deploy takes effect immediately.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use axum::http::header;
use axum::response::{IntoResponse, Response};
use seance_protocol::constants::{RELEASES_JSON, RELEASES_PREFIX, VERSION_DOCUMENT_KEY};
use seance_protocol::{DesktopRelease, LatestRelease, Platform, ReleaseManifest, VersionDocument};
use seance_storage::{ArtifactStore, StorageError};
use seance_transfer::{content_type_for, validate_download_name};

use crate::error::ApiError;
use crate::state::{AppState, Distribution};

const DOWNLOAD_LATEST: &str = "download-latest";
const YAML_CONTENT_TYPE: &str = "text/yaml";

/// Platform whose installer `/downloads/latest` points at.
const PRIMARY_PLATFORM: Platform = Platform::DarwinArm64;

#[derive(Debug, thiserror::Error)]
pub enum ManifestError {
    #[error("Version data not found")]
    VersionDataMissing,

    #[error("Manifest not found")]
    ManifestMissing(String),

    #[error("File not found")]
    FileMissing(String),

    #[error("Not found")]
    UnknownPlatform(String),

    #[error("version data is not valid JSON: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("version data has no desktop release")]
    NoDesktopRelease,

    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl ManifestError {
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            ManifestError::ManifestMissing(_)
                | ManifestError::FileMissing(_)
                | ManifestError::UnknownPlatform(_)
        )
    }
}

/// Reads release metadata and installers from the store.
#[derive(Clone)]
pub struct ManifestReader {
    store: Arc<dyn ArtifactStore>,
    distribution: Arc<Distribution>,
}

impl ManifestReader {
    pub fn new(store: Arc<dyn ArtifactStore>, distribution: Distribution) -> Self {
        Self {
            store,
            distribution: Arc::new(distribution),
        }
    }

    pub fn distribution(&self) -> &Distribution {
        &self.distribution
    }

    /// The stored version document, byte for byte. It must parse as JSON.
    pub async fn version_data(&self) -> Result<Vec<u8>, ManifestError> {
        let raw = self
            .store
            .get(VERSION_DOCUMENT_KEY)
            .await?
            .ok_or(ManifestError::VersionDataMissing)?;
        serde_json::from_slice::<serde_json::Value>(&raw)?;
        Ok(raw)
    }

    pub async fn version_document(&self) -> Result<VersionDocument, ManifestError> {
        let raw = self.version_data().await?;
        Ok(serde_json::from_slice(&raw)?)
    }

    async fn desktop_release(&self) -> Result<DesktopRelease, ManifestError> {
        self.version_document()
            .await?
            .desktop
            .ok_or(ManifestError::NoDesktopRelease)
    }

    /// Public download URL of an installer.
    pub fn installer_url(&self, platform: Platform, version: &str) -> String {
        format!(
            "{}/updates/{RELEASES_PREFIX}/{platform}/{}",
            self.distribution.public_base_url,
            platform.artifact_file_name(&self.distribution.product_name, version)
        )
    }

    /// The `RELEASES.json` document for `platform`.
    pub async fn release_manifest_json(
        &self,
        platform: &str,
    ) -> Result<ReleaseManifest, ManifestError> {
        let platform = parse_platform(platform)?;
        let desktop = self.desktop_release().await?;
        Ok(ReleaseManifest {
            url: self.installer_url(platform, &desktop.version),
            version: desktop.version,
            release_date: desktop.released,
        })
    }

    /// The updater's YAML channel file for `platform`, as deployed.
    pub async fn release_manifest_yaml(
        &self,
        platform: &str,
        file: &str,
    ) -> Result<Vec<u8>, ManifestError> {
        let platform = parse_platform(platform)?;
        if !platform.is_channel_file(file) {
            return Err(ManifestError::ManifestMissing(file.to_string()));
        }

        let key = format!("{RELEASES_PREFIX}/{platform}/{}", platform.updater_channel_file());
        match self.store.get(&key).await? {
            Some(data) => Ok(data),
            None => Err(ManifestError::ManifestMissing(key)),
        }
    }

    /// The installer the version document names for `platform`, as
    /// `(file name, bytes)`.
    pub async fn latest_release(
        &self,
        platform: &str,
    ) -> Result<(String, Vec<u8>), ManifestError> {
        let platform = parse_platform(platform)?;
        let desktop = self.desktop_release().await?;
        let file_name =
            platform.artifact_file_name(&self.distribution.product_name, &desktop.version);
        let data = self.release_file(platform, &file_name).await?;
        Ok((file_name, data))
    }

    /// A file from `releases/{platform}/`.
    pub async fn release_file(
        &self,
        platform: Platform,
        file_name: &str,
    ) -> Result<Vec<u8>, ManifestError> {
        let key = format!("{RELEASES_PREFIX}/{platform}/{file_name}");
        match self.store.get(&key).await? {
            Some(data) => Ok(data),
            None => Err(ManifestError::FileMissing(key)),
        }
    }

    /// Latest desktop release for the web client. Falls back to the
    /// primary platform's installer URL when the document has none.
    pub async fn latest_download(&self) -> Result<LatestRelease, ManifestError> {
        let desktop = self.desktop_release().await?;
        let mut latest = LatestRelease::from(desktop);
        if latest.download_url.is_empty() {
            latest.download_url = self.installer_url(PRIMARY_PLATFORM, &latest.version);
        }
        Ok(latest)
    }
}

fn parse_platform(segment: &str) -> Result<Platform, ManifestError> {
    Platform::from_segment(segment).ok_or_else(|| ManifestError::UnknownPlatform(segment.into()))
}

/// Binary download response with `Content-Disposition: attachment`.
fn attachment(file_name: &str, content_type: &str, data: Vec<u8>) -> Response {
    let disposition = format!("attachment; filename=\"{}\"", file_name.replace('"', ""));
    (
        [
            (header::CONTENT_TYPE, content_type.to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        data,
    )
        .into_response()
}

fn installer_content_type(platform: Platform, file_name: &str) -> &'static str {
    if file_name.ends_with(&format!(".{}", platform.artifact_extension())) {
        platform.content_type()
    } else {
        content_type_for(file_name)
    }
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// `GET /updates/api/version.json`
pub(crate) async fn version_json(State(state): State<AppState>) -> Result<Response, ApiError> {
    let raw = state.manifests.version_data().await?;
    Ok(([(header::CONTENT_TYPE, "application/json")], raw).into_response())
}

/// `GET /updates/{platform}/{file}`: `RELEASES.json`, the YAML channel
/// file, or `download-latest`.
pub(crate) async fn platform_file(
    State(state): State<AppState>,
    Path((platform, file)): Path<(String, String)>,
) -> Result<Response, ApiError> {
    let platform = parse_platform(&platform)?;
    let manifests = &state.manifests;

    if file == RELEASES_JSON {
        let manifest = manifests.release_manifest_json(platform.as_str()).await?;
        return Ok(Json(manifest).into_response());
    }

    if file == DOWNLOAD_LATEST {
        let (file_name, data) = manifests.latest_release(platform.as_str()).await?;
        tracing::info!(%platform, file = %file_name, "serving latest installer");
        return Ok(attachment(
            &file_name,
            installer_content_type(platform, &file_name),
            data,
        ));
    }

    if file.starts_with("latest") && (file.ends_with(".yml") || file.ends_with(".yaml")) {
        let data = manifests
            .release_manifest_yaml(platform.as_str(), &file)
            .await?;
        return Ok(([(header::CONTENT_TYPE, YAML_CONTENT_TYPE)], data).into_response());
    }

    Err(ApiError::not_found())
}

/// `GET /updates/releases/{platform}/{filename}`
pub(crate) async fn release_download(
    State(state): State<AppState>,
    Path((platform, filename)): Path<(String, String)>,
) -> Result<Response, ApiError> {
    if validate_download_name(&filename).is_err() {
        tracing::warn!(%filename, "rejected download name");
        return Err(ApiError::BadRequest("Invalid filename".into()));
    }
    let platform = parse_platform(&platform)?;

    let data = state.manifests.release_file(platform, &filename).await?;
    tracing::info!(%platform, file = %filename, size = data.len(), "serving installer");
    Ok(attachment(
        &filename,
        installer_content_type(platform, &filename),
        data,
    ))
}

/// `GET /downloads/latest`
pub(crate) async fn latest_download(
    State(state): State<AppState>,
) -> Result<Json<LatestRelease>, ApiError> {
    Ok(Json(state.manifests.latest_download().await?))
}

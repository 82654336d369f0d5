use serde::{Deserialize, Serialize};

/// Contents of `releases/version.json`, written by the release pipeline.
///
/// The server never computes this document and only reads the desktop
/// release from it. Everything else, `web` included, is kept as raw JSON
/// so the document can be re-served without loss.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VersionDocument {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub web: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub desktop: Option<DesktopRelease>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// Desktop release info.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DesktopRelease {
    pub version: String,
    pub released: String,
    /// Absent, `null` and `""` all mean "derive it from the version".
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub download_url: Option<String>,
}

/// JSON manifest served to the auto-updater (`RELEASES.json`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReleaseManifest {
    pub version: String,
    pub release_date: String,
    pub url: String,
}

/// Latest desktop release as exposed to the web client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LatestRelease {
    pub version: String,
    pub released: String,
    pub download_url: String,
}

impl From<DesktopRelease> for LatestRelease {
    fn from(d: DesktopRelease) -> Self {
        Self {
            version: d.version,
            released: d.released,
            download_url: d.download_url.unwrap_or_default(),
        }
    }
}

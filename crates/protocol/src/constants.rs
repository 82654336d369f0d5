use serde::{Deserialize, Serialize};

/// Header carrying the plaintext builder key (shared-secret scheme).
pub const BUILDER_KEY_HEADER: &str = "x-builder-key";

/// Header carrying the base64 Ed25519 signature of the raw request body.
pub const SIGNATURE_HEADER: &str = "x-signature";

/// Maximum accepted deploy body (500 MiB).
///
/// Deploys carry whole desktop installers base64-encoded inside JSON.
pub const MAX_DEPLOY_BODY_SIZE: usize = 500 * 1024 * 1024;

/// Storage key of the version document.
pub const VERSION_DOCUMENT_KEY: &str = "releases/version.json";

/// Key prefix for desktop release artifacts.
pub const RELEASES_PREFIX: &str = "releases";

/// Key prefix for the deployed web bundle.
pub const WEB_PREFIX: &str = "web";

/// Root document of the web bundle.
pub const WEB_INDEX: &str = "index.html";

/// URL prefix reserved for updater/API routes (never SPA fallback).
pub const UPDATES_PATH_PREFIX: &str = "/updates";

/// Name of the derived JSON manifest served per platform.
pub const RELEASES_JSON: &str = "RELEASES.json";

/// A desktop target the updater knows how to serve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Platform {
    #[serde(rename = "darwin-arm64")]
    DarwinArm64,
    #[serde(rename = "darwin-x64")]
    DarwinX64,
    #[serde(rename = "win32-x64")]
    Win32X64,
    #[serde(rename = "linux-x64")]
    LinuxX64,
}

impl Platform {
    pub const ALL: [Platform; 4] = [
        Platform::DarwinArm64,
        Platform::DarwinX64,
        Platform::Win32X64,
        Platform::LinuxX64,
    ];

    /// Parses a URL path segment such as `darwin-arm64`.
    pub fn from_segment(segment: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|p| p.as_str() == segment)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::DarwinArm64 => "darwin-arm64",
            Platform::DarwinX64 => "darwin-x64",
            Platform::Win32X64 => "win32-x64",
            Platform::LinuxX64 => "linux-x64",
        }
    }

    /// Suffix used in installer names (`Seance-<version>-<suffix>.<ext>`).
    pub fn artifact_suffix(&self) -> &'static str {
        match self {
            Platform::DarwinArm64 | Platform::DarwinX64 => "mac",
            Platform::Win32X64 => "win",
            Platform::LinuxX64 => "linux",
        }
    }

    pub fn artifact_extension(&self) -> &'static str {
        match self {
            Platform::DarwinArm64 | Platform::DarwinX64 => "dmg",
            Platform::Win32X64 => "exe",
            Platform::LinuxX64 => "AppImage",
        }
    }

    /// MIME type of the installer binary.
    pub fn content_type(&self) -> &'static str {
        match self {
            Platform::DarwinArm64 | Platform::DarwinX64 => "application/x-apple-diskimage",
            Platform::Win32X64 => "application/vnd.microsoft.portable-executable",
            Platform::LinuxX64 => "application/octet-stream",
        }
    }

    /// Channel file name the auto-updater requests for this platform.
    pub fn updater_channel_file(&self) -> &'static str {
        match self {
            Platform::DarwinArm64 | Platform::DarwinX64 => "latest-mac.yml",
            Platform::Win32X64 => "latest.yml",
            Platform::LinuxX64 => "latest-linux.yml",
        }
    }

    /// Returns `true` if `file` names this platform's YAML channel manifest.
    ///
    /// Accepts both `latest-<platform>.yml` and the updater channel name.
    pub fn is_channel_file(&self, file: &str) -> bool {
        file == self.updater_channel_file() || file == format!("latest-{}.yml", self.as_str())
    }

    /// Installer file name for `version`.
    pub fn artifact_file_name(&self, product: &str, version: &str) -> String {
        format!(
            "{product}-{version}-{}.{}",
            self.artifact_suffix(),
            self.artifact_extension()
        )
    }
}

impl std::fmt::Display for Platform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

pub mod constants;
pub mod messages;
pub mod types;

// Re-export primary types for convenience.
pub use constants::Platform;
pub use messages::{DeployFile, DeployRequest, DeployResponse, DeployedFile, ErrorBody};
pub use types::{DesktopRelease, LatestRelease, ReleaseManifest, VersionDocument};

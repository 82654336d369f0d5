//! HTTP surface of the Seance release server.
//!
//! Serves four kinds of traffic from one [`axum::Router`]:
//!
//! - `POST /deploy`: authenticated artifact uploads from CI
//! - `/updates/...`: update metadata and installers for the desktop app
//! - `/downloads/latest`, `/health`: small JSON endpoints
//! - everything else: the deployed web bundle, with SPA fallback

mod deploy;
mod error;
mod manifest;
mod router;
mod server;
mod state;
mod static_files;

#[cfg(test)]
mod test_support;

pub use error::ApiError;
pub use manifest::{ManifestError, ManifestReader};
pub use router::router;
pub use server::{ServerConfig, UpdateServer};
pub use state::{AppState, Distribution};

/// Name reported by the health endpoint.
pub const SERVICE_NAME: &str = "seance-backend";

/// Errors produced by the server.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Current time as RFC 3339 UTC with millisecond precision.
pub(crate) fn timestamp_now() -> String {
    chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true)
}

//! Serves the deployed web bundle with single-page-app fallback.

use axum::extract::State;
use axum::http::{Method, Uri, header};
use axum::response::{IntoResponse, Response};
use percent_encoding::percent_decode_str;
use seance_protocol::constants::{UPDATES_PATH_PREFIX, WEB_INDEX, WEB_PREFIX};
use seance_transfer::normalize_key;

use crate::error::ApiError;
use crate::state::AppState;

/// Router fallback for every path no other route claims.
///
/// `/updates` paths never fall back to the bundle, so a missing update
/// artifact is a 404 and not an HTML page the updater would choke on.
pub(crate) async fn serve(
    State(state): State<AppState>,
    method: Method,
    uri: Uri,
) -> Result<Response, ApiError> {
    if method != Method::GET && method != Method::HEAD {
        return Err(ApiError::not_found());
    }

    let path = uri.path();
    if path.starts_with(UPDATES_PATH_PREFIX) {
        return Err(ApiError::not_found());
    }

    let decoded = percent_decode_str(path)
        .decode_utf8()
        .map_err(|_| ApiError::not_found())?;
    let relative = decoded.trim_start_matches('/');
    let requested = if relative.is_empty() { WEB_INDEX } else { relative };

    let Ok(key) = normalize_key(&format!("{WEB_PREFIX}/{requested}")) else {
        tracing::debug!(%path, "rejected static path");
        return Err(ApiError::not_found());
    };

    if let Some(data) = state.store.get(&key).await? {
        return Ok(file_response(&key, data));
    }

    if !has_extension(requested) {
        let index = format!("{WEB_PREFIX}/{WEB_INDEX}");
        if let Some(data) = state.store.get(&index).await? {
            return Ok(file_response(&index, data));
        }
    }

    Err(ApiError::not_found())
}

fn file_response(key: &str, data: Vec<u8>) -> Response {
    let mime = mime_guess::from_path(key).first_or_octet_stream();
    ([(header::CONTENT_TYPE, mime.essence_str().to_string())], data).into_response()
}

/// Whether the last path segment looks like a file name.
fn has_extension(path: &str) -> bool {
    path.rsplit('/').next().is_some_and(|name| name.contains('.'))
}

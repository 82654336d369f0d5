//! `POST /deploy`: authenticated artifact upload from CI.
//!
//! The body is authenticated before it is parsed, so a signature always
//! covers the exact bytes received.

use axum::Json;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::HeaderMap;
use seance_auth::BuilderRequest;
use seance_protocol::constants::{BUILDER_KEY_HEADER, SIGNATURE_HEADER};
use seance_protocol::{DeployRequest, DeployResponse};
use tracing::Instrument;
use uuid::Uuid;

use crate::error::ApiError;
use crate::state::AppState;
use crate::timestamp_now;

pub(crate) async fn deploy(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<DeployResponse>, ApiError> {
    let span = tracing::info_span!("deploy", id = %Uuid::new_v4());
    handle(state, headers, body).instrument(span).await
}

async fn handle(
    state: AppState,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<DeployResponse>, ApiError> {
    let credentials = BuilderRequest {
        builder_key: header_str(&headers, BUILDER_KEY_HEADER),
        signature: header_str(&headers, SIGNATURE_HEADER),
        body: &body,
    };
    if let Err(e) = state.verifier.verify(&credentials) {
        tracing::warn!(error = %e, size = body.len(), "deploy rejected");
        return Err(e.into());
    }

    let value: serde_json::Value = serde_json::from_slice(&body)
        .map_err(|_| ApiError::BadRequest("Invalid JSON body".into()))?;
    if !value.get("files").is_some_and(serde_json::Value::is_array) {
        return Err(ApiError::BadRequest("files must be an array".into()));
    }
    let request: DeployRequest = serde_json::from_value(value)
        .map_err(|e| ApiError::BadRequest(format!("Invalid deploy request: {e}")))?;

    let outcome = state.writer.deploy(&request).await?;

    Ok(Json(DeployResponse {
        success: true,
        files_deployed: outcome.files.len(),
        files: outcome.files,
        timestamp: timestamp_now(),
    }))
}

/// A header value as text; absent or non-UTF-8 values count as missing.
fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}

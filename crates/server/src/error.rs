use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use seance_auth::AuthError;
use seance_protocol::ErrorBody;
use seance_storage::{DeployError, StorageError};

use crate::manifest::ManifestError;

/// An error returned to an HTTP client as an [`ErrorBody`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    Unauthorized(String),
    BadRequest(String),
    NotFound(String),
    Internal {
        error: String,
        message: Option<String>,
    },
}

impl ApiError {
    pub fn not_found() -> Self {
        ApiError::NotFound("Not found".into())
    }

    pub fn internal(message: impl Into<String>) -> Self {
        ApiError::Internal {
            error: "Internal server error".into(),
            message: Some(message.into()),
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match self {
            ApiError::Unauthorized(error) | ApiError::BadRequest(error) | ApiError::NotFound(error) => {
                ErrorBody::new(error)
            }
            ApiError::Internal { error, message } => ErrorBody { error, message },
        };
        (status, Json(body)).into_response()
    }
}

impl From<AuthError> for ApiError {
    fn from(error: AuthError) -> Self {
        if error.is_rejection() {
            ApiError::Unauthorized(error.to_string())
        } else {
            ApiError::internal(error.to_string())
        }
    }
}

impl From<DeployError> for ApiError {
    fn from(error: DeployError) -> Self {
        if error.is_client_error() {
            ApiError::BadRequest(error.to_string())
        } else {
            ApiError::Internal {
                error: "Deployment failed".into(),
                message: Some(error.to_string()),
            }
        }
    }
}

impl From<StorageError> for ApiError {
    fn from(error: StorageError) -> Self {
        match error {
            StorageError::InvalidKey(e) => ApiError::BadRequest(e.to_string()),
            other => {
                tracing::error!(error = %other, "storage read failed");
                ApiError::internal(other.to_string())
            }
        }
    }
}

impl From<ManifestError> for ApiError {
    fn from(error: ManifestError) -> Self {
        match error {
            ManifestError::Storage(e) => e.into(),
            ManifestError::VersionDataMissing => {
                tracing::error!("releases/version.json is missing");
                ApiError::Internal {
                    error: "Version data not found".into(),
                    message: None,
                }
            }
            e if e.is_not_found() => ApiError::NotFound(e.to_string()),
            ManifestError::Malformed(e) => {
                tracing::error!(error = %e, "version data is not valid JSON");
                ApiError::Internal {
                    error: "Invalid version data".into(),
                    message: Some(e.to_string()),
                }
            }
            other => {
                tracing::error!(error = %other, "cannot serve release metadata");
                ApiError::Internal {
                    error: "Version data not found".into(),
                    message: Some(other.to_string()),
                }
            }
        }
    }
}

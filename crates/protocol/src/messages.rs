use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Request payloads
// ---------------------------------------------------------------------------

/// A single file in a deploy batch.
///
/// `content` stays base64 text here; decoding is part of batch validation
/// so that a bad entry is reported as a rejected file, not a parse error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeployFile {
    #[serde(default)]
    pub path: String,
    #[serde(default)]
    pub content: String,
}

impl DeployFile {
    /// Entries with no path or no content are skipped, not rejected.
    pub fn is_blank(&self) -> bool {
        self.path.is_empty() || self.content.is_empty()
    }
}

/// Body of `POST /deploy`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeployRequest {
    pub files: Vec<DeployFile>,
    #[serde(default)]
    pub clear_web: bool,
}

// ---------------------------------------------------------------------------
// Responses
// ---------------------------------------------------------------------------

/// A file written by a deploy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeployedFile {
    pub path: String,
    pub size: u64,
    /// Public URL, when the store publishes objects.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

/// Successful deploy result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeployResponse {
    pub success: bool,
    pub files_deployed: usize,
    #[serde(default)]
    pub files: Vec<DeployedFile>,
    pub timestamp: String,
}

/// Error body shared by every endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl ErrorBody {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            message: None,
        }
    }

    pub fn with_message(error: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            message: Some(message.into()),
        }
    }
}

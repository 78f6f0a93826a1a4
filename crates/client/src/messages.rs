//! Wire messages exchanged with the generation service.
//!
//! `GET /status/{job_id}` returns `{"status", "progress", "video_url"}`;
//! extra fields (the echoed request, for instance) are ignored. The status
//! string is parsed into [`JobStatus`], which keeps unrecognised values as
//! `Unknown` instead of failing the whole payload.

use reelgen_core::JobStatus;
use serde::{Deserialize, Deserializer, Serialize};

/// Body of `POST /generate`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GenerateRequest {
    pub script: String,
    pub style: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    /// References to previously uploaded assets.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub attachments: Vec<String>,
}

/// Response of `POST /generate`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SubmitResponse {
    /// Server-assigned job identifier.
    pub job_id: String,
    /// Initial status, when the server reports one.
    #[serde(default)]
    pub status: Option<JobStatus>,
}

/// Response of `GET /status/{job_id}`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct StatusResponse {
    pub status: JobStatus,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub progress: String,
    #[serde(default)]
    pub video_url: Option<String>,
}

/// Error body returned by the service on rejected requests.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ErrorBody {
    pub detail: serde_json::Value,
}

impl StatusResponse {
    /// The result URL, treating a blank string as absent.
    pub fn result_url(&self) -> Option<&str> {
        self.video_url
            .as_deref()
            .map(str::trim)
            .filter(|url| !url.is_empty())
    }
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

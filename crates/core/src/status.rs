//! Job status variant parsed from the generation service.
//!
//! The service reports status as a free-form upper-case string. Known
//! values map to dedicated variants; anything else is kept verbatim in
//! [`JobStatus::Unknown`] so a malformed payload can never be mistaken for
//! a terminal state.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Lifecycle status of a generation job.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum JobStatus {
    Queued,
    AnalyzingScript,
    GeneratingPrompts,
    InvokingBedrock,
    PollingClips,
    Analyzing,
    Generating,
    Processing,
    InProgress,
    Completed,
    Failed,
    /// Synthesized locally after a failed status fetch. Never sent by the
    /// server.
    Retrying,
    /// A status string this client does not recognise.
    Unknown(String),
}

impl JobStatus {
    /// Wire representation (e.g. `"ANALYZING_SCRIPT"`).
    pub fn as_str(&self) -> &str {
        match self {
            JobStatus::Queued => "QUEUED",
            JobStatus::AnalyzingScript => "ANALYZING_SCRIPT",
            JobStatus::GeneratingPrompts => "GENERATING_PROMPTS",
            JobStatus::InvokingBedrock => "INVOKING_BEDROCK",
            JobStatus::PollingClips => "POLLING_CLIPS",
            JobStatus::Analyzing => "ANALYZING",
            JobStatus::Generating => "GENERATING",
            JobStatus::Processing => "PROCESSING",
            JobStatus::InProgress => "IN_PROGRESS",
            JobStatus::Completed => "COMPLETED",
            JobStatus::Failed => "FAILED",
            JobStatus::Retrying => "RETRYING",
            JobStatus::Unknown(raw) => raw,
        }
    }

    /// Parse a wire status. Matching is case-insensitive and ignores
    /// surrounding whitespace; unrecognised values become `Unknown`.
    pub fn parse(raw: &str) -> Self {
        let normalized = raw.trim().to_ascii_uppercase();
        match normalized.as_str() {
            "QUEUED" => JobStatus::Queued,
            "ANALYZING_SCRIPT" => JobStatus::AnalyzingScript,
            "GENERATING_PROMPTS" => JobStatus::GeneratingPrompts,
            "INVOKING_BEDROCK" => JobStatus::InvokingBedrock,
            "POLLING_CLIPS" => JobStatus::PollingClips,
            "ANALYZING" => JobStatus::Analyzing,
            "GENERATING" => JobStatus::Generating,
            "PROCESSING" => JobStatus::Processing,
            "IN_PROGRESS" => JobStatus::InProgress,
            "COMPLETED" => JobStatus::Completed,
            "FAILED" => JobStatus::Failed,
            "RETRYING" => JobStatus::Retrying,
            _ => JobStatus::Unknown(raw.to_string()),
        }
    }

    /// `true` for COMPLETED and FAILED. No transition leaves these states.
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Failed)
    }

    /// `true` for statuses the server may legitimately report.
    pub fn is_known(&self) -> bool {
        !matches!(self, JobStatus::Unknown(_))
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<String> for JobStatus {
    fn from(raw: String) -> Self {
        JobStatus::parse(&raw)
    }
}

impl From<JobStatus> for String {
    fn from(status: JobStatus) -> Self {
        status.as_str().to_string()
    }
}

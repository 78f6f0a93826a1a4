//! Events broadcast by the tracker to the presentation layer.
//!
//! Terminal events (`JobCompleted`, `JobFailed`) are sent only when the
//! reconciler accepted the outcome, so each job produces at most one of
//! them.

use reelgen_core::types::{JobId, SessionId};
use reelgen_core::JobStatus;
use serde::Serialize;

/// A tracker-level state change.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TrackerEvent {
    /// A job was accepted by the generation service.
    JobSubmitted {
        session_id: SessionId,
        job_id: JobId,
    },

    /// A new (status, progress) pair was observed.
    JobProgress {
        session_id: SessionId,
        job_id: JobId,
        status: JobStatus,
        progress: String,
    },

    /// A status check failed and will be retried.
    JobRetrying {
        session_id: SessionId,
        job_id: JobId,
        attempt: u32,
        reason: String,
    },

    /// The job finished with a result URL.
    JobCompleted {
        session_id: SessionId,
        job_id: JobId,
        result_url: String,
    },

    /// The job failed, or tracking gave up on it.
    JobFailed {
        session_id: SessionId,
        job_id: JobId,
        reason: String,
    },

    /// Tracking was cancelled before the job reached a terminal state.
    JobCancelled {
        session_id: SessionId,
        job_id: JobId,
    },
}

impl TrackerEvent {
    pub fn job_id(&self) -> &str {
        match self {
            TrackerEvent::JobSubmitted { job_id, .. }
            | TrackerEvent::JobProgress { job_id, .. }
            | TrackerEvent::JobRetrying { job_id, .. }
            | TrackerEvent::JobCompleted { job_id, .. }
            | TrackerEvent::JobFailed { job_id, .. }
            | TrackerEvent::JobCancelled { job_id, .. } => job_id,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            TrackerEvent::JobCompleted { .. } | TrackerEvent::JobFailed { .. }
        )
    }
}

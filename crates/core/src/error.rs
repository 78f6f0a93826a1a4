use crate::types::{JobId, SessionId};

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Session not found: {0}")]
    SessionNotFound(SessionId),

    #[error("Job {job_id} not found in session {session_id}")]
    JobNotFound { session_id: SessionId, job_id: JobId },

    #[error("Conflict: {0}")]
    Conflict(String),
}

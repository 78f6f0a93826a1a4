//! Sessions and the jobs that belong to them.
//!
//! A [`Session`] is one user-initiated generation request. Each submission
//! to the generation service creates a [`Job`] inside the session; a session
//! survives across several job attempts (resubmissions after a failure).

use chrono::Utc;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::limits::push_capped;
use crate::status::JobStatus;
use crate::types::{new_session_id, JobId, SessionId, Timestamp};

// ---------------------------------------------------------------------------
// Job
// ---------------------------------------------------------------------------

/// One (status, progress) observation in a job's history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobSnapshot {
    pub status: JobStatus,
    pub progress: String,
    pub at: Timestamp,
}

/// One polling lifecycle for a job id issued by the generation service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Job {
    pub id: JobId,
    pub status: JobStatus,
    #[serde(default)]
    pub progress: String,
    #[serde(default)]
    pub history: Vec<JobSnapshot>,
    /// Present only when `status` is COMPLETED.
    #[serde(default)]
    pub result_url: Option<String>,
    /// Failure reason, present only when `status` is FAILED.
    #[serde(default)]
    pub error: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// Partial update for a [`Job`]. `None` fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct JobPatch {
    pub status: Option<JobStatus>,
    pub progress: Option<String>,
    pub result_url: Option<String>,
    pub error: Option<String>,
}

impl Job {
    /// A freshly submitted job, in QUEUED state.
    pub fn new(id: impl Into<JobId>) -> Self {
        let now = Utc::now();
        Self {
            id: id.into(),
            status: JobStatus::Queued,
            progress: String::new(),
            history: Vec::new(),
            result_url: None,
            error: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// Shallow-merge `patch` into the job.
    ///
    /// Returns `false` without touching anything when the job is already
    /// COMPLETED or FAILED. A result URL is only kept when the resulting
    /// status is COMPLETED.
    pub fn apply(&mut self, patch: JobPatch) -> bool {
        if self.is_terminal() {
            return false;
        }
        if let Some(status) = patch.status {
            self.status = status;
        }
        if let Some(progress) = patch.progress {
            self.progress = progress;
        }
        if let Some(url) = patch.result_url {
            self.result_url = Some(url);
        }
        if let Some(error) = patch.error {
            self.error = Some(error);
        }
        if self.status != JobStatus::Completed {
            self.result_url = None;
        }
        self.updated_at = Utc::now();
        true
    }

    /// Append a history snapshot, keeping at most `limit` entries.
    ///
    /// History is a log and may still grow after the job turned terminal
    /// (the final snapshot is written after the status update).
    pub fn record(&mut self, status: JobStatus, progress: impl Into<String>, limit: usize) {
        let snapshot = JobSnapshot {
            status,
            progress: progress.into(),
            at: Utc::now(),
        };
        push_capped(&mut self.history, snapshot, limit);
    }
}

// ---------------------------------------------------------------------------
// Session
// ---------------------------------------------------------------------------

/// A user-facing unit of work, persisted across restarts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub id: SessionId,
    pub script: String,
    pub style: String,
    #[serde(default)]
    pub model: Option<String>,
    pub created_at: Timestamp,
    /// Human-readable timeline, oldest first.
    #[serde(default)]
    pub status_history: Vec<String>,
    /// Jobs in submission order.
    #[serde(default)]
    pub jobs: IndexMap<JobId, Job>,
    /// The job currently being polled, if any.
    #[serde(default)]
    pub active_job_id: Option<JobId>,
    #[serde(default)]
    pub video_url: Option<String>,
}

/// Partial update for a [`Session`]. `None` fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionPatch {
    pub script: Option<String>,
    pub style: Option<String>,
    pub model: Option<String>,
    pub video_url: Option<String>,
}

impl Session {
    /// Create a session with a fresh id and the current time.
    pub fn new(script: impl Into<String>, style: impl Into<String>, model: Option<String>) -> Self {
        Self {
            id: new_session_id(),
            script: script.into(),
            style: style.into(),
            model,
            created_at: Utc::now(),
            status_history: Vec::new(),
            jobs: IndexMap::new(),
            active_job_id: None,
            video_url: None,
        }
    }

    pub fn job(&self, job_id: &str) -> Option<&Job> {
        self.jobs.get(job_id)
    }

    pub fn job_mut(&mut self, job_id: &str) -> Option<&mut Job> {
        self.jobs.get_mut(job_id)
    }

    /// The job currently being polled, if any.
    pub fn active_job(&self) -> Option<&Job> {
        self.active_job_id
            .as_deref()
            .and_then(|id| self.jobs.get(id))
    }

    /// The most recently submitted job.
    pub fn latest_job(&self) -> Option<&Job> {
        self.jobs.values().last()
    }

    /// Shallow-merge `patch` into the session.
    pub fn apply(&mut self, patch: SessionPatch) {
        if let Some(script) = patch.script {
            self.script = script;
        }
        if let Some(style) = patch.style {
            self.style = style;
        }
        if let Some(model) = patch.model {
            self.model = Some(model);
        }
        if let Some(url) = patch.video_url {
            self.video_url = Some(url);
        }
    }

    /// Fold a re-created session with the same id into this one.
    ///
    /// Descriptive fields are overwritten by `incoming`. The creation time
    /// of the existing record is kept. Jobs with unseen ids are added and
    /// incoming timeline entries are appended, so nothing recorded so far
    /// is lost.
    pub fn merge(&mut self, incoming: Session, history_limit: usize) {
        self.script = incoming.script;
        self.style = incoming.style;
        if incoming.model.is_some() {
            self.model = incoming.model;
        }
        if incoming.video_url.is_some() {
            self.video_url = incoming.video_url;
        }
        if incoming.active_job_id.is_some() {
            self.active_job_id = incoming.active_job_id;
        }
        for (id, job) in incoming.jobs {
            self.jobs.entry(id).or_insert(job);
        }
        for entry in incoming.status_history {
            push_capped(&mut self.status_history, entry, history_limit);
        }
    }

    /// Append a timeline entry, keeping at most `limit` entries.
    pub fn push_status(&mut self, text: impl Into<String>, limit: usize) {
        push_capped(&mut self.status_history, text.into(), limit);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_sessions_get_distinct_ids() {
        let a = Session::new("script", "anime", None);
        let b = Session::new("script", "anime", None);
        assert_ne!(a.id, b.id);
        assert!(a.jobs.is_empty());
        assert!(a.video_url.is_none());
    }

    #[test]
    fn job_patch_is_ignored_once_terminal() {
        let mut job = Job::new("abc123");
        assert!(job.apply(JobPatch {
            status: Some(JobStatus::Failed),
            error: Some("boom".into()),
            ..Default::default()
        }));

        let applied = job.apply(JobPatch {
            status: Some(JobStatus::Completed),
            result_url: Some("https://x/video.mp4".into()),
            ..Default::default()
        });
        assert!(!applied);
        assert_eq!(job.status, JobStatus::Failed);
        assert!(job.result_url.is_none());
    }

    #[test]
    fn result_url_dropped_unless_completed() {
        let mut job = Job::new("abc123");
        job.apply(JobPatch {
            status: Some(JobStatus::Generating),
            result_url: Some("https://x/early.mp4".into()),
            ..Default::default()
        });
        assert!(job.result_url.is_none());

        job.apply(JobPatch {
            status: Some(JobStatus::Completed),
            result_url: Some("https://x/video.mp4".into()),
            ..Default::default()
        });
        assert_eq!(job.result_url.as_deref(), Some("https://x/video.mp4"));
    }

    #[test]
    fn merge_keeps_existing_jobs_and_creation_time() {
        let mut existing = Session::new("old script", "noir", None);
        existing.jobs.insert("j1".into(), Job::new("j1"));
        existing.push_status("Submitted", 50);
        let created_at = existing.created_at;

        let mut incoming = existing.clone();
        incoming.script = "new script".into();
        incoming.jobs.clear();
        incoming.status_history = vec!["Edited".into()];
        incoming.created_at = Utc::now();

        existing.merge(incoming, 50);
        assert_eq!(existing.script, "new script");
        assert_eq!(existing.created_at, created_at);
        assert!(existing.jobs.contains_key("j1"));
        assert_eq!(existing.status_history, vec!["Submitted", "Edited"]);
    }

    #[test]
    fn session_round_trips_through_json() {
        let mut session = Session::new("a cat", "watercolor", Some("nova-reel".into()));
        let mut job = Job::new("abc123");
        job.record(JobStatus::Queued, "Awaiting generation...", 50);
        session.jobs.insert(job.id.clone(), job);

        let json = serde_json::to_string(&session).unwrap();
        let parsed: Session = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, session);
    }
}

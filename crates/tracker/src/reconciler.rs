//! Applies poller events to the session store.
//!
//! Each [`PollEvent`] becomes a set of store mutations: a job status
//! update, a job history snapshot, and a human-readable entry on the
//! session timeline. Terminal events additionally yield a [`JobOutcome`].
//!
//! Before touching anything the reconciler checks the job's persisted
//! status. Once a job is COMPLETED or FAILED every further event for it is
//! ignored, so a duplicated terminal event can never produce a second
//! outcome. Persistence failures are logged and do not interrupt tracking;
//! the in-memory store already holds the new state.

use chrono::Utc;
use reelgen_core::{JobPatch, JobStatus, SessionPatch};
use reelgen_store::{SessionStore, StoreError};

use crate::poller::PollEvent;

/// Final result of tracking one job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobOutcome {
    /// The job completed and produced `result_url`.
    Completed { result_url: String },
    /// The job failed; `reason` is user-facing.
    Failed { reason: String },
    /// Tracking stopped before the job finished. The job may still be
    /// running remotely and can be resumed.
    Cancelled,
}

impl JobOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, JobOutcome::Completed { .. })
    }
}

/// Reconciles events for one (session, job) pair.
pub struct Reconciler<'a> {
    store: &'a mut SessionStore,
    session_id: &'a str,
    job_id: &'a str,
}

impl<'a> Reconciler<'a> {
    pub fn new(store: &'a mut SessionStore, session_id: &'a str, job_id: &'a str) -> Self {
        Self {
            store,
            session_id,
            job_id,
        }
    }

    /// Apply one event. Returns an outcome only for the first terminal
    /// event accepted for this job.
    pub fn apply(&mut self, event: &PollEvent) -> Option<JobOutcome> {
        let Some(job) = self.store.get_job(self.session_id, self.job_id) else {
            tracing::warn!(
                session_id = %self.session_id,
                job_id = %self.job_id,
                "Dropping event for unknown job",
            );
            return None;
        };
        if job.is_terminal() {
            tracing::debug!(
                job_id = %self.job_id,
                status = %job.status,
                "Ignoring event for finished job",
            );
            return None;
        }

        match event {
            PollEvent::StatusChanged { status, progress } => {
                self.update_job(JobPatch {
                    status: Some(status.clone()),
                    progress: Some(progress.clone()),
                    ..Default::default()
                });
                self.record(status.clone(), progress);
                self.timeline(status.as_str(), progress);
                None
            }
            PollEvent::Retrying { attempt, reason } => {
                // RETRYING goes to the history and timeline only; the job
                // keeps its last real status.
                self.record(JobStatus::Retrying, reason);
                self.timeline(&format!("RETRYING (attempt {attempt})"), reason);
                None
            }
            PollEvent::Completed {
                result_url,
                progress,
            } => {
                self.update_job(JobPatch {
                    status: Some(JobStatus::Completed),
                    progress: Some(progress.clone()),
                    result_url: Some(result_url.clone()),
                    ..Default::default()
                });
                self.record(JobStatus::Completed, progress);
                log_persist(self.store.update_session(
                    self.session_id,
                    SessionPatch {
                        video_url: Some(result_url.clone()),
                        ..Default::default()
                    },
                ));
                self.timeline(JobStatus::Completed.as_str(), progress);
                Some(JobOutcome::Completed {
                    result_url: result_url.clone(),
                })
            }
            PollEvent::Failed { reason } => {
                self.update_job(JobPatch {
                    status: Some(JobStatus::Failed),
                    error: Some(reason.clone()),
                    ..Default::default()
                });
                self.record(JobStatus::Failed, reason);
                self.timeline(JobStatus::Failed.as_str(), reason);
                Some(JobOutcome::Failed {
                    reason: reason.clone(),
                })
            }
        }
    }

    // ---- private helpers ----

    fn update_job(&mut self, patch: JobPatch) {
        log_persist(self.store.update_job(self.session_id, self.job_id, patch));
    }

    fn record(&mut self, status: JobStatus, progress: &str) {
        log_persist(
            self.store
                .append_job_status(self.session_id, self.job_id, status, progress),
        );
    }

    fn timeline(&mut self, label: &str, detail: &str) {
        let entry = timeline_entry(label, detail);
        log_persist(self.store.append_status(self.session_id, entry));
    }
}

/// Format a timeline line: `HH:MM:SS LABEL: detail` (detail omitted when
/// blank).
pub fn timeline_entry(label: &str, detail: &str) -> String {
    let time = Utc::now().format("%H:%M:%S");
    let detail = detail.trim();
    if detail.is_empty() {
        format!("{time} {label}")
    } else {
        format!("{time} {label}: {detail}")
    }
}

fn log_persist(result: Result<bool, StoreError>) {
    if let Err(e) = result {
        tracing::error!(error = %e, "Failed to persist tracking update");
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use reelgen_core::{Job, Session};
    use reelgen_store::{MemoryStorage, StoreConfig};

    use super::*;

    fn store_with_job(job_id: &str) -> (SessionStore, String) {
        let mut store = SessionStore::open(Arc::new(MemoryStorage::new()), StoreConfig::default());
        let session = Session::new("script", "style", None);
        let id = session.id.clone();
        store.create_session(session).unwrap();
        store.register_job(&id, Job::new(job_id)).unwrap();
        (store, id)
    }

    fn completed() -> PollEvent {
        PollEvent::Completed {
            result_url: "https://x/video.mp4".into(),
            progress: "done".into(),
        }
    }

    #[test]
    fn status_change_updates_job_and_timeline() {
        let (mut store, sid) = store_with_job("abc123");
        let outcome = Reconciler::new(&mut store, &sid, "abc123").apply(&PollEvent::StatusChanged {
            status: JobStatus::AnalyzingScript,
            progress: "Parsing script".into(),
        });
        assert!(outcome.is_none());

        let session = store.get_session_by_id(&sid).unwrap();
        let job = session.job("abc123").unwrap();
        assert_eq!(job.status, JobStatus::AnalyzingScript);
        assert_eq!(job.progress, "Parsing script");
        assert_eq!(job.history.len(), 1);
        assert!(session
            .status_history
            .last()
            .unwrap()
            .ends_with("ANALYZING_SCRIPT: Parsing script"));
    }

    #[test]
    fn completed_outcome_is_returned_once() {
        let (mut store, sid) = store_with_job("abc123");

        let first = Reconciler::new(&mut store, &sid, "abc123").apply(&completed());
        let second = Reconciler::new(&mut store, &sid, "abc123").apply(&completed());
        let late_failure = Reconciler::new(&mut store, &sid, "abc123").apply(&PollEvent::Failed {
            reason: "late".into(),
        });

        assert_eq!(
            first,
            Some(JobOutcome::Completed {
                result_url: "https://x/video.mp4".into()
            })
        );
        assert!(second.is_none());
        assert!(late_failure.is_none());

        let session = store.get_session_by_id(&sid).unwrap();
        let job = session.job("abc123").unwrap();
        assert_eq!(job.status, JobStatus::Completed);
        assert_eq!(job.result_url.as_deref(), Some("https://x/video.mp4"));
        assert_eq!(session.video_url.as_deref(), Some("https://x/video.mp4"));
        assert!(session.active_job_id.is_none());
        let completed_entries = session
            .status_history
            .iter()
            .filter(|e| e.contains("COMPLETED"))
            .count();
        assert_eq!(completed_entries, 1);
    }

    #[test]
    fn failure_marks_job_failed_without_url() {
        let (mut store, sid) = store_with_job("j");
        let outcome = Reconciler::new(&mut store, &sid, "j").apply(&PollEvent::Failed {
            reason: "Job completed but no video URL was provided".into(),
        });
        assert_eq!(
            outcome,
            Some(JobOutcome::Failed {
                reason: "Job completed but no video URL was provided".into()
            })
        );

        let session = store.get_session_by_id(&sid).unwrap();
        let job = session.job("j").unwrap();
        assert_eq!(job.status, JobStatus::Failed);
        assert!(job.result_url.is_none());
        assert!(session.video_url.is_none());
        assert_eq!(
            job.error.as_deref(),
            Some("Job completed but no video URL was provided")
        );
    }

    #[test]
    fn retrying_keeps_last_real_status() {
        let (mut store, sid) = store_with_job("j");
        let mut reconciler = Reconciler::new(&mut store, &sid, "j");
        reconciler.apply(&PollEvent::StatusChanged {
            status: JobStatus::Generating,
            progress: String::new(),
        });
        reconciler.apply(&PollEvent::Retrying {
            attempt: 1,
            reason: "HTTP request failed".into(),
        });

        let session = store.get_session_by_id(&sid).unwrap();
        let job = session.job("j").unwrap();
        assert_eq!(job.status, JobStatus::Generating);
        assert_eq!(job.history.last().unwrap().status, JobStatus::Retrying);
        assert!(session
            .status_history
            .last()
            .unwrap()
            .contains("RETRYING (attempt 1): HTTP request failed"));
    }

    #[test]
    fn unknown_job_is_ignored() {
        let (mut store, sid) = store_with_job("j");
        assert!(Reconciler::new(&mut store, &sid, "other")
            .apply(&completed())
            .is_none());
        assert!(Reconciler::new(&mut store, "no-session", "j")
            .apply(&completed())
            .is_none());
    }

    #[test]
    fn timeline_entry_omits_blank_detail() {
        assert!(timeline_entry("QUEUED", "  ").ends_with(" QUEUED"));
        assert!(timeline_entry("FAILED", "boom").ends_with(" FAILED: boom"));
    }
}

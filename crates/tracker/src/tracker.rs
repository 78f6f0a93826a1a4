//! Job tracker: submission, polling and reconciliation in one place.
//!
//! [`JobTracker`] owns the [`SessionStore`] and a handle to the generation
//! service. It submits requests, drives a [`JobPoller`] for each job and
//! feeds every poller event through a [`Reconciler`]. Presentation layers
//! observe progress through [`JobTracker::subscribe`].
//!
//! Tracking is cancelled through the master [`CancellationToken`]; each
//! `track` call runs under a child token so shutdown reaches all of them.

use std::sync::Arc;

use reelgen_client::{ApiError, GenerateRequest, GenerationService};
use reelgen_core::limits::{DEFAULT_FAILURE_MESSAGE, MISSING_RESULT_URL_MESSAGE};
use reelgen_core::types::{JobId, SessionId};
use reelgen_core::{CoreError, Job, JobStatus, Session, SessionPatch};
use reelgen_store::{SessionStore, StoreError};
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;

use crate::config::PollerConfig;
use crate::events::TrackerEvent;
use crate::poller::{JobPoller, PollEvent};
use crate::reconciler::{timeline_entry, JobOutcome, Reconciler};

/// Broadcast channel capacity for tracker events.
const EVENT_CHANNEL_CAPACITY: usize = 256;

/// Identifies a submitted job within its session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Submission {
    pub session_id: SessionId,
    pub job_id: JobId,
}

#[derive(Debug, thiserror::Error)]
pub enum TrackerError {
    /// The service refused or never received the submission. The message
    /// is the service's own.
    #[error(transparent)]
    Submit(ApiError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Core(#[from] CoreError),
}

/// Submits generation requests and tracks them to a single outcome.
pub struct JobTracker {
    service: Arc<dyn GenerationService>,
    store: SessionStore,
    poller_config: PollerConfig,
    event_tx: broadcast::Sender<TrackerEvent>,
    /// Master cancellation token; cancelled by [`shutdown`](Self::shutdown).
    cancel: CancellationToken,
}

impl JobTracker {
    pub fn new(
        service: Arc<dyn GenerationService>,
        store: SessionStore,
        poller_config: PollerConfig,
    ) -> Self {
        let (event_tx, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            service,
            store,
            poller_config,
            event_tx,
            cancel: CancellationToken::new(),
        }
    }

    pub fn store(&self) -> &SessionStore {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut SessionStore {
        &mut self.store
    }

    pub fn poller_config(&self) -> &PollerConfig {
        &self.poller_config
    }

    /// Subscribe to tracker events.
    pub fn subscribe(&self) -> broadcast::Receiver<TrackerEvent> {
        self.event_tx.subscribe()
    }

    /// A clone of the master token. Cancelling it stops every `track` call.
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Stop all in-flight tracking. Jobs stay non-terminal in the store and
    /// can be resumed later.
    pub fn shutdown(&self) {
        tracing::info!("Shutting down job tracker");
        self.cancel.cancel();
    }

    /// Create a session for `request` and submit it.
    ///
    /// A rejected submission is recorded on the new session's timeline and
    /// returned as [`TrackerError::Submit`].
    pub async fn submit(&mut self, request: GenerateRequest) -> Result<Submission, TrackerError> {
        let session = Session::new(
            request.script.clone(),
            request.style.clone(),
            request.model.clone(),
        );
        let session_id = session.id.clone();
        self.store.create_session(session)?;
        tracing::info!(session_id = %session_id, "Session created");

        self.submit_to_session(&session_id, &request).await
    }

    /// Submit and then track until the job reaches an outcome.
    pub async fn submit_and_track(
        &mut self,
        request: GenerateRequest,
    ) -> Result<(Submission, JobOutcome), TrackerError> {
        let submission = self.submit(request).await?;
        let outcome = self
            .track(&submission.session_id, &submission.job_id)
            .await?;
        Ok((submission, outcome))
    }

    /// Apply `patch` to an existing session and submit a new job for it.
    ///
    /// Fails with [`CoreError::Conflict`] while the session still has a
    /// job in progress, before anything is sent to the service.
    pub async fn retry(
        &mut self,
        session_id: &str,
        patch: SessionPatch,
    ) -> Result<Submission, TrackerError> {
        let session = self
            .store
            .get_session_by_id(session_id)
            .ok_or_else(|| CoreError::SessionNotFound(session_id.to_string()))?;
        if let Some(active) = session.active_job().filter(|job| !job.is_terminal()) {
            return Err(CoreError::Conflict(format!(
                "job {} is still in progress for session {session_id}",
                active.id
            ))
            .into());
        }

        self.store.update_session(session_id, patch)?;
        self.store.set_active_session(session_id)?;

        let request = {
            let session = self
                .store
                .get_session_by_id(session_id)
                .ok_or_else(|| CoreError::SessionNotFound(session_id.to_string()))?;
            GenerateRequest {
                script: session.script.clone(),
                style: session.style.clone(),
                model: session.model.clone(),
                attachments: Vec::new(),
            }
        };
        tracing::info!(session_id, "Retrying generation");
        self.submit_to_session(session_id, &request).await
    }

    /// Poll a job until it reaches an outcome or tracking is cancelled.
    ///
    /// A job that is already COMPLETED or FAILED in the store returns its
    /// recorded outcome without contacting the service.
    pub async fn track(
        &mut self,
        session_id: &str,
        job_id: &str,
    ) -> Result<JobOutcome, TrackerError> {
        let job = self
            .store
            .get_job(session_id, job_id)
            .ok_or_else(|| CoreError::JobNotFound {
                session_id: session_id.to_string(),
                job_id: job_id.to_string(),
            })?;
        if let Some(outcome) = recorded_outcome(job) {
            tracing::debug!(session_id, job_id, "Job already finished");
            return Ok(outcome);
        }

        let mut poller = JobPoller::new(job_id, self.poller_config);
        if !job.history.is_empty() {
            poller = poller.resume_from(job.status.clone(), job.progress.clone());
        }

        tracing::info!(session_id, job_id, "Tracking job");
        let service = Arc::clone(&self.service);
        let cancel = self.cancel.child_token();
        let store = &mut self.store;
        let event_tx = &self.event_tx;
        let mut outcome = None;

        poller
            .run(service.as_ref(), &cancel, |event| {
                if let Some(progress) = progress_event(session_id, job_id, &event) {
                    let _ = event_tx.send(progress);
                }
                if let Some(result) = Reconciler::new(&mut *store, session_id, job_id).apply(&event) {
                    let _ = event_tx.send(terminal_event(session_id, job_id, &result));
                    outcome = Some(result);
                }
            })
            .await;

        let outcome = match outcome {
            Some(outcome) => outcome,
            // The poller can also stop on a terminal event the reconciler
            // declined (job finished concurrently); report what the store has.
            None => match self.store.get_job(session_id, job_id).and_then(recorded_outcome) {
                Some(recorded) => recorded,
                None => {
                    tracing::info!(session_id, job_id, "Tracking cancelled");
                    let _ = self.event_tx.send(TrackerEvent::JobCancelled {
                        session_id: session_id.to_string(),
                        job_id: job_id.to_string(),
                    });
                    JobOutcome::Cancelled
                }
            },
        };
        Ok(outcome)
    }

    /// Resume the active session's in-progress job after a restart.
    ///
    /// Returns `None` when there is no active session or its job already
    /// finished.
    pub async fn resume_active(
        &mut self,
    ) -> Result<Option<(Submission, JobOutcome)>, TrackerError> {
        let Some(session) = self.store.active_session() else {
            return Ok(None);
        };
        let Some(job) = session.active_job().filter(|job| !job.is_terminal()) else {
            tracing::debug!(session_id = %session.id, "Active session has no job in progress");
            return Ok(None);
        };
        let submission = Submission {
            session_id: session.id.clone(),
            job_id: job.id.clone(),
        };

        tracing::info!(
            session_id = %submission.session_id,
            job_id = %submission.job_id,
            "Resuming job",
        );
        self.store
            .append_status(&submission.session_id, timeline_entry("RESUMED", "Resumed tracking"))?;
        let outcome = self
            .track(&submission.session_id, &submission.job_id)
            .await?;
        Ok(Some((submission, outcome)))
    }

    // ---- private helpers ----

    async fn submit_to_session(
        &mut self,
        session_id: &str,
        request: &GenerateRequest,
    ) -> Result<Submission, TrackerError> {
        let response = match self.service.submit(request).await {
            Ok(response) if response.job_id.trim().is_empty() => {
                Err(ApiError::Decode("response did not include a job id".into()))
            }
            other => other,
        };
        let response = match response {
            Ok(response) => response,
            Err(e) => {
                tracing::error!(session_id, error = %e, "Submission failed");
                self.store
                    .append_status(session_id, timeline_entry("Submission failed", &e.to_string()))?;
                return Err(TrackerError::Submit(e));
            }
        };

        let mut job = Job::new(response.job_id.clone());
        if let Some(status) = response.status.filter(|s| !s.is_terminal()) {
            job.status = status;
        }
        let initial = job.status.clone();
        self.store.register_job(session_id, job)?;
        self.store.append_status(
            session_id,
            timeline_entry(initial.as_str(), &format!("Job {} submitted", response.job_id)),
        )?;

        tracing::info!(session_id, job_id = %response.job_id, "Job submitted");
        let _ = self.event_tx.send(TrackerEvent::JobSubmitted {
            session_id: session_id.to_string(),
            job_id: response.job_id.clone(),
        });

        Ok(Submission {
            session_id: session_id.to_string(),
            job_id: response.job_id,
        })
    }
}

/// The outcome stored for a finished job, or `None` while it is running.
fn recorded_outcome(job: &Job) -> Option<JobOutcome> {
    match job.status {
        JobStatus::Completed => match &job.result_url {
            Some(url) => Some(JobOutcome::Completed {
                result_url: url.clone(),
            }),
            None => Some(JobOutcome::Failed {
                reason: job
                    .error
                    .clone()
                    .unwrap_or_else(|| MISSING_RESULT_URL_MESSAGE.to_string()),
            }),
        },
        JobStatus::Failed => Some(JobOutcome::Failed {
            reason: job
                .error
                .clone()
                .unwrap_or_else(|| DEFAULT_FAILURE_MESSAGE.to_string()),
        }),
        _ => None,
    }
}

fn progress_event(session_id: &str, job_id: &str, event: &PollEvent) -> Option<TrackerEvent> {
    match event {
        PollEvent::StatusChanged { status, progress } => Some(TrackerEvent::JobProgress {
            session_id: session_id.to_string(),
            job_id: job_id.to_string(),
            status: status.clone(),
            progress: progress.clone(),
        }),
        PollEvent::Retrying { attempt, reason } => Some(TrackerEvent::JobRetrying {
            session_id: session_id.to_string(),
            job_id: job_id.to_string(),
            attempt: *attempt,
            reason: reason.clone(),
        }),
        PollEvent::Completed { .. } | PollEvent::Failed { .. } => None,
    }
}

fn terminal_event(session_id: &str, job_id: &str, outcome: &JobOutcome) -> TrackerEvent {
    let session_id = session_id.to_string();
    let job_id = job_id.to_string();
    match outcome {
        JobOutcome::Completed { result_url } => TrackerEvent::JobCompleted {
            session_id,
            job_id,
            result_url: result_url.clone(),
        },
        JobOutcome::Failed { reason } => TrackerEvent::JobFailed {
            session_id,
            job_id,
            reason: reason.clone(),
        },
        JobOutcome::Cancelled => TrackerEvent::JobCancelled { session_id, job_id },
    }
}

//! Per-job polling state machine.
//!
//! [`JobPoller`] drives one job from submission to a terminal outcome. The
//! decision logic lives in [`JobPoller::observe`], which turns a single
//! status-fetch result into zero or more [`PollEvent`]s and is fully
//! synchronous. [`JobPoller::tick`] performs one fetch, and
//! [`JobPoller::run`] repeats ticks on a fixed interval until the job is
//! terminal or the [`CancellationToken`] fires.
//!
//! State machine:
//!
//! ```text
//! Idle --start--> Polling --COMPLETED + url--> Completed
//!                    |    --COMPLETED no url / FAILED / retries exhausted--> Failed
//!                    +----stop / cancel--> Stopped
//! ```
//!
//! Transport failures do not change the state; they bump a consecutive
//! failure counter and emit [`PollEvent::Retrying`].

use reelgen_client::{ApiError, StatusResponse, StatusSource};
use reelgen_core::limits::{
    CONNECTION_LOST_MESSAGE, DEFAULT_FAILURE_MESSAGE, MISSING_RESULT_URL_MESSAGE,
};
use reelgen_core::types::JobId;
use reelgen_core::JobStatus;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use crate::config::PollerConfig;

/// Lifecycle of a poller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollerState {
    /// Created but not started.
    Idle,
    /// Checking status on every tick.
    Polling,
    /// The job completed with a result URL.
    Completed,
    /// The job failed, violated the payload contract, or lost connectivity.
    Failed,
    /// Stopped by the caller before reaching a terminal state.
    Stopped,
}

impl PollerState {
    /// `true` once no further ticks will fetch anything.
    pub fn is_finished(&self) -> bool {
        matches!(
            self,
            PollerState::Completed | PollerState::Failed | PollerState::Stopped
        )
    }
}

/// Something the poller observed that the caller should record.
#[derive(Debug, Clone, PartialEq)]
pub enum PollEvent {
    /// A non-terminal (status, progress) pair different from the last one.
    StatusChanged { status: JobStatus, progress: String },
    /// A status fetch failed; polling continues.
    Retrying { attempt: u32, reason: String },
    /// Terminal success. Emitted at most once.
    Completed { result_url: String, progress: String },
    /// Terminal failure. Emitted at most once.
    Failed { reason: String },
}

impl PollEvent {
    pub fn is_terminal(&self) -> bool {
        matches!(self, PollEvent::Completed { .. } | PollEvent::Failed { .. })
    }
}

/// Polling state machine for one job.
#[derive(Debug)]
pub struct JobPoller {
    job_id: JobId,
    config: PollerConfig,
    state: PollerState,
    consecutive_failures: u32,
    /// Last (status, progress) pair reported through `StatusChanged`.
    last_observed: Option<(JobStatus, String)>,
    fetches: u64,
}

impl JobPoller {
    pub fn new(job_id: impl Into<JobId>, config: PollerConfig) -> Self {
        Self {
            job_id: job_id.into(),
            config,
            state: PollerState::Idle,
            consecutive_failures: 0,
            last_observed: None,
            fetches: 0,
        }
    }

    /// Seed the dedup state with a pair recorded before a restart, so the
    /// first check after resuming does not repeat it.
    pub fn resume_from(mut self, status: JobStatus, progress: impl Into<String>) -> Self {
        self.last_observed = Some((status, progress.into()));
        self
    }

    pub fn job_id(&self) -> &str {
        &self.job_id
    }

    pub fn config(&self) -> &PollerConfig {
        &self.config
    }

    pub fn state(&self) -> PollerState {
        self.state
    }

    /// `true` while the poller accepts status results.
    pub fn is_active(&self) -> bool {
        self.state == PollerState::Polling
    }

    pub fn consecutive_failures(&self) -> u32 {
        self.consecutive_failures
    }

    /// Number of status fetches issued by [`tick`](Self::tick).
    pub fn fetches(&self) -> u64 {
        self.fetches
    }

    pub fn last_observed(&self) -> Option<(&JobStatus, &str)> {
        self.last_observed
            .as_ref()
            .map(|(status, progress)| (status, progress.as_str()))
    }

    /// Begin accepting status results. Has no effect unless `Idle`.
    pub fn start(&mut self) {
        if self.state == PollerState::Idle {
            tracing::debug!(job_id = %self.job_id, "Poller started");
            self.state = PollerState::Polling;
        }
    }

    /// Stop polling. Idempotent; a terminal state is left untouched.
    pub fn stop(&mut self) {
        if !self.state.is_finished() {
            tracing::debug!(job_id = %self.job_id, "Poller stopped");
            self.state = PollerState::Stopped;
        }
    }

    /// Interpret one status-fetch result.
    ///
    /// Results arriving while the poller is not active (stopped, or already
    /// terminal) are discarded and produce no events.
    pub fn observe(&mut self, result: Result<StatusResponse, ApiError>) -> Vec<PollEvent> {
        if !self.is_active() {
            tracing::debug!(
                job_id = %self.job_id,
                state = ?self.state,
                "Discarding status result for inactive poller",
            );
            return Vec::new();
        }

        match result {
            Ok(response) => self.observe_status(response),
            Err(e) => self.observe_failure(e),
        }
    }

    /// Fetch the status once and interpret it. Does nothing when inactive.
    pub async fn tick<S>(&mut self, source: &S) -> Vec<PollEvent>
    where
        S: StatusSource + ?Sized,
    {
        if !self.is_active() {
            return Vec::new();
        }
        self.fetches += 1;
        let result = source.fetch_status(&self.job_id).await;
        self.observe(result)
    }

    /// Poll until the job is terminal or `cancel` fires.
    ///
    /// The first check happens immediately; later checks wait for the
    /// configured interval. A tick awaits its fetch before the next one is
    /// scheduled, so at most one request is in flight. A fetch that is
    /// still pending when `cancel` fires is dropped along with its result.
    ///
    /// Every event is handed to `on_event` in order. Returns the final
    /// state.
    pub async fn run<S, F>(
        &mut self,
        source: &S,
        cancel: &CancellationToken,
        mut on_event: F,
    ) -> PollerState
    where
        S: StatusSource + ?Sized,
        F: FnMut(PollEvent),
    {
        self.start();

        let mut ticker = tokio::time::interval(self.config.effective_interval());
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        while self.is_active() {
            let ticked = tokio::select! {
                biased;
                _ = cancel.cancelled() => false,
                _ = ticker.tick() => true,
            };
            if !ticked {
                self.stop();
                break;
            }

            let events = tokio::select! {
                biased;
                _ = cancel.cancelled() => None,
                events = self.tick(source) => Some(events),
            };
            let Some(events) = events else {
                tracing::debug!(job_id = %self.job_id, "Cancelled with a fetch in flight");
                self.stop();
                break;
            };

            for event in events {
                on_event(event);
            }
        }

        tracing::info!(
            job_id = %self.job_id,
            state = ?self.state,
            fetches = self.fetches,
            "Polling finished",
        );
        self.state
    }

    // ---- private helpers ----

    fn observe_failure(&mut self, error: ApiError) -> Vec<PollEvent> {
        self.consecutive_failures += 1;
        let attempt = self.consecutive_failures;

        if attempt > self.config.max_consecutive_failures {
            tracing::error!(
                job_id = %self.job_id,
                attempts = attempt,
                error = %error,
                "Giving up on job after consecutive status failures",
            );
            self.state = PollerState::Failed;
            return vec![PollEvent::Failed {
                reason: CONNECTION_LOST_MESSAGE.to_string(),
            }];
        }

        tracing::warn!(
            job_id = %self.job_id,
            attempt,
            error = %error,
            "Status check failed, will retry",
        );
        vec![PollEvent::Retrying {
            attempt,
            reason: error.to_string(),
        }]
    }

    fn observe_status(&mut self, response: StatusResponse) -> Vec<PollEvent> {
        self.consecutive_failures = 0;

        match response.status {
            JobStatus::Completed => {
                let event = match response.result_url() {
                    Some(url) => {
                        tracing::info!(job_id = %self.job_id, result_url = %url, "Job completed");
                        self.state = PollerState::Completed;
                        PollEvent::Completed {
                            result_url: url.to_string(),
                            progress: response.progress.clone(),
                        }
                    }
                    None => {
                        tracing::error!(job_id = %self.job_id, "Job completed without a result URL");
                        self.state = PollerState::Failed;
                        PollEvent::Failed {
                            reason: MISSING_RESULT_URL_MESSAGE.to_string(),
                        }
                    }
                };
                self.last_observed = Some((JobStatus::Completed, response.progress));
                vec![event]
            }
            JobStatus::Failed => {
                let reason = if response.progress.trim().is_empty() {
                    DEFAULT_FAILURE_MESSAGE.to_string()
                } else {
                    response.progress.clone()
                };
                tracing::warn!(job_id = %self.job_id, reason = %reason, "Job failed");
                self.state = PollerState::Failed;
                self.last_observed = Some((JobStatus::Failed, response.progress));
                vec![PollEvent::Failed { reason }]
            }
            status => {
                if !status.is_known() {
                    tracing::warn!(job_id = %self.job_id, status = %status, "Unrecognised job status");
                }
                let pair = (status, response.progress);
                if self.last_observed.as_ref() == Some(&pair) {
                    return Vec::new();
                }
                tracing::debug!(job_id = %self.job_id, status = %pair.0, "Job status changed");
                let (status, progress) = pair.clone();
                self.last_observed = Some(pair);
                vec![PollEvent::StatusChanged { status, progress }]
            }
        }
    }
}

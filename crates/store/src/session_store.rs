//! Persisted collection of generation sessions.
//!
//! [`SessionStore`] is loaded once at startup and owned by whoever drives
//! the tracker. All access happens from one task, so it is mutated through
//! `&mut self` without locking. Every mutation rewrites the full collection
//! to the [`Storage`] backend; at this scale (dozens of sessions) a full
//! rewrite is cheap.
//!
//! Missing session or job ids are never an error: mutations return
//! `Ok(false)` and lookups return `None`.

use std::sync::Arc;

use reelgen_core::limits::DEFAULT_HISTORY_LIMIT;
use reelgen_core::{CoreError, Job, JobPatch, JobStatus, Session, SessionPatch};

use crate::backend::{Storage, StorageError};
use crate::{ACTIVE_SESSION_RECORD, SESSIONS_RECORD};

/// Retention settings for the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoreConfig {
    /// Maximum timeline entries per session and history entries per job.
    pub history_limit: usize,
    /// Evict the oldest sessions beyond this count. `None` keeps everything.
    pub max_sessions: Option<usize>,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            history_limit: DEFAULT_HISTORY_LIMIT,
            max_sessions: None,
        }
    }
}

/// Errors surfaced by store mutations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Writing to the durable backend failed. The in-memory state already
    /// reflects the mutation.
    #[error("Failed to persist sessions: {0}")]
    Storage(#[from] StorageError),

    #[error("Failed to serialize sessions: {0}")]
    Serialize(#[from] serde_json::Error),

    /// The caller broke a store invariant (e.g. two active jobs).
    #[error(transparent)]
    Core(#[from] CoreError),
}

/// Session history with an active-session pointer.
pub struct SessionStore {
    storage: Arc<dyn Storage>,
    config: StoreConfig,
    /// Newest first as of load time; new sessions are inserted at the front.
    sessions: Vec<Session>,
    active_session_id: Option<String>,
}

impl SessionStore {
    /// Rehydrate the store from `storage`.
    ///
    /// Unreadable or malformed records are logged and treated as empty.
    /// An active-session pointer that names no known session is cleared.
    pub fn open(storage: Arc<dyn Storage>, config: StoreConfig) -> Self {
        let mut sessions = load_sessions(storage.as_ref());
        sessions.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        let mut active_session_id = match storage.read(ACTIVE_SESSION_RECORD) {
            Ok(id) => id.map(|s| s.trim().to_string()).filter(|s| !s.is_empty()),
            Err(e) => {
                tracing::warn!(error = %e, "Failed to read active session pointer, ignoring it");
                None
            }
        };

        if let Some(id) = active_session_id.as_deref() {
            if !sessions.iter().any(|s| s.id == id) {
                tracing::warn!(session_id = %id, "Active session pointer is dangling, clearing it");
                active_session_id = None;
                if let Err(e) = storage.remove(ACTIVE_SESSION_RECORD) {
                    tracing::warn!(error = %e, "Failed to clear dangling active session pointer");
                }
            }
        }

        tracing::debug!(count = sessions.len(), "Session store loaded");

        Self {
            storage,
            config,
            sessions,
            active_session_id,
        }
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// All sessions, newest first.
    pub fn sessions(&self) -> &[Session] {
        &self.sessions
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    pub fn get_session_by_id(&self, id: &str) -> Option<&Session> {
        self.sessions.iter().find(|s| s.id == id)
    }

    pub fn get_job(&self, session_id: &str, job_id: &str) -> Option<&Job> {
        self.get_session_by_id(session_id)
            .and_then(|s| s.job(job_id))
    }

    pub fn active_session_id(&self) -> Option<&str> {
        self.active_session_id.as_deref()
    }

    pub fn active_session(&self) -> Option<&Session> {
        self.active_session_id
            .as_deref()
            .and_then(|id| self.get_session_by_id(id))
    }

    // ---- session mutations ----

    /// Insert `session`, or merge it into the existing session with the
    /// same id. Either way it becomes the active session.
    pub fn create_session(&mut self, session: Session) -> Result<(), StoreError> {
        let id = session.id.clone();
        let limit = self.config.history_limit;

        match self.session_mut(&id) {
            Some(existing) => {
                tracing::debug!(session_id = %id, "Session already exists, merging");
                existing.merge(session, limit);
            }
            None => {
                self.sessions.insert(0, session);
                self.evict_overflow(&id);
            }
        }

        self.persist_sessions()?;
        self.write_active(Some(id))
    }

    /// Shallow-merge `patch` into a session. Returns `false` if not found.
    pub fn update_session(&mut self, id: &str, patch: SessionPatch) -> Result<bool, StoreError> {
        let Some(session) = self.session_mut(id) else {
            return Ok(false);
        };
        session.apply(patch);
        self.persist_sessions()?;
        Ok(true)
    }

    /// Append a timeline entry to a session. Returns `false` if not found.
    pub fn append_status(&mut self, id: &str, text: impl Into<String>) -> Result<bool, StoreError> {
        let limit = self.config.history_limit;
        let Some(session) = self.session_mut(id) else {
            return Ok(false);
        };
        session.push_status(text, limit);
        self.persist_sessions()?;
        Ok(true)
    }

    /// Make `id` the active session. Returns `false` if not found.
    pub fn set_active_session(&mut self, id: &str) -> Result<bool, StoreError> {
        if self.get_session_by_id(id).is_none() {
            return Ok(false);
        }
        self.write_active(Some(id.to_string()))?;
        Ok(true)
    }

    /// Forget the active session pointer, removing its record.
    pub fn clear_active_session(&mut self) -> Result<(), StoreError> {
        self.write_active(None)
    }

    // ---- job mutations ----

    /// Add `job` to a session and make it the session's active job.
    ///
    /// Registering an id that is already present is a no-op returning
    /// `Ok(false)`, as is an unknown session. Registering while a different
    /// job is still polling is a [`CoreError::Conflict`].
    pub fn register_job(&mut self, session_id: &str, job: Job) -> Result<bool, StoreError> {
        let Some(session) = self.session_mut(session_id) else {
            return Ok(false);
        };
        if session.jobs.contains_key(&job.id) {
            return Ok(false);
        }
        if let Some(active) = session.active_job() {
            if !active.is_terminal() {
                return Err(CoreError::Conflict(format!(
                    "session {session_id} already has active job {}",
                    active.id
                ))
                .into());
            }
        }

        session.active_job_id = Some(job.id.clone());
        session.jobs.insert(job.id.clone(), job);
        self.persist_sessions()?;
        Ok(true)
    }

    /// Shallow-merge `patch` into a job.
    ///
    /// Returns `false` when the session or job is unknown, or the job is
    /// already COMPLETED or FAILED. A job that turns terminal stops being
    /// the session's active job.
    pub fn update_job(
        &mut self,
        session_id: &str,
        job_id: &str,
        patch: JobPatch,
    ) -> Result<bool, StoreError> {
        let Some(session) = self.session_mut(session_id) else {
            return Ok(false);
        };
        let Some(job) = session.job_mut(job_id) else {
            return Ok(false);
        };
        if !job.apply(patch) {
            tracing::debug!(session_id, job_id, "Ignoring update to terminal job");
            return Ok(false);
        }
        let finished = job.is_terminal();
        if finished && session.active_job_id.as_deref() == Some(job_id) {
            session.active_job_id = None;
        }
        self.persist_sessions()?;
        Ok(true)
    }

    /// Append a (status, progress) snapshot to a job's history.
    pub fn append_job_status(
        &mut self,
        session_id: &str,
        job_id: &str,
        status: JobStatus,
        progress: impl Into<String>,
    ) -> Result<bool, StoreError> {
        let limit = self.config.history_limit;
        let Some(job) = self
            .session_mut(session_id)
            .and_then(|s| s.job_mut(job_id))
        else {
            return Ok(false);
        };
        job.record(status, progress, limit);
        self.persist_sessions()?;
        Ok(true)
    }

    // ---- private helpers ----

    fn session_mut(&mut self, id: &str) -> Option<&mut Session> {
        self.sessions.iter_mut().find(|s| s.id == id)
    }

    /// Drop the oldest sessions beyond `max_sessions`.
    /// Drop the oldest sessions beyond `max_sessions`. `keep` is never
    /// evicted, so the pointer written after an insert stays valid.
    fn evict_overflow(&mut self, keep: &str) {
        let Some(max) = self.config.max_sessions else {
            return;
        };
        while self.sessions.len() > max {
            let oldest = self
                .sessions
                .iter()
                .enumerate()
                .filter(|(_, s)| s.id != keep)
                .min_by_key(|(_, s)| s.created_at)
                .map(|(i, _)| i);
            let Some(index) = oldest else { break };
            let evicted = self.sessions.remove(index);
            tracing::info!(session_id = %evicted.id, "Evicted oldest session");
            if self.active_session_id.as_deref() == Some(evicted.id.as_str()) {
                self.active_session_id = None;
            }
        }
    }

    fn persist_sessions(&self) -> Result<(), StoreError> {
        let json = serde_json::to_string(&self.sessions)?;
        self.storage.write(SESSIONS_RECORD, &json)?;
        Ok(())
    }

    fn write_active(&mut self, id: Option<String>) -> Result<(), StoreError> {
        match id.as_deref() {
            Some(id) => self.storage.write(ACTIVE_SESSION_RECORD, id)?,
            None => self.storage.remove(ACTIVE_SESSION_RECORD)?,
        }
        self.active_session_id = id;
        Ok(())
    }
}

fn load_sessions(storage: &dyn Storage) -> Vec<Session> {
    let raw = match storage.read(SESSIONS_RECORD) {
        Ok(Some(raw)) => raw,
        Ok(None) => return Vec::new(),
        Err(e) => {
            tracing::warn!(error = %e, "Failed to read stored sessions, starting empty");
            return Vec::new();
        }
    };

    if raw.trim().is_empty() {
        return Vec::new();
    }

    match serde_json::from_str::<Vec<Session>>(&raw) {
        Ok(sessions) => sessions,
        Err(e) => {
            tracing::warn!(error = %e, "Stored sessions are malformed, starting empty");
            Vec::new()
        }
    }
}

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use reelgen_client::{
    ApiError, GenerateRequest, GenerationService, StatusResponse, StatusSource, SubmitResponse,
};
use reelgen_core::JobStatus;
use reelgen_store::{MemoryStorage, SessionStore, Storage, StoreConfig};
use reelgen_tracker::{JobTracker, PollerConfig};

/// Poller settings that keep tests fast.
pub fn fast_config() -> PollerConfig {
    PollerConfig {
        interval: Duration::from_millis(1),
        ..Default::default()
    }
}

pub fn request(script: &str) -> GenerateRequest {
    GenerateRequest {
        script: script.into(),
        style: "cinematic".into(),
        model: None,
        attachments: Vec::new(),
    }
}

pub fn status(status: &str, progress: &str, url: Option<&str>) -> Result<StatusResponse, ApiError> {
    Ok(StatusResponse {
        status: JobStatus::parse(status),
        progress: progress.to_string(),
        video_url: url.map(str::to_string),
    })
}

pub fn transport_error() -> Result<StatusResponse, ApiError> {
    Err(ApiError::ApiError {
        status: 503,
        body: "service unavailable".into(),
    })
}

/// A generation service that hands out one job id and replays a scripted
/// list of status results. Once the script runs out the fallback repeats.
pub struct ScriptedService {
    job_id: String,
    submit_error: Mutex<Option<ApiError>>,
    script: Mutex<VecDeque<Result<StatusResponse, ApiError>>>,
    fallback: fn() -> Result<StatusResponse, ApiError>,
    status_calls: AtomicUsize,
    submits: AtomicUsize,
}

impl ScriptedService {
    pub fn new(
        job_id: &str,
        script: Vec<Result<StatusResponse, ApiError>>,
        fallback: fn() -> Result<StatusResponse, ApiError>,
    ) -> Arc<Self> {
        Arc::new(Self {
            job_id: job_id.to_string(),
            submit_error: Mutex::new(None),
            script: Mutex::new(script.into()),
            fallback,
            status_calls: AtomicUsize::new(0),
            submits: AtomicUsize::new(0),
        })
    }

    /// A service whose next submission is rejected with `detail`.
    pub fn rejecting(detail: &str) -> Arc<Self> {
        let service = Self::new("unused", Vec::new(), transport_error);
        *service.submit_error.lock().unwrap() = Some(ApiError::Rejected {
            status: 503,
            detail: detail.to_string(),
        });
        service
    }

    pub fn status_calls(&self) -> usize {
        self.status_calls.load(Ordering::SeqCst)
    }

    pub fn submits(&self) -> usize {
        self.submits.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl StatusSource for ScriptedService {
    async fn fetch_status(&self, _job_id: &str) -> Result<StatusResponse, ApiError> {
        self.status_calls.fetch_add(1, Ordering::SeqCst);
        let next = self.script.lock().unwrap().pop_front();
        next.unwrap_or_else(self.fallback)
    }
}

#[async_trait]
impl GenerationService for ScriptedService {
    async fn submit(&self, _request: &GenerateRequest) -> Result<SubmitResponse, ApiError> {
        let n = self.submits.fetch_add(1, Ordering::SeqCst);
        if let Some(e) = self.submit_error.lock().unwrap().take() {
            return Err(e);
        }
        let job_id = if n == 0 {
            self.job_id.clone()
        } else {
            format!("{}-{}", self.job_id, n + 1)
        };
        Ok(SubmitResponse {
            job_id,
            status: Some(JobStatus::Queued),
        })
    }
}

pub fn memory_store(storage: &Arc<MemoryStorage>) -> SessionStore {
    let storage: Arc<dyn Storage> = storage.clone();
    SessionStore::open(storage, StoreConfig::default())
}

pub fn tracker(service: Arc<ScriptedService>, storage: &Arc<MemoryStorage>) -> JobTracker {
    JobTracker::new(service, memory_store(storage), fast_config())
}

//! In-memory job table shared by the mock handlers.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::Mutex;

use crate::flow;
use crate::routes::jobs::GenerateRequest;

/// One mock job and its position in the status flow.
#[derive(Debug, Clone)]
pub struct MockJob {
    pub step: usize,
    pub request: GenerateRequest,
    /// Sequential number, handy when reading logs.
    pub human_id: u64,
}

#[derive(Default)]
struct JobTable {
    jobs: HashMap<String, MockJob>,
    next_human_id: u64,
}

/// Shared mock state. Cheap to clone.
#[derive(Clone, Default)]
pub struct MockState {
    inner: Arc<Mutex<JobTable>>,
}

impl MockState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new job at the first step and return its id.
    pub async fn create_job(&self, request: GenerateRequest) -> (String, MockJob) {
        let job_id = uuid::Uuid::new_v4().to_string();
        let mut table = self.inner.lock().await;
        table.next_human_id += 1;
        let job = MockJob {
            step: 0,
            request,
            human_id: table.next_human_id,
        };
        table.jobs.insert(job_id.clone(), job.clone());
        (job_id, job)
    }

    /// Advance a job by one step and return its new state.
    pub async fn advance_job(&self, job_id: &str) -> Option<MockJob> {
        let mut table = self.inner.lock().await;
        let job = table.jobs.get_mut(job_id)?;
        job.step = flow::advance(job.step);
        Some(job.clone())
    }

    pub async fn job_count(&self) -> usize {
        self.inner.lock().await.jobs.len()
    }
}

//! Seams between the tracker and the generation service.
//!
//! The poller only needs [`StatusSource`]; the tracker additionally
//! submits jobs through [`GenerationService`]. Tests substitute scripted
//! implementations of either.

use async_trait::async_trait;

use crate::api::ApiError;
use crate::messages::{GenerateRequest, StatusResponse, SubmitResponse};

/// Anything that can report the status of a job.
#[async_trait]
pub trait StatusSource: Send + Sync {
    /// Fetch the current status of `job_id`.
    ///
    /// Any error (network, non-2xx, malformed body) is a transport failure
    /// from the poller's point of view.
    async fn fetch_status(&self, job_id: &str) -> Result<StatusResponse, ApiError>;
}

/// Full generation service: submission plus status.
#[async_trait]
pub trait GenerationService: StatusSource {
    /// Create a job and return its server-assigned id.
    async fn submit(&self, request: &GenerateRequest) -> Result<SubmitResponse, ApiError>;
}

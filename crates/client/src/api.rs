//! REST client for the generation service HTTP endpoints.
//!
//! Wraps job submission (`POST /generate`) and status retrieval
//! (`GET /status/{job_id}`) using [`reqwest`].

use async_trait::async_trait;

use crate::messages::{ErrorBody, GenerateRequest, StatusResponse, SubmitResponse};
use crate::service::{GenerationService, StatusSource};

/// HTTP client for one generation service deployment.
#[derive(Clone)]
pub struct GenerationApi {
    client: reqwest::Client,
    api_url: String,
}

/// Errors from the generation REST API layer.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// The HTTP request itself failed (network, DNS, TLS, etc.).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The service rejected the request with a `detail` message, which is
    /// shown to the user verbatim.
    #[error("{detail}")]
    Rejected {
        /// HTTP status code.
        status: u16,
        detail: String,
    },

    /// The service returned a non-2xx status code without a usable detail.
    #[error("Generation API error ({status}): {body}")]
    ApiError {
        /// HTTP status code.
        status: u16,
        /// Raw response body for debugging.
        body: String,
    },

    /// A 2xx response whose body did not match the expected shape.
    #[error("Malformed response: {0}")]
    Decode(String),
}

impl GenerationApi {
    /// Create a new API client.
    ///
    /// * `api_url` - Base HTTP URL, e.g. `http://localhost:8000`.
    pub fn new(api_url: impl Into<String>) -> Self {
        Self::with_client(reqwest::Client::new(), api_url)
    }

    /// Create an API client reusing an existing [`reqwest::Client`].
    pub fn with_client(client: reqwest::Client, api_url: impl Into<String>) -> Self {
        let api_url = api_url.into().trim_end_matches('/').to_string();
        Self { client, api_url }
    }

    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    /// Submit a generation request.
    ///
    /// Returns the server-assigned `job_id`. A rejection carrying a
    /// `detail` message becomes [`ApiError::Rejected`].
    pub async fn submit_job(&self, request: &GenerateRequest) -> Result<SubmitResponse, ApiError> {
        let response = self
            .client
            .post(format!("{}/generate", self.api_url))
            .json(request)
            .send()
            .await?;

        let submitted: SubmitResponse = Self::parse_response(response).await?;
        tracing::info!(job_id = %submitted.job_id, "Generation job submitted");
        Ok(submitted)
    }

    /// Fetch the status of a job via `GET /status/{job_id}`.
    pub async fn get_status(&self, job_id: &str) -> Result<StatusResponse, ApiError> {
        let response = self
            .client
            .get(format!("{}/status/{}", self.api_url, job_id))
            .send()
            .await?;

        Self::parse_response(response).await
    }

    // ---- private helpers ----

    /// Ensure the response has a success status code. On failure, a JSON
    /// body with a string `detail` becomes [`ApiError::Rejected`]; anything
    /// else becomes [`ApiError::ApiError`] with the raw body.
    async fn ensure_success(response: reqwest::Response) -> Result<reqwest::Response, ApiError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "<unreadable body>".to_string());

        let detail = serde_json::from_str::<ErrorBody>(&body)
            .ok()
            .and_then(|b| b.detail.as_str().map(str::to_string));

        Err(match detail {
            Some(detail) => ApiError::Rejected {
                status: status.as_u16(),
                detail,
            },
            None => ApiError::ApiError {
                status: status.as_u16(),
                body,
            },
        })
    }

    /// Parse a successful JSON response body into the expected type.
    async fn parse_response<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, ApiError> {
        let response = Self::ensure_success(response).await?;
        let body = response.text().await?;
        serde_json::from_str(&body).map_err(|e| ApiError::Decode(e.to_string()))
    }
}

#[async_trait]
impl StatusSource for GenerationApi {
    async fn fetch_status(&self, job_id: &str) -> Result<StatusResponse, ApiError> {
        self.get_status(job_id).await
    }
}

#[async_trait]
impl GenerationService for GenerationApi {
    async fn submit(&self, request: &GenerateRequest) -> Result<SubmitResponse, ApiError> {
        self.submit_job(request).await
    }
}

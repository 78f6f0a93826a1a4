//! Integration tests for [`GenerationApi`] against the mock service.

use assert_matches::assert_matches;
use reelgen_client::{ApiError, GenerateRequest, GenerationApi};
use reelgen_core::JobStatus;
use reelgen_mock::flow::MOCK_VIDEO_URL;
use reelgen_mock::state::MockState;

/// Start the mock on an ephemeral port and return its base URL.
async fn spawn_mock() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(reelgen_mock::serve(listener, MockState::new()));
    format!("http://{addr}")
}

fn request(script: &str) -> GenerateRequest {
    GenerateRequest {
        script: script.into(),
        style: "cinematic".into(),
        model: Some("nova-reel".into()),
        attachments: Vec::new(),
    }
}

#[tokio::test]
async fn submit_then_poll_until_completed() {
    let api = GenerationApi::new(spawn_mock().await);

    let submitted = api.submit_job(&request("Waves at dawn.")).await.unwrap();
    assert!(!submitted.job_id.is_empty());
    assert_eq!(submitted.status, Some(JobStatus::Queued));

    let mut last = api.get_status(&submitted.job_id).await.unwrap();
    assert_eq!(last.status, JobStatus::AnalyzingScript);
    for _ in 0..10 {
        last = api.get_status(&submitted.job_id).await.unwrap();
        if last.status.is_terminal() {
            break;
        }
    }
    assert_eq!(last.status, JobStatus::Completed);
    assert_eq!(last.result_url(), Some(MOCK_VIDEO_URL));
}

#[tokio::test]
async fn unknown_job_surfaces_detail() {
    let api = GenerationApi::new(spawn_mock().await);
    let err = api.get_status("missing").await.unwrap_err();
    assert_matches!(err, ApiError::Rejected { status: 404, ref detail } if detail == "Job ID not found");
}

#[tokio::test]
async fn rejected_submission_keeps_detail() {
    let api = GenerationApi::new(spawn_mock().await);
    let err = api.submit_job(&request("")).await.unwrap_err();
    assert_matches!(err, ApiError::Rejected { status: 422, .. });
    assert!(err.to_string().contains("script must not be empty"));
}

#[tokio::test]
async fn unreachable_service_is_request_error() {
    // Port 9 (discard) is essentially never listening on loopback.
    let api = GenerationApi::new("http://127.0.0.1:9");
    let err = api.get_status("abc123").await.unwrap_err();
    assert_matches!(err, ApiError::Request(_));
}

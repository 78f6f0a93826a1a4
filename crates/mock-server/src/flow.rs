//! The fixed status flow every mock job walks through.

use reelgen_core::JobStatus;

/// Sample video returned once a mock job completes.
pub const MOCK_VIDEO_URL: &str =
    "https://commondatastorage.googleapis.com/gtv-videos-bucket/sample/BigBuckBunny.mp4";

/// Ordered (status, progress) pairs. The last entry is terminal.
pub const STATUS_FLOW: &[(&str, &str)] = &[
    ("QUEUED", "Awaiting generation..."),
    ("ANALYZING_SCRIPT", "Parsing script and splitting into scenes."),
    ("GENERATING_PROMPTS", "Authoring prompts from each scene."),
    ("INVOKING_BEDROCK", "Sending prompts to the video model."),
    ("POLLING_CLIPS", "Waiting for rendered clips to finish."),
    ("COMPLETED", "Assembly complete. 3/3 clips successful."),
];

/// Index of the final step.
pub const LAST_STEP: usize = STATUS_FLOW.len() - 1;

/// Move one step forward, stopping at the final step.
pub fn advance(step: usize) -> usize {
    (step + 1).min(LAST_STEP)
}

/// Status, progress and video URL reported at `step`.
pub fn snapshot(step: usize) -> (JobStatus, &'static str, Option<&'static str>) {
    let (status, progress) = STATUS_FLOW[step.min(LAST_STEP)];
    let status = JobStatus::parse(status);
    let url = (status == JobStatus::Completed).then_some(MOCK_VIDEO_URL);
    (status, progress, url)
}

//! Plain-text rendering of tracker events, outcomes and stored sessions.

use std::fmt::Write as _;

use reelgen_core::Session;
use reelgen_tracker::{JobOutcome, TrackerEvent};

/// Width of the script preview in session listings.
const SCRIPT_PREVIEW_CHARS: usize = 48;

/// One line per event, as printed while following a job.
pub fn event_line(event: &TrackerEvent) -> String {
    match event {
        TrackerEvent::JobSubmitted { session_id, job_id } => {
            format!("Submitted job {job_id} (session {session_id})")
        }
        TrackerEvent::JobProgress {
            status, progress, ..
        } => {
            if progress.trim().is_empty() {
                format!("[{status}]")
            } else {
                format!("[{status}] {progress}")
            }
        }
        TrackerEvent::JobRetrying {
            attempt, reason, ..
        } => format!("[RETRYING] attempt {attempt}: {reason}"),
        TrackerEvent::JobCompleted { result_url, .. } => format!("[COMPLETED] {result_url}"),
        TrackerEvent::JobFailed { reason, .. } => format!("[FAILED] {reason}"),
        TrackerEvent::JobCancelled { job_id, .. } => {
            format!("Stopped tracking job {job_id}; run `reelgen resume` to continue")
        }
    }
}

pub fn outcome_line(outcome: &JobOutcome) -> String {
    match outcome {
        JobOutcome::Completed { result_url } => format!("Video ready: {result_url}"),
        JobOutcome::Failed { reason } => format!("Generation failed: {reason}"),
        JobOutcome::Cancelled => "Tracking cancelled".to_string(),
    }
}

/// Single-line summary used by `reelgen sessions`.
pub fn session_line(session: &Session, active: bool) -> String {
    let marker = if active { "*" } else { " " };
    let status = session
        .latest_job()
        .map(|job| job.status.as_str().to_string())
        .unwrap_or_else(|| "NO JOB".to_string());
    format!(
        "{marker} {id}  {created}  {status:<18} {script}",
        id = session.id,
        created = session.created_at.format("%Y-%m-%d %H:%M"),
        script = preview(&session.script),
    )
}

/// Multi-line detail used by `reelgen show`.
pub fn session_detail(session: &Session) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Session {}", session.id);
    let _ = writeln!(out, "  created: {}", session.created_at.to_rfc3339());
    let _ = writeln!(out, "  style:   {}", session.style);
    if let Some(model) = &session.model {
        let _ = writeln!(out, "  model:   {model}");
    }
    if let Some(url) = &session.video_url {
        let _ = writeln!(out, "  video:   {url}");
    }
    let _ = writeln!(out, "  script:  {}", session.script);

    if !session.jobs.is_empty() {
        let _ = writeln!(out, "Jobs:");
        for job in session.jobs.values() {
            let active = session.active_job_id.as_deref() == Some(job.id.as_str());
            let _ = write!(out, "  {} {} {}", if active { "*" } else { "-" }, job.id, job.status);
            if let Some(error) = &job.error {
                let _ = write!(out, " ({error})");
            }
            out.push('\n');
        }
    }

    if !session.status_history.is_empty() {
        let _ = writeln!(out, "Timeline:");
        for entry in &session.status_history {
            let _ = writeln!(out, "  {entry}");
        }
    }
    out
}

fn preview(script: &str) -> String {
    let first_line = script.lines().next().unwrap_or_default().trim();
    if first_line.chars().count() > SCRIPT_PREVIEW_CHARS {
        let cut: String = first_line.chars().take(SCRIPT_PREVIEW_CHARS - 3).collect();
        format!("{cut}...")
    } else {
        first_line.to_string()
    }
}

#[cfg(test)]
mod tests {
    use reelgen_core::{Job, JobStatus};

    use super::*;

    #[test]
    fn progress_line_omits_blank_detail() {
        let event = TrackerEvent::JobProgress {
            session_id: "s".into(),
            job_id: "j".into(),
            status: JobStatus::Queued,
            progress: String::new(),
        };
        assert_eq!(event_line(&event), "[QUEUED]");
    }

    #[test]
    fn session_line_marks_active_and_truncates() {
        let mut session = Session::new("x".repeat(100), "noir", None);
        session.jobs.insert("j".into(), Job::new("j"));

        let line = session_line(&session, true);
        assert!(line.starts_with("* "));
        assert!(line.contains("QUEUED"));
        assert!(line.ends_with("..."));
        assert!(!line.contains(&"x".repeat(SCRIPT_PREVIEW_CHARS)));
    }

    #[test]
    fn detail_lists_jobs_and_timeline() {
        let mut session = Session::new("Waves", "cinematic", Some("nova-reel".into()));
        let mut job = Job::new("abc123");
        job.status = JobStatus::Failed;
        job.error = Some("Connection lost".into());
        session.jobs.insert(job.id.clone(), job);
        session.status_history.push("12:00:00 FAILED: Connection lost".into());

        let detail = session_detail(&session);
        assert!(detail.contains("model:   nova-reel"));
        assert!(detail.contains("- abc123 FAILED (Connection lost)"));
        assert!(detail.contains("  12:00:00 FAILED: Connection lost"));
    }
}

//! Default tuning values for polling and history retention.
//!
//! These are defaults only; the store and poller take them through their
//! config structs so deployments can override them.

use std::time::Duration;

/// Interval between two status checks for one job.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(3000);

/// Consecutive transport failures tolerated before a job is given up on.
/// The poller fails the job when the counter goes *above* this value.
pub const DEFAULT_MAX_CONSECUTIVE_FAILURES: u32 = 10;

/// Maximum entries kept in a session timeline or a job history.
pub const DEFAULT_HISTORY_LIMIT: usize = 50;

/// Terminal message used when the retry budget is exhausted.
pub const CONNECTION_LOST_MESSAGE: &str = "Connection lost";

/// Terminal message for a COMPLETED status that carries no result URL.
pub const MISSING_RESULT_URL_MESSAGE: &str = "Job completed but no video URL was provided";

/// Fallback message for a FAILED status with empty progress text.
pub const DEFAULT_FAILURE_MESSAGE: &str = "Video generation failed";

/// Append `item` to `entries`, evicting from the front so that at most
/// `limit` entries remain.
pub fn push_capped<T>(entries: &mut Vec<T>, item: T, limit: usize) {
    entries.push(item);
    if entries.len() > limit {
        let overflow = entries.len() - limit;
        entries.drain(..overflow);
    }
}

//! Job tracking for the reelgen client.
//!
//! - [`poller`]: the per-job polling state machine (fixed cadence,
//!   consecutive-failure budget, terminal detection).
//! - [`reconciler`]: applies poller events to the session store and
//!   yields at most one [`JobOutcome`] per job.
//! - [`tracker`]: wires submission, polling and reconciliation together
//!   and broadcasts [`TrackerEvent`]s to the presentation layer.

pub mod config;
pub mod events;
pub mod poller;
pub mod reconciler;
pub mod tracker;

pub use config::PollerConfig;
pub use events::TrackerEvent;
pub use poller::{JobPoller, PollEvent, PollerState};
pub use reconciler::{JobOutcome, Reconciler};
pub use tracker::{JobTracker, Submission, TrackerError};

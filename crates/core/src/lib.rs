//! Domain model for the reelgen generation tracker.
//!
//! Sessions, jobs, the strict job status variant, and the limits shared by
//! the store and the poller.

pub mod error;
pub mod limits;
pub mod session;
pub mod status;
pub mod types;

pub use error::CoreError;
pub use session::{Job, JobPatch, JobSnapshot, Session, SessionPatch};
pub use status::JobStatus;

//! Durable session history for the reelgen tracker.
//!
//! - [`Storage`] is the durable key/value seam, with a file-backed
//!   implementation for the CLI and an in-memory one for tests.
//! - [`SessionStore`] keeps the session collection and the active-session
//!   pointer, rewriting both to storage on every mutation.

pub mod backend;
pub mod session_store;

pub use backend::{FileStorage, MemoryStorage, Storage, StorageError};
pub use session_store::{SessionStore, StoreConfig, StoreError};

/// Record holding the full session collection (JSON array).
pub const SESSIONS_RECORD: &str = "generation_sessions";

/// Record holding the active session id as a plain string.
pub const ACTIVE_SESSION_RECORD: &str = "active_session_id";

/// Session identifiers are client-generated UUID v4 strings.
pub type SessionId = String;

/// Job identifiers are assigned by the generation service.
pub type JobId = String;

/// All timestamps are UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;

/// Generate a fresh session identifier.
pub fn new_session_id() -> SessionId {
    uuid::Uuid::new_v4().to_string()
}

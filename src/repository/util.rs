//! Repository utilities.

/// Current time as stored in timestamp columns.
pub fn now_rfc3339() -> String {
    chrono::Utc::now().to_rfc3339()
}

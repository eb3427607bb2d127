//! Shared type aliases.

/// Event registration identifier (assigned by the host platform).
pub type EventId = i64;

/// UTC timestamp used across models and wire formats.
pub type Timestamp = chrono::DateTime<chrono::Utc>;

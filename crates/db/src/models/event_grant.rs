//! Event↔grant association model.

use serde::Serialize;
use sqlx::FromRow;

use eventgrants_core::types::{EventId, Timestamp};

/// A row from the `event_grants` table: the grant associated with an
/// event, at most one per event.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct EventGrant {
    pub event_id: EventId,
    pub grant_id: String,
    /// When the grant agreement was signed, as reported upstream.
    pub agreement_at: Timestamp,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

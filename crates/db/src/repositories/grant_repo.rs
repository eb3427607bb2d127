//! Repository for the `event_grants` table.

use sqlx::PgPool;

use eventgrants_core::types::{EventId, Timestamp};

use crate::models::EventGrant;

/// Column list for `event_grants` queries.
const COLUMNS: &str = "event_id, grant_id, agreement_at, created_at, updated_at";

/// CRUD operations for the event↔grant association. One grant per
/// event, enforced by the primary key.
pub struct GrantRepo;

impl GrantRepo {
    /// Find the grant associated with an event, if any.
    pub async fn find_by_event(
        pool: &PgPool,
        event_id: EventId,
    ) -> Result<Option<EventGrant>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM event_grants WHERE event_id = $1");
        sqlx::query_as::<_, EventGrant>(&query)
            .bind(event_id)
            .fetch_optional(pool)
            .await
    }

    /// Associate a grant with an event, replacing any previous one.
    ///
    /// Uses `ON CONFLICT (event_id) DO UPDATE` to guarantee one row per
    /// event.
    pub async fn upsert(
        pool: &PgPool,
        event_id: EventId,
        grant_id: &str,
        agreement_at: Timestamp,
    ) -> Result<EventGrant, sqlx::Error> {
        let query = format!(
            "INSERT INTO event_grants (event_id, grant_id, agreement_at) \
             VALUES ($1, $2, $3) \
             ON CONFLICT (event_id) DO UPDATE \
             SET grant_id = EXCLUDED.grant_id, \
                 agreement_at = EXCLUDED.agreement_at, \
                 updated_at = now() \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, EventGrant>(&query)
            .bind(event_id)
            .bind(grant_id)
            .bind(agreement_at)
            .fetch_one(pool)
            .await
    }

    /// Remove the grant associated with an event. Deleting a
    /// nonexistent association is not an error.
    pub async fn delete_by_event(pool: &PgPool, event_id: EventId) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM event_grants WHERE event_id = $1")
            .bind(event_id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected())
    }
}

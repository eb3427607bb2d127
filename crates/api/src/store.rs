//! Persistence seam for the event↔grant association.

use async_trait::async_trait;

use eventgrants_core::types::{EventId, Timestamp};
use eventgrants_db::models::EventGrant;
use eventgrants_db::repositories::GrantRepo;
use eventgrants_db::DbPool;

/// Storage for grant associations, behind a trait so handler tests can
/// substitute an in-memory implementation.
#[async_trait]
pub trait GrantStore: Send + Sync {
    async fn find(&self, event_id: EventId) -> Result<Option<EventGrant>, sqlx::Error>;

    async fn upsert(
        &self,
        event_id: EventId,
        grant_id: &str,
        agreement_at: Timestamp,
    ) -> Result<EventGrant, sqlx::Error>;

    /// Returns the number of rows removed.
    async fn delete(&self, event_id: EventId) -> Result<u64, sqlx::Error>;
}

/// Postgres-backed store delegating to [`GrantRepo`].
pub struct PgGrantStore {
    pool: DbPool,
}

impl PgGrantStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl GrantStore for PgGrantStore {
    async fn find(&self, event_id: EventId) -> Result<Option<EventGrant>, sqlx::Error> {
        GrantRepo::find_by_event(&self.pool, event_id).await
    }

    async fn upsert(
        &self,
        event_id: EventId,
        grant_id: &str,
        agreement_at: Timestamp,
    ) -> Result<EventGrant, sqlx::Error> {
        GrantRepo::upsert(&self.pool, event_id, grant_id, agreement_at).await
    }

    async fn delete(&self, event_id: EventId) -> Result<u64, sqlx::Error> {
        GrantRepo::delete_by_event(&self.pool, event_id).await
    }
}

//! Grant-ID validation against the Fluxx `grant_request/list` endpoint.
//!
//! One cache entry per grant ID holds the positive validation result
//! (matching record plus agreement timestamp). Negative results are
//! never cached: an ID that failed to validate, for whatever reason,
//! is re-queried on every call until it validates.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, NaiveDateTime, Utc};
use eventgrants_cache::CacheHandle;
use eventgrants_core::grant::{fluxx_cols, fluxx_filter, GrantId, GrantRecord};
use eventgrants_core::types::Timestamp;
use serde_json::Value;

use crate::client::FluxxClient;
use crate::error::{FluxxError, GrantLookupError};

const ENDPOINT: &str = "grant_request/list";

/// Per-grant-ID cache TTL.
const GRANT_TTL: Duration = Duration::from_secs(3600);

/// Cached lookup of grant IDs.
pub struct GrantIdLookup {
    client: Arc<FluxxClient>,
    cache: CacheHandle,
}

impl GrantIdLookup {
    pub fn new(client: Arc<FluxxClient>, cache: CacheHandle) -> Self {
        Self { client, cache }
    }

    /// Check that the grant ID names a granted, non-expired grant.
    pub async fn validate(&self, grant_id: &GrantId) -> Result<(), GrantLookupError> {
        self.grant_data(grant_id).await.map(|_| ())
    }

    /// Validate and return the grant agreement timestamp.
    pub async fn agreement_at(&self, grant_id: &GrantId) -> Result<Timestamp, GrantLookupError> {
        Ok(self.grant_data(grant_id).await?.agreement_at)
    }

    async fn grant_data(&self, grant_id: &GrantId) -> Result<GrantRecord, GrantLookupError> {
        let key = format!("eventgrants:grant:{grant_id}");
        let record = self
            .cache
            .get_or_compute(&key, GRANT_TTL, || async {
                self.request_grant_data(grant_id).await.map(Some)
            })
            .await?;
        // The compute callback never yields a bare `None`; treat an
        // impossible miss as a transient failure rather than panic.
        record.ok_or_else(|| {
            GrantLookupError::Request(FluxxError::Request("grant cache yielded no value".into()))
        })
    }

    /// Query Fluxx for this grant ID.
    ///
    /// The `cols` and `filter` fields are JSON documents encoded as
    /// strings inside the POST body — that is the upstream wire format.
    async fn request_grant_data(&self, grant_id: &GrantId) -> Result<GrantRecord, GrantLookupError> {
        let body = serde_json::json!({
            "cols": fluxx_cols().to_string(),
            "filter": fluxx_filter(grant_id).to_string(),
        });

        let response = self.client.post(ENDPOINT, &body).await?;

        let first = response
            .get("records")
            .and_then(|r| r.get("grant_request"))
            .and_then(Value::as_array)
            .and_then(|rows| rows.first());

        let Some(row) = first else {
            return Err(GrantLookupError::InvalidGrantId);
        };
        if row.get("base_request_id").and_then(Value::as_str) != Some(grant_id.as_str()) {
            return Err(GrantLookupError::InvalidGrantId);
        }

        let agreement_at = row
            .get("grant_agreement_at")
            .and_then(Value::as_str)
            .and_then(parse_upstream_timestamp)
            .ok_or_else(|| {
                tracing::error!(
                    grant_id = %grant_id,
                    "Fluxx record has a missing or malformed grant_agreement_at"
                );
                GrantLookupError::Request(FluxxError::Request(
                    "malformed grant_agreement_at in response".into(),
                ))
            })?;

        Ok(GrantRecord {
            grant_id: grant_id.clone(),
            agreement_at,
        })
    }
}

/// Parse the agreement timestamp formats Fluxx is known to emit.
fn parse_upstream_timestamp(raw: &str) -> Option<Timestamp> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S")
        .ok()
        .map(|naive| naive.and_utc())
}

//! Grant IDs and the Fluxx list-query payload.
//!
//! A grant ID is issued by the external grants-management system in the
//! form `<digits>-<digits>` (e.g. `1234-5678`). The format check runs
//! before any network call so malformed input never reaches Fluxx.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::types::Timestamp;

/// Agreement window applied in the upstream filter: grants agreed more
/// than this many months ago do not validate.
pub const GRANTS_FILTER_PERIOD_MONTHS: u32 = 24;

static GRANT_ID_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d+-\d+$").expect("valid regex"));

/// The submitted grant ID does not match `<digits>-<digits>`.
#[derive(Debug, thiserror::Error)]
#[error("Invalid grant ID format: {0:?}")]
pub struct InvalidGrantIdFormat(pub String);

/// A validated grant identifier.
///
/// Construction goes through [`GrantId::parse`], so holding a `GrantId`
/// implies the format is correct.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GrantId(String);

impl GrantId {
    /// Parse and validate a raw grant ID string.
    pub fn parse(raw: &str) -> Result<Self, InvalidGrantIdFormat> {
        if GRANT_ID_RE.is_match(raw) {
            Ok(Self(raw.to_string()))
        } else {
            Err(InvalidGrantIdFormat(raw.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for GrantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A positive validation result for one grant ID.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GrantRecord {
    pub grant_id: GrantId,
    /// When the grant agreement was signed, per the upstream system.
    pub agreement_at: Timestamp,
}

/// Columns requested from the Fluxx `grant_request/list` endpoint.
pub fn fluxx_cols() -> serde_json::Value {
    serde_json::json!([
        "granted",
        "request_received_at",
        "base_request_id",
        "grant_agreement_at",
    ])
}

/// Filter restricting the list query to a single granted, non-expired
/// grant ID.
pub fn fluxx_filter(grant_id: &GrantId) -> serde_json::Value {
    serde_json::json!({
        "group_type": "and",
        "conditions": [
            ["base_request_id", "eq", grant_id.as_str()],
            ["granted", "eq", true],
            ["grant_agreement_at", "last-n-months", GRANTS_FILTER_PERIOD_MONTHS],
        ],
    })
}

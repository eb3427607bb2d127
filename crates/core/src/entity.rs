//! Knowledge-graph entity IDs (`Q\d+`).
//!
//! WikiProjects are identified by Wikidata entity IDs. The query
//! service returns full item URIs; [`EntityId::from_uri`] extracts the
//! trailing QID. Ordering is numeric on the ID suffix so that paginated
//! listings have a stable, deterministic base.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

static ENTITY_ID_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^Q\d+$").expect("valid regex"));
static TRAILING_QID_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"Q\d+$").expect("valid regex"));

/// The given string is not a `Q\d+` entity ID.
#[derive(Debug, thiserror::Error)]
#[error("Invalid entity ID: {0:?}")]
pub struct InvalidEntityId(pub String);

/// A Wikidata entity identifier, e.g. `Q16695773`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId(String);

impl EntityId {
    /// Parse and validate a raw `Q\d+` string.
    pub fn parse(raw: &str) -> Result<Self, InvalidEntityId> {
        if ENTITY_ID_RE.is_match(raw) {
            Ok(Self(raw.to_string()))
        } else {
            Err(InvalidEntityId(raw.to_string()))
        }
    }

    /// Extract the trailing QID from an entity URI such as
    /// `http://www.wikidata.org/entity/Q123`.
    pub fn from_uri(uri: &str) -> Result<Self, InvalidEntityId> {
        TRAILING_QID_RE
            .find(uri)
            .map(|m| Self(m.as_str().to_string()))
            .ok_or_else(|| InvalidEntityId(uri.to_string()))
    }

    /// Numeric part of the ID, used for stable ordering.
    pub fn numeric_suffix(&self) -> u64 {
        // The constructor guarantees the `Q\d+` shape; saturate on
        // overflow rather than panic for absurdly large IDs.
        self.0[1..].parse().unwrap_or(u64::MAX)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

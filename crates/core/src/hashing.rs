//! Shared SHA-256 hex digest utility.
//!
//! Used to key per-page metadata cache entries by their exact ID set,
//! so distinct page contents never collide.

use sha2::{Digest, Sha256};

use crate::entity::EntityId;

/// Compute a SHA-256 hex digest of the given bytes.
pub fn sha256_hex(data: &[u8]) -> String {
    let hash = Sha256::digest(data);
    format!("{hash:x}")
}

/// Content digest of an ordered ID list (comma-joined before hashing).
pub fn entity_set_digest(ids: &[EntityId]) -> String {
    let joined = ids
        .iter()
        .map(EntityId::as_str)
        .collect::<Vec<_>>()
        .join(",");
    sha256_hex(joined.as_bytes())
}

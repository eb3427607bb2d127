//! Cursor pagination over the ordered WikiProject ID list.
//!
//! The cursor is the ID of the last entity the caller has seen: the
//! last row when scanning forwards, the first row when scanning
//! backwards. The list is small (capped at 500), so cursor location is
//! a linear scan. Slices never wrap past the list boundaries; a
//! backwards request near the start simply returns fewer items.

use serde::Deserialize;

use crate::entity::EntityId;

/// Scan direction for paginated listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Forwards,
    Backwards,
}

impl Direction {
    pub fn invert(self) -> Self {
        match self {
            Self::Forwards => Self::Backwards,
            Self::Backwards => Self::Forwards,
        }
    }
}

/// The given cursor is not an ID in the list.
#[derive(Debug, thiserror::Error)]
#[error("Entity {0} not found")]
pub struct UnknownCursor(pub EntityId);

/// Slice the next `limit` IDs relative to `cursor` in `direction`.
///
/// An unknown (or absent) cursor means "start of the list in the
/// requested direction": the first `limit` IDs when scanning forwards,
/// the last `limit` when scanning backwards. The returned slice
/// preserves list order in both directions.
pub fn slice_page(
    all_ids: &[EntityId],
    cursor: Option<&EntityId>,
    limit: usize,
    direction: Direction,
) -> Vec<EntityId> {
    let cursor_pos = cursor.and_then(|c| all_ids.iter().position(|id| id == c));

    let range = match (cursor_pos, direction) {
        (Some(pos), Direction::Forwards) => {
            let start = pos + 1;
            start..(start + limit).min(all_ids.len())
        }
        (Some(pos), Direction::Backwards) => {
            if pos > limit {
                (pos - limit)..pos
            } else {
                0..pos
            }
        }
        (None, Direction::Forwards) => 0..limit.min(all_ids.len()),
        (None, Direction::Backwards) => all_ids.len().saturating_sub(limit)..all_ids.len(),
    };

    all_ids[range].to_vec()
}

/// Whether more results exist past `cursor` in `direction`.
///
/// The cursor must be a known ID; callers check membership first.
pub fn has_more(
    all_ids: &[EntityId],
    cursor: &EntityId,
    direction: Direction,
) -> Result<bool, UnknownCursor> {
    let pos = all_ids
        .iter()
        .position(|id| id == cursor)
        .ok_or_else(|| UnknownCursor(cursor.clone()))?;
    Ok(match direction {
        Direction::Forwards => pos + 1 < all_ids.len(),
        Direction::Backwards => pos > 0,
    })
}

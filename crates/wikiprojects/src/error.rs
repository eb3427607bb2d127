//! Error type for the WikiProject lookups.

use eventgrants_core::entity::EntityId;

/// Why WikiProjects could not be listed, tagged by failure source so
/// callers can dispatch without downcasting.
#[derive(Debug, thiserror::Error)]
pub enum WikiProjectsError {
    /// No ID list has ever been cached; computation was scheduled and
    /// the caller should retry later.
    #[error("WikiProject ID list is not available yet")]
    NotAvailableYet,

    /// The query service (SPARQL) call failed or returned malformed
    /// data.
    #[error("Cannot query the Wikidata Query Service: {0}")]
    QueryService(String),

    /// Metadata hydration via the Wikibase API failed; no partial
    /// page is ever returned.
    #[error("Cannot query the Wikibase API: {0}")]
    Wikibase(String),

    /// The supplied cursor is not a known entity ID.
    #[error("Entity {0} not found")]
    UnknownEntity(EntityId),
}

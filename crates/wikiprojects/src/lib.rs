//! WikiProject discovery and hydration.
//!
//! [`id_lookup::WikiProjectIdLookup`] maintains the per-wiki list of
//! WikiProject entity IDs from the Wikidata Query Service;
//! [`full_lookup::WikiProjectLookup`] paginates over that list and
//! hydrates pages with labels, descriptions, and sitelinks from the
//! Wikibase API.

pub mod config;
pub mod error;
pub mod full_lookup;
pub mod id_lookup;

pub use config::SiteConfig;
pub use error::WikiProjectsError;
pub use full_lookup::{WikiProjectData, WikiProjectEntry, WikiProjectLookup};
pub use id_lookup::WikiProjectIdLookup;

//! Paginated WikiProject listing with metadata hydration.
//!
//! Pages over the ID list from [`WikiProjectIdLookup`] and hydrates the
//! requested window with label, description, and sitelink from the
//! Wikibase `wbgetentities` API. Hydrated pages are cached per
//! (language, exact ID set) since entity IDs are globally unique and
//! labels are stable short-term.

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use eventgrants_cache::CacheHandle;
use eventgrants_core::entity::EntityId;
use eventgrants_core::hashing::entity_set_digest;
use eventgrants_core::pagination::{self, Direction};
use eventgrants_http::HttpTransport;

use crate::config::SiteConfig;
use crate::error::WikiProjectsError;
use crate::id_lookup::WikiProjectIdLookup;

/// TTL for hydrated pages.
const PAGE_TTL: Duration = Duration::from_secs(3600);

/// `wbgetentities` accepts at most 50 IDs per call.
const BATCH_SIZE: usize = 50;

/// Hydrated metadata for one WikiProject.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WikiProjectData {
    pub label: String,
    pub description: String,
    /// Article URL on the current wiki.
    pub sitelink: String,
}

/// One row of a listing page.
///
/// `data` is `None` when the entity has no sitelink for the current
/// wiki (the sitelink may have been removed after the ID list was last
/// refreshed); the ID still occupies its slot so callers can render
/// placeholders or skip consistently.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WikiProjectEntry {
    pub id: EntityId,
    pub data: Option<WikiProjectData>,
}

/// Main lookup service for WikiProject data, paginating over the ID
/// list and hydrating the requested window.
#[derive(Clone)]
pub struct WikiProjectLookup {
    id_lookup: WikiProjectIdLookup,
    transport: Arc<dyn HttpTransport>,
    cache: CacheHandle,
    config: Arc<SiteConfig>,
}

impl WikiProjectLookup {
    pub fn new(
        id_lookup: WikiProjectIdLookup,
        transport: Arc<dyn HttpTransport>,
        cache: CacheHandle,
        config: Arc<SiteConfig>,
    ) -> Self {
        Self {
            id_lookup,
            transport,
            cache,
            config,
        }
    }

    /// Return one page of WikiProjects in list order.
    ///
    /// `last_entity` is the ID of the last entity the caller has seen
    /// (the last row going forwards, the first row going backwards);
    /// `None` or an unknown ID starts from the beginning of the list in
    /// the requested direction. Backwards slicing truncates at the list
    /// start rather than wrapping.
    pub async fn get_wiki_projects(
        &self,
        language: &str,
        limit: usize,
        last_entity: Option<&EntityId>,
        direction: Direction,
    ) -> Result<Vec<WikiProjectEntry>, WikiProjectsError> {
        let all_ids = self.id_lookup.get_ids().await?;
        let wanted = pagination::slice_page(&all_ids, last_entity, limit, direction);
        self.data_for_entities(&wanted, language).await
    }

    /// Whether any WikiProjects exist on the current wiki.
    pub async fn has_wiki_projects(&self) -> Result<bool, WikiProjectsError> {
        Ok(!self.id_lookup.get_ids().await?.is_empty())
    }

    /// Whether more results exist past `last_id` in `direction`.
    ///
    /// Fails with [`WikiProjectsError::UnknownEntity`] when `last_id`
    /// is not in the list; callers check [`is_known_entity`] first.
    ///
    /// [`is_known_entity`]: WikiProjectLookup::is_known_entity
    pub async fn has_wiki_projects_after(
        &self,
        last_id: &EntityId,
        direction: Direction,
    ) -> Result<bool, WikiProjectsError> {
        let all_ids = self.id_lookup.get_ids().await?;
        pagination::has_more(&all_ids, last_id, direction)
            .map_err(|e| WikiProjectsError::UnknownEntity(e.0))
    }

    /// Whether the given ID corresponds to a known WikiProject.
    pub async fn is_known_entity(&self, id: &EntityId) -> Result<bool, WikiProjectsError> {
        Ok(self.id_lookup.get_ids().await?.contains(id))
    }

    async fn data_for_entities(
        &self,
        ids: &[EntityId],
        language: &str,
    ) -> Result<Vec<WikiProjectEntry>, WikiProjectsError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let key = format!(
            "eventgrants:wikiprojects:{language}:{}",
            entity_set_digest(ids)
        );
        let page = self
            .cache
            .get_or_compute(&key, PAGE_TTL, || async {
                self.compute_entries(ids, language).await.map(Some)
            })
            .await?;
        Ok(page.unwrap_or_default())
    }

    async fn compute_entries(
        &self,
        ids: &[EntityId],
        language: &str,
    ) -> Result<Vec<WikiProjectEntry>, WikiProjectsError> {
        let mut entities = serde_json::Map::new();
        for batch in ids.chunks(BATCH_SIZE) {
            entities.extend(self.query_wikibase_batch(batch, language).await?);
        }

        let entries = ids
            .iter()
            .map(|id| WikiProjectEntry {
                id: id.clone(),
                data: entities
                    .get(id.as_str())
                    .and_then(|entity| self.build_entity_data(entity, language)),
            })
            .collect();
        Ok(entries)
    }

    /// One `wbgetentities` call; any failure fails the whole page.
    async fn query_wikibase_batch(
        &self,
        ids: &[EntityId],
        language: &str,
    ) -> Result<serde_json::Map<String, serde_json::Value>, WikiProjectsError> {
        let joined = ids
            .iter()
            .map(EntityId::as_str)
            .collect::<Vec<_>>()
            .join("|");
        let url = eventgrants_http::build_url(
            &self.config.wikibase_api_url,
            &[
                ("action", "wbgetentities"),
                ("format", "json"),
                ("ids", &joined),
                ("props", "labels|descriptions|sitelinks/urls"),
                ("languages", language),
                ("languagefallback", "1"),
                ("formatversion", "2"),
            ],
        )
        .map_err(|e| WikiProjectsError::Wikibase(e.to_string()))?;

        let response = self
            .transport
            .get(&url)
            .await
            .map_err(|e| WikiProjectsError::Wikibase(e.to_string()))?;
        if !response.is_success() {
            tracing::error!(
                url,
                status = response.status,
                response_content = %response.body,
                "Bad status from the Wikibase API"
            );
            return Err(WikiProjectsError::Wikibase(format!(
                "bad status {}",
                response.status
            )));
        }

        let parsed: serde_json::Value = serde_json::from_str(&response.body)
            .map_err(|e| WikiProjectsError::Wikibase(format!("invalid JSON: {e}")))?;
        match parsed.get("entities").and_then(|e| e.as_object()) {
            Some(entities) => Ok(entities.clone()),
            None => Err(WikiProjectsError::Wikibase("missing entities".into())),
        }
    }

    /// `None` when the entity has no sitelink for the current wiki.
    fn build_entity_data(
        &self,
        entity: &serde_json::Value,
        language: &str,
    ) -> Option<WikiProjectData> {
        let sitelink = entity["sitelinks"][&self.config.wiki_id]["url"].as_str()?;
        let term = |kind: &str| {
            entity[kind][language]["value"]
                .as_str()
                .unwrap_or_default()
                .to_string()
        };
        Some(WikiProjectData {
            label: term("labels"),
            description: term("descriptions"),
            sitelink: sitelink.to_string(),
        })
    }
}

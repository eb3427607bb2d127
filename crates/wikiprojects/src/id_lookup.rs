//! Per-wiki WikiProject entity-ID list sourced from the query service.
//!
//! The list is expensive to regenerate, so it lives in the cache with a
//! long TTL and is refreshed out of band: callers always get whatever
//! is cached (stale included), and a background refresh is scheduled
//! whenever the entry is older than [`STALE_AFTER`]. Only a wiki that
//! has never had a list cached observes a failure
//! ([`WikiProjectsError::NotAvailableYet`]).

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::sync::OnceCell;

use eventgrants_cache::CacheHandle;
use eventgrants_core::entity::EntityId;
use eventgrants_http::HttpTransport;

use crate::config::SiteConfig;
use crate::error::WikiProjectsError;

/// Cached lists stick around for a week; serving stale data beats
/// serving nothing during a query-service outage.
const LIST_TTL: Duration = Duration::from_secs(7 * 24 * 3600);

/// Age at which a cached list triggers a background refresh.
const STALE_AFTER_SECS: i64 = 3600;

/// Hard cap on the list size, enforced in the query itself so the
/// pagination base stays bounded.
const MAX_PROJECTS: usize = 500;

/// Cache payload for the ID list.
#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct StoredIdList {
    pub(crate) list: Vec<EntityId>,
    /// Unix timestamp of the last successful refresh.
    pub(crate) last_update: i64,
}

pub(crate) fn list_cache_key(wiki_id: &str) -> String {
    format!("eventgrants:wikiproject-ids:{wiki_id}")
}

/// Looks up the WikiProject entity IDs available on the current wiki.
///
/// Construct one instance per logical call chain: the fetched list is
/// memoized on the instance to avoid repeated cache round trips within
/// one request, and the memo is never invalidated.
#[derive(Clone)]
pub struct WikiProjectIdLookup {
    transport: Arc<dyn HttpTransport>,
    cache: CacheHandle,
    config: Arc<SiteConfig>,
    fetched: Arc<OnceCell<Vec<EntityId>>>,
}

impl WikiProjectIdLookup {
    pub fn new(
        transport: Arc<dyn HttpTransport>,
        cache: CacheHandle,
        config: Arc<SiteConfig>,
    ) -> Self {
        Self {
            transport,
            cache,
            config,
            fetched: Arc::new(OnceCell::new()),
        }
    }

    /// Return the cached ID list, scheduling a background refresh when
    /// the entry is stale.
    ///
    /// Fails with [`WikiProjectsError::NotAvailableYet`] only when no
    /// list has ever been cached for this wiki; the scheduled refresh
    /// will populate it for later calls. Never runs the query service
    /// call inline.
    pub async fn get_ids(&self) -> Result<Vec<EntityId>, WikiProjectsError> {
        self.fetched
            .get_or_try_init(|| self.load_ids())
            .await
            .cloned()
    }

    async fn load_ids(&self) -> Result<Vec<EntityId>, WikiProjectsError> {
        let key = list_cache_key(&self.config.wiki_id);
        let stored: Option<StoredIdList> = match self.cache.get(&key).await {
            Ok(stored) => stored,
            Err(e) => {
                tracing::warn!(key, error = %e, "ID list cache read failed, treating as miss");
                None
            }
        };

        let (list, last_update) = match stored {
            Some(stored) => (stored.list, stored.last_update),
            None => (Vec::new(), 0),
        };

        if chrono::Utc::now().timestamp() - last_update >= STALE_AFTER_SECS {
            self.spawn_refresh();
        }

        if last_update == 0 {
            return Err(WikiProjectsError::NotAvailableYet);
        }
        Ok(list)
    }

    fn spawn_refresh(&self) {
        let this = self.clone();
        tokio::spawn(async move {
            if let Err(e) = this.refresh().await {
                tracing::error!(
                    wiki_id = %this.config.wiki_id,
                    error = %e,
                    "Background WikiProject ID list refresh failed"
                );
            }
        });
    }

    /// Re-run the query service lookup and publish the fresh list.
    ///
    /// Serialized per wiki through the cache's key lock so concurrent
    /// staleness detections do not stampede the query service.
    pub async fn refresh(&self) -> Result<(), WikiProjectsError> {
        let key = list_cache_key(&self.config.wiki_id);
        let _guard = self.cache.key_lock(&key).await;

        let list = self.query_ids().await?;
        let stored = StoredIdList {
            list,
            last_update: chrono::Utc::now().timestamp(),
        };
        if let Err(e) = self.cache.set(&key, &stored, LIST_TTL).await {
            tracing::warn!(key, error = %e, "Failed to publish refreshed ID list");
        }
        Ok(())
    }

    async fn query_ids(&self) -> Result<Vec<EntityId>, WikiProjectsError> {
        let query = sparql_query(&self.config.server_url);
        let url = eventgrants_http::build_url(
            &self.config.query_service_url,
            &[("query", query.as_str()), ("format", "json")],
        )
        .map_err(|e| WikiProjectsError::QueryService(e.to_string()))?;

        let response = self
            .transport
            .get(&url)
            .await
            .map_err(|e| WikiProjectsError::QueryService(e.to_string()))?;
        if !response.is_success() {
            tracing::error!(
                url,
                status = response.status,
                response_content = %response.body,
                "Bad status from the query service"
            );
            return Err(WikiProjectsError::QueryService(format!(
                "bad status {}",
                response.status
            )));
        }

        let parsed: serde_json::Value = serde_json::from_str(&response.body)
            .map_err(|e| WikiProjectsError::QueryService(format!("invalid JSON: {e}")))?;
        let bindings = parsed["results"]["bindings"]
            .as_array()
            .ok_or_else(|| WikiProjectsError::QueryService("missing results.bindings".into()))?;

        let mut ids = Vec::with_capacity(bindings.len().min(MAX_PROJECTS));
        for binding in bindings {
            let uri = binding["item"]["value"].as_str().ok_or_else(|| {
                WikiProjectsError::QueryService("binding without item.value".into())
            })?;
            let id = EntityId::from_uri(uri)
                .map_err(|e| WikiProjectsError::QueryService(e.to_string()))?;
            ids.push(id);
        }
        // Pagination depends on numeric order; enforce it locally
        // rather than trusting the service to honor ORDER BY.
        ids.sort_by_key(EntityId::numeric_suffix);
        Ok(ids)
    }
}

/// SPARQL selecting WikiProject items with an article on the given
/// wiki, ordered numerically by QID so the result set is stable.
fn sparql_query(server_url: &str) -> String {
    let wiki_url = format!("{}/", server_url.trim_end_matches('/'));
    format!(
        "SELECT ?item WHERE {{\n\
         \x20   ?item wdt:P31 wd:Q16695773\n\
         \n\
         \x20   FILTER EXISTS {{\n\
         \x20     ?article schema:about ?item.\n\
         \x20     ?article schema:isPartOf <{wiki_url}>.\n\
         \x20   }}\n\
         }}\n\
         ORDER BY xsd:integer( STRAFTER( STR( ?item ), STR( wd:Q ) ) )\n\
         LIMIT {MAX_PROJECTS}"
    )
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    use assert_matches::assert_matches;
    use async_trait::async_trait;

    use eventgrants_cache::{CacheHandle, MemoryCache};
    use eventgrants_http::{HttpError, HttpResponse};

    use super::*;

    struct FakeQueryService {
        calls: AtomicUsize,
        responses: Mutex<Vec<HttpResponse>>,
    }

    impl FakeQueryService {
        fn with_items(uris: &[&str]) -> Self {
            let bindings: Vec<_> = uris
                .iter()
                .map(|uri| serde_json::json!({"item": {"value": uri}}))
                .collect();
            let body = serde_json::json!({"results": {"bindings": bindings}});
            Self::with_response(HttpResponse {
                status: 200,
                content_type: Some("application/sparql-results+json".into()),
                body: body.to_string(),
            })
        }

        fn with_response(response: HttpResponse) -> Self {
            Self {
                calls: AtomicUsize::new(0),
                responses: Mutex::new(vec![response]),
            }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl HttpTransport for FakeQueryService {
        async fn post_json(
            &self,
            _url: &str,
            _body: &serde_json::Value,
            _headers: &[(String, String)],
        ) -> Result<HttpResponse, HttpError> {
            unreachable!("ID lookup only issues GETs")
        }

        async fn get(&self, _url: &str) -> Result<HttpResponse, HttpError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let mut responses = self.responses.lock().unwrap();
            if responses.len() > 1 {
                Ok(responses.remove(0))
            } else {
                Ok(responses[0].clone())
            }
        }
    }

    fn config() -> Arc<SiteConfig> {
        Arc::new(SiteConfig {
            wiki_id: "enwiki".into(),
            server_url: "https://en.wikipedia.org".into(),
            query_service_url: "https://query.example.org/sparql".into(),
            wikibase_api_url: "https://wikibase.example.org/w/api.php".into(),
        })
    }

    fn lookup(transport: Arc<FakeQueryService>, cache: CacheHandle) -> WikiProjectIdLookup {
        WikiProjectIdLookup::new(transport, cache, config())
    }

    async fn seed_list(cache: &CacheHandle, ids: &[&str], last_update: i64) {
        let stored = StoredIdList {
            list: ids.iter().map(|id| EntityId::parse(id).unwrap()).collect(),
            last_update,
        };
        cache
            .set(&list_cache_key("enwiki"), &stored, LIST_TTL)
            .await
            .unwrap();
    }

    async fn settle() {
        tokio::time::sleep(Duration::from_millis(50)).await;
    }

    // -- get_ids ------------------------------------------------------

    #[tokio::test]
    async fn uncached_fails_and_schedules_refresh() {
        let upstream = Arc::new(FakeQueryService::with_items(&[
            "http://www.wikidata.org/entity/Q1",
            "http://www.wikidata.org/entity/Q2",
        ]));
        let cache = CacheHandle::new(Arc::new(MemoryCache::new()));

        let result = lookup(Arc::clone(&upstream), cache.clone()).get_ids().await;
        assert_matches!(result, Err(WikiProjectsError::NotAvailableYet));

        settle().await;
        assert_eq!(upstream.calls(), 1);

        // The refresh populated the cache for later callers.
        let ids = lookup(upstream, cache).get_ids().await.unwrap();
        assert_eq!(ids, vec![
            EntityId::parse("Q1").unwrap(),
            EntityId::parse("Q2").unwrap(),
        ]);
    }

    #[tokio::test]
    async fn fresh_list_is_served_without_any_query() {
        let upstream = Arc::new(FakeQueryService::with_items(&[]));
        let cache = CacheHandle::new(Arc::new(MemoryCache::new()));
        seed_list(&cache, &["Q5", "Q7"], chrono::Utc::now().timestamp()).await;

        let ids = lookup(Arc::clone(&upstream), cache).get_ids().await.unwrap();
        assert_eq!(ids.len(), 2);

        settle().await;
        assert_eq!(upstream.calls(), 0);
    }

    #[tokio::test]
    async fn stale_list_is_returned_and_refresh_scheduled() {
        let upstream = Arc::new(FakeQueryService::with_items(&[
            "http://www.wikidata.org/entity/Q9",
        ]));
        let cache = CacheHandle::new(Arc::new(MemoryCache::new()));
        // Cached two hours ago.
        seed_list(&cache, &["Q5"], chrono::Utc::now().timestamp() - 7200).await;

        let ids = lookup(Arc::clone(&upstream), cache.clone())
            .get_ids()
            .await
            .unwrap();
        assert_eq!(ids, vec![EntityId::parse("Q5").unwrap()]);

        settle().await;
        assert_eq!(upstream.calls(), 1);
        let ids = lookup(upstream, cache).get_ids().await.unwrap();
        assert_eq!(ids, vec![EntityId::parse("Q9").unwrap()]);
    }

    #[tokio::test]
    async fn refresh_failure_is_swallowed_for_stale_readers() {
        let upstream = Arc::new(FakeQueryService::with_response(HttpResponse {
            status: 503,
            content_type: None,
            body: "down".into(),
        }));
        let cache = CacheHandle::new(Arc::new(MemoryCache::new()));
        seed_list(&cache, &["Q5"], chrono::Utc::now().timestamp() - 7200).await;

        let ids = lookup(Arc::clone(&upstream), cache.clone())
            .get_ids()
            .await
            .unwrap();
        assert_eq!(ids, vec![EntityId::parse("Q5").unwrap()]);

        settle().await;
        // Old list survives the failed refresh.
        let ids = lookup(upstream, cache).get_ids().await.unwrap();
        assert_eq!(ids, vec![EntityId::parse("Q5").unwrap()]);
    }

    #[tokio::test]
    async fn fetched_list_is_memoized_per_instance() {
        let upstream = Arc::new(FakeQueryService::with_items(&[]));
        let cache = CacheHandle::new(Arc::new(MemoryCache::new()));
        seed_list(&cache, &["Q5"], chrono::Utc::now().timestamp()).await;

        let lookup = lookup(upstream, cache.clone());
        let first = lookup.get_ids().await.unwrap();
        cache.delete(&list_cache_key("enwiki")).await.unwrap();
        let second = lookup.get_ids().await.unwrap();
        assert_eq!(first, second);
    }

    // -- refresh ------------------------------------------------------

    #[tokio::test]
    async fn refresh_orders_ids_numerically() {
        let upstream = Arc::new(FakeQueryService::with_items(&[
            "http://www.wikidata.org/entity/Q10",
            "http://www.wikidata.org/entity/Q2",
            "http://www.wikidata.org/entity/Q9",
        ]));
        let cache = CacheHandle::new(Arc::new(MemoryCache::new()));

        lookup(Arc::clone(&upstream), cache.clone())
            .refresh()
            .await
            .unwrap();

        let ids = lookup(upstream, cache).get_ids().await.unwrap();
        assert_eq!(ids, vec![
            EntityId::parse("Q2").unwrap(),
            EntityId::parse("Q9").unwrap(),
            EntityId::parse("Q10").unwrap(),
        ]);
    }

    #[tokio::test]
    async fn refresh_surfaces_bad_status_as_query_service_error() {
        let upstream = Arc::new(FakeQueryService::with_response(HttpResponse {
            status: 500,
            content_type: None,
            body: "oops".into(),
        }));
        let cache = CacheHandle::new(Arc::new(MemoryCache::new()));

        let result = lookup(upstream, cache).refresh().await;
        assert_matches!(result, Err(WikiProjectsError::QueryService(_)));
    }

    #[tokio::test]
    async fn refresh_rejects_malformed_bindings() {
        let upstream = Arc::new(FakeQueryService::with_response(HttpResponse {
            status: 200,
            content_type: Some("application/json".into()),
            body: r#"{"results": {}}"#.into(),
        }));
        let cache = CacheHandle::new(Arc::new(MemoryCache::new()));

        let result = lookup(upstream, cache).refresh().await;
        assert_matches!(result, Err(WikiProjectsError::QueryService(_)));
    }

    // -- sparql_query -------------------------------------------------

    #[test]
    fn query_scopes_to_wiki_and_caps_results() {
        let query = sparql_query("https://en.wikipedia.org");
        assert!(query.contains("wdt:P31 wd:Q16695773"));
        assert!(query.contains("schema:isPartOf <https://en.wikipedia.org/>"));
        assert!(query.contains("LIMIT 500"));
        // Trailing slashes on the configured URL do not double up.
        let query = sparql_query("https://en.wikipedia.org/");
        assert!(query.contains("<https://en.wikipedia.org/>"));
    }
}

//! Handler for the paginated WikiProject listing endpoint.

use axum::extract::{Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};

use eventgrants_core::entity::EntityId;
use eventgrants_core::pagination::Direction;
use eventgrants_wikiprojects::{WikiProjectEntry, WikiProjectLookup};

use crate::error::{AppError, AppResult};
use crate::response::DataResponse;
use crate::state::AppState;

/// Hard cap on page size, matching the upstream batch limit.
const MAX_LIMIT: usize = 50;
const DEFAULT_LIMIT: usize = 10;

/// Query params for `GET /wikiprojects`.
#[derive(Debug, Deserialize)]
pub struct WikiProjectsQuery {
    /// Language for labels and descriptions. Defaults to `en`.
    pub language: Option<String>,
    /// Page size. Defaults to 10, capped at 50.
    pub limit: Option<usize>,
    /// Cursor: the last entity ID the caller has seen.
    pub last: Option<String>,
    /// Scan direction, `forwards` or `backwards`. Defaults to forwards.
    pub dir: Option<Direction>,
}

/// One page of WikiProjects plus the pagination boundary flags.
#[derive(Debug, Serialize)]
pub struct WikiProjectsPage {
    pub projects: Vec<WikiProjectEntry>,
    /// Whether more results exist past this page in the requested
    /// direction.
    pub has_more: bool,
    /// Whether results exist before this page, for the previous-page
    /// link.
    pub has_previous: bool,
}

/// GET /wikiprojects -- a hydrated page of the WikiProject listing.
pub async fn list_wiki_projects(
    State(state): State<AppState>,
    Query(query): Query<WikiProjectsQuery>,
) -> AppResult<Json<DataResponse<WikiProjectsPage>>> {
    let language = query.language.unwrap_or_else(|| "en".to_string());
    let limit = query.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT);
    let direction = query.dir.unwrap_or(Direction::Forwards);

    let lookup = state.wiki_project_lookup();

    let last = match &query.last {
        Some(raw) => {
            let id = EntityId::parse(raw)
                .map_err(|e| AppError::BadRequest(e.to_string()))?;
            if !lookup.is_known_entity(&id).await? {
                return Err(AppError::BadRequest(format!("Entity {id} not found")));
            }
            Some(id)
        }
        None => None,
    };

    let projects = lookup
        .get_wiki_projects(&language, limit, last.as_ref(), direction)
        .await?;

    // The cursor for the next page is the boundary row in the scan
    // direction: the last row going forwards, the first row backwards.
    // The opposite boundary, scanned in the inverted direction, tells
    // whether a previous page exists.
    let (next_boundary, prev_boundary) = match direction {
        Direction::Forwards => (projects.last(), projects.first()),
        Direction::Backwards => (projects.first(), projects.last()),
    };
    let has_more = past_boundary(&lookup, next_boundary, direction).await?;
    let has_previous = past_boundary(&lookup, prev_boundary, direction.invert()).await?;

    Ok(Json(DataResponse {
        data: WikiProjectsPage {
            projects,
            has_more,
            has_previous,
        },
    }))
}

async fn past_boundary(
    lookup: &WikiProjectLookup,
    boundary: Option<&WikiProjectEntry>,
    direction: Direction,
) -> AppResult<bool> {
    match boundary {
        Some(entry) => Ok(lookup.has_wiki_projects_after(&entry.id, direction).await?),
        None => Ok(false),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use async_trait::async_trait;
    use serde_json::Value;

    use eventgrants_cache::{CacheHandle, MemoryCache};
    use eventgrants_fluxx::{FluxxClient, FluxxConfig, GrantIdLookup};
    use eventgrants_http::{HttpError, HttpResponse, HttpTransport};
    use eventgrants_wikiprojects::{SiteConfig, WikiProjectIdLookup};

    use super::*;
    use crate::config::ServerConfig;
    use crate::permission::TokenPermissionChecker;
    use crate::store::PgGrantStore;

    /// Serves the ID-list query and records every entity hydration URL.
    struct FakeUpstream {
        sparql_body: String,
        entity_urls: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl HttpTransport for FakeUpstream {
        async fn post_json(
            &self,
            _url: &str,
            _body: &Value,
            _headers: &[(String, String)],
        ) -> Result<HttpResponse, HttpError> {
            unimplemented!("WikiProject lookups only issue GETs")
        }

        async fn get(&self, url: &str) -> Result<HttpResponse, HttpError> {
            let body = if url.contains("sparql") {
                self.sparql_body.clone()
            } else {
                self.entity_urls.lock().unwrap().push(url.to_string());
                r#"{"entities": {}}"#.to_string()
            };
            Ok(HttpResponse {
                status: 200,
                content_type: Some("application/json".into()),
                body,
            })
        }
    }

    fn sparql_body(count: usize) -> String {
        let bindings: Vec<_> = (1..=count)
            .map(|n| {
                serde_json::json!({
                    "item": {"value": format!("http://www.wikidata.org/entity/Q{n}")},
                })
            })
            .collect();
        serde_json::json!({"results": {"bindings": bindings}}).to_string()
    }

    fn unconnected_pool() -> eventgrants_db::DbPool {
        sqlx::postgres::PgPoolOptions::new()
            .connect_lazy("postgres://localhost/unused")
            .unwrap()
    }

    /// A state whose ID list holds Q1..Qcount, already refreshed into
    /// the cache.
    async fn state_with_projects(count: usize) -> (AppState, Arc<FakeUpstream>) {
        let upstream = Arc::new(FakeUpstream {
            sparql_body: sparql_body(count),
            entity_urls: Mutex::new(Vec::new()),
        });
        let transport: Arc<dyn HttpTransport> = Arc::clone(&upstream) as _;
        let cache = CacheHandle::new(Arc::new(MemoryCache::new()));
        let site = Arc::new(SiteConfig {
            wiki_id: "enwiki".into(),
            server_url: "https://en.wikipedia.org".into(),
            query_service_url: "https://query.example.org/sparql".into(),
            wikibase_api_url: "https://wikibase.example.org/w/api.php".into(),
        });

        WikiProjectIdLookup::new(Arc::clone(&transport), cache.clone(), Arc::clone(&site))
            .refresh()
            .await
            .unwrap();

        let client = Arc::new(FluxxClient::new(
            Arc::clone(&transport),
            cache.clone(),
            FluxxConfig {
                oauth_url: "https://fluxx.test/oauth/token".into(),
                base_url: "https://fluxx.test/api/rest/v2/".into(),
                client_id: "id".into(),
                client_secret: "secret".into(),
            },
        ));
        let state = AppState {
            pool: unconnected_pool(),
            config: Arc::new(ServerConfig {
                host: "127.0.0.1".into(),
                port: 0,
                cors_origins: vec![],
                request_timeout_secs: 5,
                editor_token: None,
                outbound_proxy: None,
                wikiprojects_refresh_secs: 1800,
            }),
            site,
            cache: cache.clone(),
            transport,
            grant_lookup: Arc::new(GrantIdLookup::new(client, cache)),
            permissions: Arc::new(TokenPermissionChecker::new(None)),
            grants: Arc::new(PgGrantStore::new(unconnected_pool())),
        };
        (state, upstream)
    }

    fn params(limit: Option<usize>, last: Option<&str>, dir: Option<Direction>) -> WikiProjectsQuery {
        WikiProjectsQuery {
            language: None,
            limit,
            last: last.map(str::to_string),
            dir,
        }
    }

    #[tokio::test]
    async fn oversized_limit_is_clamped_to_the_batch_cap() {
        let (state, upstream) = state_with_projects(60).await;

        let Json(response) = list_wiki_projects(State(state), Query(params(Some(500), None, None)))
            .await
            .unwrap();

        assert_eq!(response.data.projects.len(), MAX_LIMIT);
        assert_eq!(response.data.projects[0].id, EntityId::parse("Q1").unwrap());
        assert!(response.data.has_more);
        assert!(!response.data.has_previous);

        // One hydration batch carrying exactly the capped page.
        let urls = upstream.entity_urls.lock().unwrap();
        assert_eq!(urls.len(), 1);
        assert_eq!(urls[0].matches('Q').count(), MAX_LIMIT);
    }

    #[tokio::test]
    async fn zero_limit_is_raised_to_one() {
        let (state, _upstream) = state_with_projects(3).await;

        let Json(response) = list_wiki_projects(State(state), Query(params(Some(0), None, None)))
            .await
            .unwrap();

        assert_eq!(response.data.projects.len(), 1);
    }

    #[tokio::test]
    async fn middle_page_reports_neighbors_on_both_sides() {
        let (state, _upstream) = state_with_projects(10).await;

        // Q5..Q7 out of Q1..Q10.
        let Json(response) =
            list_wiki_projects(State(state), Query(params(Some(3), Some("Q4"), None)))
                .await
                .unwrap();

        assert_eq!(response.data.projects.len(), 3);
        assert!(response.data.has_more);
        assert!(response.data.has_previous);
    }

    #[tokio::test]
    async fn backwards_tail_page_has_no_previous() {
        let (state, _upstream) = state_with_projects(10).await;

        // No cursor going backwards starts at the end: Q8..Q10.
        let Json(response) = list_wiki_projects(
            State(state),
            Query(params(Some(3), None, Some(Direction::Backwards))),
        )
        .await
        .unwrap();

        assert_eq!(response.data.projects.len(), 3);
        assert!(response.data.has_more);
        assert!(!response.data.has_previous);
    }

    #[tokio::test]
    async fn unknown_cursor_is_a_bad_request() {
        let (state, _upstream) = state_with_projects(3).await;

        let result =
            list_wiki_projects(State(state), Query(params(None, Some("Q99"), None))).await;
        assert!(matches!(result, Err(AppError::BadRequest(_))));
    }
}

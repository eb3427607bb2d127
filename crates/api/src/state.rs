use std::sync::Arc;

use eventgrants_cache::CacheHandle;
use eventgrants_fluxx::GrantIdLookup;
use eventgrants_http::HttpTransport;
use eventgrants_wikiprojects::{SiteConfig, WikiProjectIdLookup, WikiProjectLookup};

use crate::config::ServerConfig;
use crate::permission::PermissionChecker;
use crate::store::GrantStore;

/// Shared application state available to all Axum handlers via
/// `State<AppState>`.
///
/// This is cheaply cloneable (inner data is behind `Arc` or is already
/// `Clone`).
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub pool: eventgrants_db::DbPool,
    /// Server configuration.
    pub config: Arc<ServerConfig>,
    /// Site identity and upstream endpoints.
    pub site: Arc<SiteConfig>,
    /// Cache backend shared by all lookup services.
    pub cache: CacheHandle,
    /// Outbound HTTP transport shared by all lookup services.
    pub transport: Arc<dyn HttpTransport>,
    /// Grant-ID validation against the upstream grants system.
    pub grant_lookup: Arc<GrantIdLookup>,
    /// Authorization for grant mutations.
    pub permissions: Arc<dyn PermissionChecker>,
    /// Persistence for grant associations.
    pub grants: Arc<dyn GrantStore>,
}

impl AppState {
    /// Build a WikiProject lookup for one request.
    ///
    /// Constructed per call chain because the ID lookup memoizes the
    /// fetched list on the instance; sharing one across requests would
    /// pin the first list it ever saw.
    pub fn wiki_project_lookup(&self) -> WikiProjectLookup {
        let id_lookup = WikiProjectIdLookup::new(
            Arc::clone(&self.transport),
            self.cache.clone(),
            Arc::clone(&self.site),
        );
        WikiProjectLookup::new(
            id_lookup,
            Arc::clone(&self.transport),
            self.cache.clone(),
            Arc::clone(&self.site),
        )
    }
}

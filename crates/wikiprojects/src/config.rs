//! Site and endpoint configuration for the WikiProject lookups.

/// Identity of the current wiki plus the external endpoints queried.
#[derive(Debug, Clone)]
pub struct SiteConfig {
    /// Site ID of the current wiki as used in Wikibase sitelinks,
    /// e.g. `enwiki`.
    pub wiki_id: String,
    /// Canonical server URL of the current wiki, e.g.
    /// `https://en.wikipedia.org`. Used to scope the graph query.
    pub server_url: String,
    /// SPARQL endpoint of the query service.
    pub query_service_url: String,
    /// Wikibase action API endpoint.
    pub wikibase_api_url: String,
}

impl SiteConfig {
    /// Load site settings from environment variables.
    ///
    /// | Env Var             | Default                                |
    /// |---------------------|----------------------------------------|
    /// | `WIKI_ID`           | `enwiki`                               |
    /// | `WIKI_SERVER_URL`   | `https://en.wikipedia.org`             |
    /// | `QUERY_SERVICE_URL` | `https://query.wikidata.org/sparql`    |
    /// | `WIKIBASE_API_URL`  | `https://www.wikidata.org/w/api.php`   |
    pub fn from_env() -> Self {
        let var = |name: &str, default: &str| {
            std::env::var(name).unwrap_or_else(|_| default.to_string())
        };
        Self {
            wiki_id: var("WIKI_ID", "enwiki"),
            server_url: var("WIKI_SERVER_URL", "https://en.wikipedia.org"),
            query_service_url: var("QUERY_SERVICE_URL", "https://query.wikidata.org/sparql"),
            wikibase_api_url: var("WIKIBASE_API_URL", "https://www.wikidata.org/w/api.php"),
        }
    }
}

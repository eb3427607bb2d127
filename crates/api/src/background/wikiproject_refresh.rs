//! Periodic refresh of the WikiProject ID list.
//!
//! Keeps the cached list fresh so organic traffic rarely observes
//! staleness (and never observes an empty cache after the first
//! successful run). Runs on a fixed interval using
//! `tokio::time::interval`.

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use eventgrants_cache::CacheHandle;
use eventgrants_http::HttpTransport;
use eventgrants_wikiprojects::{SiteConfig, WikiProjectIdLookup};

/// Run the ID list refresh loop until `cancel` is triggered.
///
/// The first tick fires immediately, so the list is populated at
/// startup instead of on the first unlucky request.
pub async fn run(
    transport: Arc<dyn HttpTransport>,
    cache: CacheHandle,
    site: Arc<SiteConfig>,
    interval: Duration,
    cancel: CancellationToken,
) {
    tracing::info!(
        wiki_id = %site.wiki_id,
        interval_secs = interval.as_secs(),
        "WikiProject ID refresh job started"
    );

    let mut ticker = tokio::time::interval(interval);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::info!("WikiProject ID refresh job stopping");
                break;
            }
            _ = ticker.tick() => {
                let lookup = WikiProjectIdLookup::new(
                    Arc::clone(&transport),
                    cache.clone(),
                    Arc::clone(&site),
                );
                match lookup.refresh().await {
                    Ok(()) => tracing::debug!("WikiProject ID list refreshed"),
                    Err(e) => {
                        tracing::error!(error = %e, "WikiProject ID list refresh failed");
                    }
                }
            }
        }
    }
}

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use eventgrants_api::config::ServerConfig;
use eventgrants_api::permission::TokenPermissionChecker;
use eventgrants_api::router::build_app_router;
use eventgrants_api::state::AppState;
use eventgrants_api::store::PgGrantStore;
use eventgrants_api::background;
use eventgrants_cache::{CacheHandle, MemoryCache};
use eventgrants_fluxx::{FluxxClient, FluxxConfig, GrantIdLookup};
use eventgrants_http::{HttpTransport, ReqwestTransport};
use eventgrants_wikiprojects::SiteConfig;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // --- Tracing ---
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "eventgrants_api=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // --- Configuration ---
    let config = ServerConfig::from_env();
    tracing::info!(host = %config.host, port = %config.port, "Loaded server configuration");

    let site = Arc::new(SiteConfig::from_env());
    tracing::info!(wiki_id = %site.wiki_id, "Loaded site configuration");

    // --- Database ---
    let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");

    let pool = eventgrants_db::create_pool(&database_url)
        .await
        .expect("Failed to connect to database");
    tracing::info!("Database connection pool created");

    eventgrants_db::health_check(&pool)
        .await
        .expect("Database health check failed");
    tracing::info!("Database health check passed");

    eventgrants_db::run_migrations(&pool)
        .await
        .expect("Failed to run database migrations");
    tracing::info!("Database migrations applied");

    // --- Lookup services ---
    let cache = CacheHandle::new(Arc::new(MemoryCache::new()));

    let transport: Arc<dyn HttpTransport> = Arc::new(
        ReqwestTransport::new(config.outbound_proxy.as_deref())
            .expect("Failed to build HTTP transport"),
    );

    let fluxx_client = Arc::new(FluxxClient::new(
        Arc::clone(&transport),
        cache.clone(),
        FluxxConfig::from_env(),
    ));
    let grant_lookup = Arc::new(GrantIdLookup::new(fluxx_client, cache.clone()));

    let permissions = Arc::new(TokenPermissionChecker::new(config.editor_token.clone()));

    // --- Background refresh job ---
    let refresh_cancel = tokio_util::sync::CancellationToken::new();
    let refresh_handle = tokio::spawn(background::wikiproject_refresh::run(
        Arc::clone(&transport),
        cache.clone(),
        Arc::clone(&site),
        Duration::from_secs(config.wikiprojects_refresh_secs),
        refresh_cancel.clone(),
    ));
    tracing::info!("Background jobs started");

    // --- App state ---
    let grants = Arc::new(PgGrantStore::new(pool.clone()));
    let state = AppState {
        pool,
        config: Arc::new(config.clone()),
        site,
        cache,
        transport,
        grant_lookup,
        permissions,
        grants,
    };

    // --- Router ---
    let app = build_app_router(state, &config);

    // --- Start server ---
    let addr = SocketAddr::new(
        config.host.parse().expect("Invalid HOST address"),
        config.port,
    );
    tracing::info!(%addr, "Starting server");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind to address");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Server error");

    // --- Post-shutdown cleanup ---
    tracing::info!("Server stopped accepting connections, cleaning up");

    refresh_cancel.cancel();
    let _ = tokio::time::timeout(Duration::from_secs(5), refresh_handle).await;
    tracing::info!("Background jobs stopped");

    tracing::info!("Graceful shutdown complete");
}

/// Wait for a termination signal to initiate graceful shutdown.
///
/// Handles both SIGINT (Ctrl-C) and SIGTERM (on Unix) so the server
/// shuts down cleanly whether stopped interactively or by a process
/// manager (e.g. systemd, Docker, Kubernetes).
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl-C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received SIGINT (Ctrl-C), starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        }
    }
}

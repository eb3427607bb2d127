pub mod grants;
pub mod health;
pub mod wikiprojects;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// ```text
/// /events/{event_id}/grant-id    get, put, delete
/// /wikiprojects                  get (paginated listing)
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .merge(grants::router())
        .merge(wikiprojects::router())
}

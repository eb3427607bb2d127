//! Route definitions for the WikiProject listing.

use axum::routing::get;
use axum::Router;

use crate::handlers::wikiprojects;
use crate::state::AppState;

/// WikiProject routes.
///
/// ```text
/// GET /wikiprojects   -> list_wiki_projects
/// ```
pub fn router() -> Router<AppState> {
    Router::new().route("/wikiprojects", get(wikiprojects::list_wiki_projects))
}

//! Route definitions for event grant associations.

use axum::routing::get;
use axum::Router;

use crate::handlers::grants;
use crate::state::AppState;

/// Grant association routes.
///
/// ```text
/// GET    /events/{event_id}/grant-id   -> get_grant_id
/// PUT    /events/{event_id}/grant-id   -> set_grant_id
/// DELETE /events/{event_id}/grant-id   -> delete_grant_id
/// ```
pub fn router() -> Router<AppState> {
    Router::new().route(
        "/events/{event_id}/grant-id",
        get(grants::get_grant_id)
            .put(grants::set_grant_id)
            .delete(grants::delete_grant_id),
    )
}

//! Handlers for the event↔grant association endpoints.
//!
//! Mutations are authorized through the [`PermissionChecker`] seam and
//! validated against the upstream grants system before anything is
//! stored.

use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::Json;
use serde::{Deserialize, Serialize};

use eventgrants_core::grant::GrantId;
use eventgrants_core::types::EventId;

use crate::error::{AppError, AppResult};
use crate::permission::{bearer_token, PermissionChecker};
use crate::response::DataResponse;
use crate::state::AppState;

/// Response payload for `GET /events/{event_id}/grant-id`.
#[derive(Debug, Serialize)]
pub struct GrantIdData {
    pub grant_id: String,
}

/// Request body for `PUT /events/{event_id}/grant-id`.
#[derive(Debug, Deserialize)]
pub struct SetGrantIdBody {
    pub grant_id: String,
}

/// GET /events/{event_id}/grant-id -- the grant associated with an
/// event.
pub async fn get_grant_id(
    State(state): State<AppState>,
    Path(event_id): Path<EventId>,
) -> AppResult<Json<DataResponse<GrantIdData>>> {
    let grant = state
        .grants
        .find(event_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("No grant associated with event {event_id}")))?;

    Ok(Json(DataResponse {
        data: GrantIdData {
            grant_id: grant.grant_id,
        },
    }))
}

/// PUT /events/{event_id}/grant-id -- associate a grant with an event.
///
/// The ID is format-checked locally, then validated upstream; the
/// agreement timestamp returned by the upstream lookup is stored
/// alongside the association. Submitting the already-stored ID skips
/// the upstream round trip.
pub async fn set_grant_id(
    State(state): State<AppState>,
    Path(event_id): Path<EventId>,
    headers: HeaderMap,
    Json(body): Json<SetGrantIdBody>,
) -> AppResult<StatusCode> {
    check_permission(&state, &headers)?;

    if body.grant_id.is_empty() {
        return Err(AppError::BadRequest("Grant ID cannot be empty".into()));
    }
    let grant_id = GrantId::parse(&body.grant_id)?;

    let stored = state.grants.find(event_id).await?;
    if stored.is_some_and(|g| g.grant_id == body.grant_id) {
        return Ok(StatusCode::NO_CONTENT);
    }

    let agreement_at = state.grant_lookup.agreement_at(&grant_id).await?;
    state
        .grants
        .upsert(event_id, grant_id.as_str(), agreement_at)
        .await?;

    tracing::info!(event_id, grant_id = %grant_id, "Grant association updated");
    Ok(StatusCode::NO_CONTENT)
}

/// DELETE /events/{event_id}/grant-id -- remove an event's grant
/// association. Idempotent.
pub async fn delete_grant_id(
    State(state): State<AppState>,
    Path(event_id): Path<EventId>,
    headers: HeaderMap,
) -> AppResult<StatusCode> {
    check_permission(&state, &headers)?;

    let deleted = state.grants.delete(event_id).await?;
    if deleted > 0 {
        tracing::info!(event_id, "Grant association removed");
    }
    Ok(StatusCode::NO_CONTENT)
}

fn check_permission(state: &AppState, headers: &HeaderMap) -> Result<(), AppError> {
    if state.permissions.can_manage_grants(bearer_token(headers)) {
        Ok(())
    } else {
        Err(AppError::Forbidden(
            "Not authorized to manage grant associations".into(),
        ))
    }
}

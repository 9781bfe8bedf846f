use crate::core::error::ApiError;
use crate::core::state::AppState;
use crate::models::log::LogAction;
use crate::models::requests::{ActorQuery, EventCreateRequest, EventPatchRequest};
use crate::utils::auth::require_admin;
use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection, QueryRejection},
        Path, Query, State,
    },
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use std::sync::Arc;
use tracing::info;

/// GET /api/events
pub async fn list_events_handler(State(state): State<Arc<AppState>>) -> Response {
    (StatusCode::OK, Json(state.ledger.events.list())).into_response()
}

/// GET /api/events/{id}
pub async fn get_event_handler(
    State(state): State<Arc<AppState>>,
    path: Result<Path<u32>, PathRejection>,
) -> Result<Response, ApiError> {
    let Path(id) = path?;
    let event = state
        .ledger
        .events
        .get(id)
        .ok_or_else(|| ApiError::NotFound("Event not found".to_string()))?;

    Ok((StatusCode::OK, Json(event)).into_response())
}

/// POST /api/events?userId=<admin> {title, description, date}
pub async fn create_event_handler(
    State(state): State<Arc<AppState>>,
    query: Result<Query<ActorQuery>, QueryRejection>,
    payload: Result<Json<EventCreateRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Query(actor) = query?;
    let admin = require_admin(&state.ledger, actor.user_id)?;
    let Json(request) = payload?;
    let request = request.validate()?;

    let event = state
        .ledger
        .create_event(&request.title, &request.description, &request.date)?;

    state.ledger.record_audit(
        &admin.name,
        LogAction::Add,
        format!("Added new event: {}", event.title),
    );

    info!(event_id = event.id, title = %event.title, "Event created");

    Ok((StatusCode::CREATED, Json(event)).into_response())
}

/// Partial update; absent fields are left alone
///
/// PATCH /api/events/{id}?userId=<admin>
pub async fn update_event_handler(
    State(state): State<Arc<AppState>>,
    path: Result<Path<u32>, PathRejection>,
    query: Result<Query<ActorQuery>, QueryRejection>,
    payload: Result<Json<EventPatchRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Path(id) = path?;
    let Query(actor) = query?;
    let admin = require_admin(&state.ledger, actor.user_id)?;
    let Json(request) = payload?;
    let patch = request.validate()?;

    let event = state.ledger.update_event(id, patch)?;

    state.ledger.record_audit(
        &admin.name,
        LogAction::Update,
        format!("Updated event: {}", event.title),
    );

    info!(event_id = event.id, "Event updated");

    Ok((StatusCode::OK, Json(event)).into_response())
}

/// Removes the event along with every registration for it
///
/// DELETE /api/events/{id}?userId=<admin>
pub async fn delete_event_handler(
    State(state): State<Arc<AppState>>,
    path: Result<Path<u32>, PathRejection>,
    query: Result<Query<ActorQuery>, QueryRejection>,
) -> Result<Response, ApiError> {
    let Path(id) = path?;
    let Query(actor) = query?;
    let admin = require_admin(&state.ledger, actor.user_id)?;

    let event = state.ledger.delete_event(id)?;

    state.ledger.record_audit(
        &admin.name,
        LogAction::Remove,
        format!("Removed event: {}", event.title),
    );

    info!(event_id = id, admin_id = admin.id, "Event removed");

    Ok(StatusCode::NO_CONTENT.into_response())
}

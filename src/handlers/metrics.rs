// Metrics endpoint

use crate::core::error::ApiError;
use crate::core::state::AppState;
use crate::models::requests::ActorQuery;
use crate::utils::auth::require_admin;
use axum::{
    extract::{rejection::QueryRejection, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use std::sync::Arc;

/// Returns JSON with the activity counters and table sizes:
/// - registrations and logins
/// - votes cast, withdrawn and rejected
/// - payment updates
/// - users, events, active registrations, log entries
/// - uptime
///
/// Requires an admin `userId`.
pub async fn metrics_handler(
    State(state): State<Arc<AppState>>,
    query: Result<Query<ActorQuery>, QueryRejection>,
) -> Result<Response, ApiError> {
    let Query(actor) = query?;
    require_admin(&state.ledger, actor.user_id)?;

    let snapshot = state.metrics.get_snapshot(&state.ledger);

    Ok((StatusCode::OK, Json(snapshot)).into_response())
}

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

/// Audit log, newest first
///
/// GET /api/logs?userId=<admin>
pub async fn logs_handler(
    State(state): State<Arc<AppState>>,
    query: Result<Query<ActorQuery>, QueryRejection>,
) -> Result<Response, ApiError> {
    let Query(actor) = query?;
    require_admin(&state.ledger, actor.user_id)?;

    Ok((StatusCode::OK, Json(state.ledger.logs.list())).into_response())
}

use crate::core::error::ApiError;
use crate::core::state::AppState;
use crate::models::requests::{ActorQuery, PaymentStatusRequest, SuccessResponse};
use crate::utils::auth::require_admin;
use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Query, State,
    },
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use std::sync::Arc;
use tracing::info;

/// Mark a registration as paid or unpaid.
///
/// The ledger records the matching `Payment Made` / `Payment Cancelled` log
/// entry itself, so nothing is appended here.
///
/// POST /api/payment/status?userId=<admin> {userId, eventId, paid}
pub async fn payment_status_handler(
    State(state): State<Arc<AppState>>,
    query: Result<Query<ActorQuery>, QueryRejection>,
    payload: Result<Json<PaymentStatusRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(request) = payload?;
    let request = request.validate()?;
    let Query(actor) = query?;
    let admin = require_admin(&state.ledger, actor.user_id)?;

    let entry = state
        .ledger
        .update_payment_status(request.user_id, request.event_id, request.paid)?;
    state.metrics.increment_payment_updates();

    info!(
        user_id = request.user_id,
        event_id = request.event_id,
        paid = request.paid,
        admin_id = admin.id,
        log_id = entry.id,
        "Payment status updated"
    );

    let status = if request.paid { "paid" } else { "unpaid" };

    Ok((
        StatusCode::OK,
        Json(SuccessResponse {
            success: true,
            message: format!("Payment status updated to {}", status),
        }),
    )
        .into_response())
}

// HTTP routes configuration

use crate::core::state::AppState;
use crate::handlers::{events, fallback, health, logs, metrics, payment, users, votes};
use axum::{
    routing::{delete, get, post},
    Router,
};
use std::sync::Arc;

pub fn build_router(state: Arc<AppState>) -> Router {
    let api = Router::new()
        // Members
        .route("/users", get(users::list_users_handler).post(users::register_handler))
        .route("/users/{id}", delete(users::delete_user_handler))
        .route("/users/{id}/badges", get(users::user_badges_handler))
        .route("/login", post(users::login_handler))

        // Events (writes require an admin userId)
        .route("/events", get(events::list_events_handler).post(events::create_event_handler))
        .route(
            "/events/{id}",
            get(events::get_event_handler)
                .patch(events::update_event_handler)
                .delete(events::delete_event_handler),
        )

        // Sign-ups
        .route("/vote", post(votes::vote_handler))
        .route("/unvote", post(votes::unvote_handler))
        .route("/votes", get(votes::all_votes_handler))
        .route("/votes/event/{id}", get(votes::event_votes_handler))
        .route("/votes/user/{id}", get(votes::user_votes_handler))

        // Admin bookkeeping
        .route("/logs", get(logs::logs_handler))
        .route("/payment/status", post(payment::payment_status_handler))
        .route("/user/balance", post(users::balance_handler));

    Router::new()
        .nest("/api", api)
        .route("/health", get(health::health_handler))
        .route("/metrics", get(metrics::metrics_handler))

        // 404 fallback for all unmatched routes
        .fallback(fallback::fallback_handler)

        .with_state(state)
}

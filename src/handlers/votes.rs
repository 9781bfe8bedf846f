use crate::core::error::{ApiError, StoreError};
use crate::core::state::AppState;
use crate::models::log::LogAction;
use crate::models::requests::{ActorQuery, UnvoteRequest, VoteRequest};
use crate::utils::auth::{require_admin, require_user};
use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection, QueryRejection},
        Path, Query, State,
    },
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use std::sync::Arc;
use tracing::{info, warn};

fn signup_details(title: &str, additional_players: u32) -> String {
    match additional_players {
        0 => format!("Signed up for {}", title),
        1 => format!("Signed up for {} with 1 additional player", title),
        n => format!("Signed up for {} with {} additional players", title, n),
    }
}

fn event_title(state: &AppState, event_id: u32) -> String {
    state
        .ledger
        .events
        .get(event_id)
        .map(|event| event.title)
        .unwrap_or_else(|| format!("event #{}", event_id))
}

/// Sign a user up for an event, optionally bringing guests
///
/// POST /api/vote {userId, eventId, additionalPlayers?}
pub async fn vote_handler(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<VoteRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(request) = payload?;
    let vote = request.validate(state.config.voting.max_additional_players)?;

    let user = match state
        .ledger
        .add_vote(vote.user_id, vote.event_id, vote.additional_players)
    {
        Ok(user) => user,
        Err(err) => {
            if matches!(err, StoreError::AlreadyVoted) {
                state.metrics.increment_rejected_votes();
            }
            warn!(user_id = vote.user_id, event_id = vote.event_id, error = %err, "Vote rejected");
            return Err(err.into());
        }
    };

    let title = event_title(&state, vote.event_id);
    state.ledger.record_audit(
        &user.name,
        LogAction::Vote,
        signup_details(&title, vote.additional_players),
    );
    state.metrics.increment_votes_cast();

    info!(
        user_id = user.id,
        event_id = vote.event_id,
        additional_players = vote.additional_players,
        participation_count = user.participation_count,
        "Vote recorded"
    );

    Ok((StatusCode::OK, Json(user)).into_response())
}

/// POST /api/unvote {userId, eventId}
pub async fn unvote_handler(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<UnvoteRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(request) = payload?;
    let unvote = request.validate()?;

    let user = match state.ledger.remove_vote(unvote.user_id, unvote.event_id) {
        Ok(user) => user,
        Err(err) => {
            if matches!(err, StoreError::NotVoted) {
                state.metrics.increment_rejected_votes();
            }
            warn!(user_id = unvote.user_id, event_id = unvote.event_id, error = %err, "Unvote rejected");
            return Err(err.into());
        }
    };

    let title = event_title(&state, unvote.event_id);
    state.ledger.record_audit(
        &user.name,
        LogAction::Unvote,
        format!("Cancelled signup for {}", title),
    );
    state.metrics.increment_votes_withdrawn();

    info!(user_id = user.id, event_id = unvote.event_id, "Vote withdrawn");

    Ok((StatusCode::OK, Json(user)).into_response())
}

/// GET /api/votes?userId=<admin>
pub async fn all_votes_handler(
    State(state): State<Arc<AppState>>,
    query: Result<Query<ActorQuery>, QueryRejection>,
) -> Result<Response, ApiError> {
    let Query(actor) = query?;
    require_admin(&state.ledger, actor.user_id)?;

    Ok((StatusCode::OK, Json(state.ledger.vote_details())).into_response())
}

/// Any known user may see who signed up for an event
///
/// GET /api/votes/event/{id}?userId=<user>
pub async fn event_votes_handler(
    State(state): State<Arc<AppState>>,
    path: Result<Path<u32>, PathRejection>,
    query: Result<Query<ActorQuery>, QueryRejection>,
) -> Result<Response, ApiError> {
    let Path(event_id) = path?;
    let Query(actor) = query?;
    require_user(&state.ledger, actor.user_id)?;

    Ok((
        StatusCode::OK,
        Json(state.ledger.vote_details_for_event(event_id)),
    )
        .into_response())
}

/// GET /api/votes/user/{id}?userId=<admin>
pub async fn user_votes_handler(
    State(state): State<Arc<AppState>>,
    path: Result<Path<u32>, PathRejection>,
    query: Result<Query<ActorQuery>, QueryRejection>,
) -> Result<Response, ApiError> {
    let Path(user_id) = path?;
    let Query(actor) = query?;
    require_admin(&state.ledger, actor.user_id)?;

    Ok((
        StatusCode::OK,
        Json(state.ledger.vote_details_for_user(user_id)),
    )
        .into_response())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::state::test_state;
    use crate::models::registration::VoteDetail;
    use crate::models::user::User;
    use axum::body::Body;
    use http_body_util::BodyExt;
    use std::sync::atomic::Ordering;

    async fn body_bytes(response: Response) -> axum::body::Bytes {
        Body::new(response.into_body()).collect().await.unwrap().to_bytes()
    }

    fn vote(user_id: u32, event_id: u32, extra: Option<i64>) -> Result<Json<VoteRequest>, JsonRejection> {
        Ok(Json(VoteRequest {
            user_id: Some(user_id),
            event_id: Some(event_id),
            additional_players: extra,
        }))
    }

    fn unvote(user_id: u32, event_id: u32) -> Result<Json<UnvoteRequest>, JsonRejection> {
        Ok(Json(UnvoteRequest {
            user_id: Some(user_id),
            event_id: Some(event_id),
        }))
    }

    fn actor(user_id: Option<u32>) -> Result<Query<ActorQuery>, QueryRejection> {
        Ok(Query(ActorQuery { user_id }))
    }

    #[test]
    fn test_signup_details() {
        assert_eq!(signup_details("Monday", 0), "Signed up for Monday");
        assert_eq!(
            signup_details("Monday", 1),
            "Signed up for Monday with 1 additional player"
        );
        assert_eq!(
            signup_details("Monday", 3),
            "Signed up for Monday with 3 additional players"
        );
    }

    #[tokio::test]
    async fn test_vote_returns_updated_user() {
        let (state, _dir) = test_state();
        let user = state.ledger.create_user("Kim", "eventpass", false).unwrap();
        let event = state.ledger.create_event("Monday", "Weekly", "Monday").unwrap();

        let response = vote_handler(State(state.clone()), vote(user.id, event.id, Some(2)))
            .await
            .unwrap();
        let updated: User = serde_json::from_slice(&body_bytes(response).await).unwrap();

        assert_eq!(updated.votes, vec![event.id]);
        assert_eq!(updated.participation_count, 1);
        assert_eq!(updated.badges, vec!["rookie".to_string()]);
        assert_eq!(state.ledger.events.get(event.id).unwrap().votes, 3);

        let log = &state.ledger.logs.list()[0];
        assert_eq!(log.user, "Kim");
        assert_eq!(log.action, LogAction::Vote);
        assert_eq!(log.details, "Signed up for Monday with 2 additional players");
        assert_eq!(state.metrics.votes_cast.load(Ordering::Relaxed), 1);
    }

    #[tokio::test]
    async fn test_duplicate_vote_is_rejected() {
        let (state, _dir) = test_state();
        let user = state.ledger.create_user("Kim", "eventpass", false).unwrap();
        let event = state.ledger.create_event("Monday", "Weekly", "Monday").unwrap();
        vote_handler(State(state.clone()), vote(user.id, event.id, None))
            .await
            .unwrap();

        let err = vote_handler(State(state.clone()), vote(user.id, event.id, None))
            .await
            .unwrap_err();

        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        assert_eq!(err.to_string(), "User already voted for this event");
        assert_eq!(state.ledger.events.get(event.id).unwrap().votes, 1);
        assert_eq!(state.ledger.logs.len(), 1);
        assert_eq!(state.metrics.rejected_votes.load(Ordering::Relaxed), 1);
    }

    #[tokio::test]
    async fn test_vote_additional_players_over_limit() {
        let (state, _dir) = test_state();
        let user = state.ledger.create_user("Kim", "eventpass", false).unwrap();
        let event = state.ledger.create_event("Monday", "Weekly", "Monday").unwrap();

        // test_config caps guests at 5
        let err = vote_handler(State(state.clone()), vote(user.id, event.id, Some(6)))
            .await
            .unwrap_err();

        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        assert!(state.ledger.registrations.is_empty());
    }

    #[tokio::test]
    async fn test_vote_unknown_event() {
        let (state, _dir) = test_state();
        let user = state.ledger.create_user("Kim", "eventpass", false).unwrap();

        let err = vote_handler(State(state), vote(user.id, 42, None)).await.unwrap_err();

        assert_eq!(err.status(), StatusCode::NOT_FOUND);
        assert_eq!(err.to_string(), "Event not found");
    }

    #[tokio::test]
    async fn test_unvote_keeps_participation() {
        let (state, _dir) = test_state();
        let user = state.ledger.create_user("Kim", "eventpass", false).unwrap();
        let event = state.ledger.create_event("Monday", "Weekly", "Monday").unwrap();
        vote_handler(State(state.clone()), vote(user.id, event.id, Some(1)))
            .await
            .unwrap();

        let response = unvote_handler(State(state.clone()), unvote(user.id, event.id))
            .await
            .unwrap();
        let updated: User = serde_json::from_slice(&body_bytes(response).await).unwrap();

        assert!(updated.votes.is_empty());
        assert_eq!(updated.participation_count, 1);
        assert_eq!(updated.badges, vec!["rookie".to_string()]);
        assert_eq!(state.ledger.events.get(event.id).unwrap().votes, 0);
        assert_eq!(state.ledger.logs.list()[0].details, "Cancelled signup for Monday");
    }

    #[tokio::test]
    async fn test_unvote_without_vote() {
        let (state, _dir) = test_state();
        let user = state.ledger.create_user("Kim", "eventpass", false).unwrap();
        let event = state.ledger.create_event("Monday", "Weekly", "Monday").unwrap();

        let err = unvote_handler(State(state), unvote(user.id, event.id))
            .await
            .unwrap_err();

        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        assert_eq!(err.to_string(), "User has not voted for this event");
    }

    #[tokio::test]
    async fn test_vote_detail_routes_authorization() {
        let (state, _dir) = test_state();
        let admin = state.ledger.create_user("Boss", "eventpass", true).unwrap();
        let member = state.ledger.create_user("Kim", "eventpass", false).unwrap();
        let event = state.ledger.create_event("Monday", "Weekly", "Monday").unwrap();
        state.ledger.add_vote(member.id, event.id, 1).unwrap();

        let err = all_votes_handler(State(state.clone()), actor(None)).await.unwrap_err();
        assert_eq!(err.status(), StatusCode::UNAUTHORIZED);

        let err = all_votes_handler(State(state.clone()), actor(Some(member.id)))
            .await
            .unwrap_err();
        assert_eq!(err.status(), StatusCode::FORBIDDEN);

        let err = event_votes_handler(State(state.clone()), Ok(Path(event.id)), actor(None))
            .await
            .unwrap_err();
        assert_eq!(err.status(), StatusCode::UNAUTHORIZED);

        let err = event_votes_handler(State(state.clone()), Ok(Path(event.id)), actor(Some(99)))
            .await
            .unwrap_err();
        assert_eq!(err.status(), StatusCode::NOT_FOUND);

        let response = event_votes_handler(State(state.clone()), Ok(Path(event.id)), actor(Some(member.id)))
            .await
            .unwrap();
        let details: Vec<VoteDetail> = serde_json::from_slice(&body_bytes(response).await).unwrap();
        assert_eq!(details.len(), 1);
        assert_eq!(details[0].user_name, "Kim");
        assert_eq!(details[0].event_title, "Monday");
        assert_eq!(details[0].additional_players, 1);
        assert!(!details[0].paid);

        let response = user_votes_handler(State(state.clone()), Ok(Path(member.id)), actor(Some(admin.id)))
            .await
            .unwrap();
        let details: Vec<VoteDetail> = serde_json::from_slice(&body_bytes(response).await).unwrap();
        assert_eq!(details.len(), 1);

        let response = all_votes_handler(State(state), actor(Some(admin.id))).await.unwrap();
        let details: Vec<VoteDetail> = serde_json::from_slice(&body_bytes(response).await).unwrap();
        assert_eq!(details.len(), 1);
    }
}

use crate::badges::rules::BadgeProgress;
use crate::core::error::ApiError;
use crate::core::state::AppState;
use crate::models::log::LogAction;
use crate::models::requests::{
    ActorQuery, BalanceRequest, BalanceResponse, LoginRequest, RegisterRequest,
};
use crate::utils::auth::{require_admin, verify_password};
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

/// GET /api/users
pub async fn list_users_handler(State(state): State<Arc<AppState>>) -> Response {
    (StatusCode::OK, Json(state.ledger.users.list())).into_response()
}

/// Register a new member with the shared event password
///
/// POST /api/users {name, password, isAdmin?}
pub async fn register_handler(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(request) = payload?;
    let request = request.validate()?;

    if !verify_password(&request.password, &state.config.auth.shared_password) {
        warn!(name = %request.name, "Registration with wrong password");
        return Err(ApiError::InvalidParameter("Invalid password".to_string()));
    }

    let is_admin = request.is_admin && state.config.auth.allow_admin_signup;
    let user = state
        .ledger
        .create_user(&request.name, &request.password, is_admin)?;

    state
        .ledger
        .record_audit(&user.name, LogAction::Register, "New user registered");
    state.metrics.increment_registrations();

    info!(user_id = user.id, name = %user.name, is_admin, "User registered");

    Ok((StatusCode::CREATED, Json(user)).into_response())
}

/// POST /api/login {name, password}
pub async fn login_handler(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(request) = payload?;
    let request = request.validate()?;

    if !verify_password(&request.password, &state.config.auth.shared_password) {
        warn!(name = %request.name, "Login with wrong password");
        return Err(ApiError::InvalidParameter("Invalid password".to_string()));
    }

    let user = state
        .ledger
        .users
        .get_by_name(&request.name)
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    state
        .ledger
        .record_audit(&user.name, LogAction::Login, "User logged in");
    state.metrics.increment_logins();

    info!(user_id = user.id, "User logged in");

    Ok((StatusCode::OK, Json(user)).into_response())
}

/// DELETE /api/users/{id}?userId=<admin>
pub async fn delete_user_handler(
    State(state): State<Arc<AppState>>,
    path: Result<Path<u32>, PathRejection>,
    query: Result<Query<ActorQuery>, QueryRejection>,
) -> Result<Response, ApiError> {
    let Path(id) = path?;
    let Query(actor) = query?;
    let admin = require_admin(&state.ledger, actor.user_id)?;

    let removed = state.ledger.delete_user(id)?;

    state.ledger.record_audit(
        &admin.name,
        LogAction::Remove,
        format!("Removed user: {}", removed.name),
    );

    info!(user_id = id, admin_id = admin.id, "User removed");

    Ok(StatusCode::NO_CONTENT.into_response())
}

/// Earned badges, next badge and progress towards it
///
/// GET /api/users/{id}/badges
pub async fn user_badges_handler(
    State(state): State<Arc<AppState>>,
    path: Result<Path<u32>, PathRejection>,
) -> Result<Response, ApiError> {
    let Path(id) = path?;
    let user = state
        .ledger
        .users
        .get(id)
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    Ok((
        StatusCode::OK,
        Json(BadgeProgress::for_count(user.participation_count)),
    )
        .into_response())
}

/// POST /api/user/balance?userId=<admin> {userId, balance}
pub async fn balance_handler(
    State(state): State<Arc<AppState>>,
    query: Result<Query<ActorQuery>, QueryRejection>,
    payload: Result<Json<BalanceRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(request) = payload?;
    let request = request.validate()?;
    let Query(actor) = query?;
    let admin = require_admin(&state.ledger, actor.user_id)?;

    let user = state.ledger.set_balance(request.user_id, request.balance)?;

    state.ledger.record_audit(
        &admin.name,
        LogAction::Update,
        format!("Updated {}'s balance to {} points", user.name, user.balance),
    );

    info!(user_id = user.id, balance = user.balance, "Balance updated");

    Ok((
        StatusCode::OK,
        Json(BalanceResponse {
            success: true,
            message: "Balance updated successfully".to_string(),
            user,
        }),
    )
        .into_response())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::state::test_state;
    use crate::models::user::User;
    use axum::body::Body;
    use http_body_util::BodyExt;

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = Body::new(response.into_body()).collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn register(name: &str, password: &str, is_admin: bool) -> Json<RegisterRequest> {
        Json(RegisterRequest {
            name: Some(name.to_string()),
            password: Some(password.to_string()),
            is_admin,
        })
    }

    fn actor(user_id: Option<u32>) -> Result<Query<ActorQuery>, QueryRejection> {
        Ok(Query(ActorQuery { user_id }))
    }

    #[tokio::test]
    async fn test_register_creates_user_and_logs() {
        let (state, _dir) = test_state();

        let response = register_handler(State(state.clone()), Ok(register("Alice", "eventpass", false)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);

        let body = body_json(response).await;
        assert_eq!(body["name"], "Alice");
        assert_eq!(body["participationCount"], 0);
        assert!(body.get("password").is_none());

        let logs = state.ledger.logs.list();
        assert_eq!(logs.len(), 1);
        assert_eq!(logs[0].action, LogAction::Register);
        assert_eq!(logs[0].details, "New user registered");
    }

    #[tokio::test]
    async fn test_register_wrong_password() {
        let (state, _dir) = test_state();

        let err = register_handler(State(state.clone()), Ok(register("Alice", "nope", false)))
            .await
            .unwrap_err();

        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        assert_eq!(err.to_string(), "Invalid password");
        assert!(state.ledger.users.is_empty());
    }

    #[tokio::test]
    async fn test_register_duplicate_name_ignores_case() {
        let (state, _dir) = test_state();
        register_handler(State(state.clone()), Ok(register("Alice", "eventpass", false)))
            .await
            .unwrap();

        let err = register_handler(State(state.clone()), Ok(register("ALICE", "eventpass", false)))
            .await
            .unwrap_err();

        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        assert_eq!(err.to_string(), "User already exists");
        assert_eq!(state.ledger.users.len(), 1);
    }

    #[tokio::test]
    async fn test_login() {
        let (state, _dir) = test_state();
        state.ledger.create_user("Alice", "eventpass", false).unwrap();

        let request = LoginRequest {
            name: Some("alice".to_string()),
            password: Some("eventpass".to_string()),
        };
        let response = login_handler(State(state.clone()), Ok(Json(request))).await.unwrap();
        let user: User = serde_json::from_value(body_json(response).await).unwrap();

        assert_eq!(user.name, "Alice");
        assert_eq!(state.ledger.logs.list()[0].action, LogAction::Login);
    }

    #[tokio::test]
    async fn test_login_unknown_user() {
        let (state, _dir) = test_state();

        let request = LoginRequest {
            name: Some("Ghost".to_string()),
            password: Some("eventpass".to_string()),
        };
        let err = login_handler(State(state), Ok(Json(request))).await.unwrap_err();

        assert_eq!(err.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_delete_user_requires_admin() {
        let (state, _dir) = test_state();
        let member = state.ledger.create_user("Kim", "eventpass", false).unwrap();

        let err = delete_user_handler(State(state.clone()), Ok(Path(member.id)), actor(None))
            .await
            .unwrap_err();
        assert_eq!(err.status(), StatusCode::UNAUTHORIZED);

        let err = delete_user_handler(State(state.clone()), Ok(Path(member.id)), actor(Some(member.id)))
            .await
            .unwrap_err();
        assert_eq!(err.status(), StatusCode::FORBIDDEN);
        assert_eq!(state.ledger.users.len(), 1);
    }

    #[tokio::test]
    async fn test_delete_user() {
        let (state, _dir) = test_state();
        let admin = state.ledger.create_user("Boss", "eventpass", true).unwrap();
        let member = state.ledger.create_user("Kim", "eventpass", false).unwrap();

        let response = delete_user_handler(State(state.clone()), Ok(Path(member.id)), actor(Some(admin.id)))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NO_CONTENT);
        assert!(state.ledger.users.get(member.id).is_none());
        assert_eq!(state.ledger.logs.list()[0].details, "Removed user: Kim");

        let err = delete_user_handler(State(state), Ok(Path(member.id)), actor(Some(admin.id)))
            .await
            .unwrap_err();
        assert_eq!(err.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_user_badges() {
        let (state, _dir) = test_state();
        let user = state.ledger.create_user("Kim", "eventpass", false).unwrap();
        let event = state.ledger.create_event("Monday", "Weekly", "Monday").unwrap();
        state.ledger.add_vote(user.id, event.id, 0).unwrap();

        let response = user_badges_handler(State(state.clone()), Ok(Path(user.id))).await.unwrap();
        let body = body_json(response).await;

        assert_eq!(body["participationCount"], 1);
        assert_eq!(body["earned"][0]["id"], "rookie");
        assert_eq!(body["next"]["id"], "regular");
        assert_eq!(body["progress"], 0.0);

        let err = user_badges_handler(State(state), Ok(Path(77))).await.unwrap_err();
        assert_eq!(err.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_balance_update() {
        let (state, _dir) = test_state();
        let admin = state.ledger.create_user("Boss", "eventpass", true).unwrap();
        let member = state.ledger.create_user("Kim", "eventpass", false).unwrap();

        let request = BalanceRequest {
            user_id: Some(member.id),
            balance: Some(-15),
        };
        let response = balance_handler(State(state.clone()), actor(Some(admin.id)), Ok(Json(request)))
            .await
            .unwrap();
        let body: BalanceResponse = serde_json::from_value(body_json(response).await).unwrap();

        assert!(body.success);
        assert_eq!(body.user.balance, -15);
        assert_eq!(state.ledger.users.get(member.id).unwrap().balance, -15);

        let log = &state.ledger.logs.list()[0];
        assert_eq!(log.user, "Boss");
        assert_eq!(log.action, LogAction::Update);
        assert_eq!(log.details, "Updated Kim's balance to -15 points");
    }

    #[tokio::test]
    async fn test_balance_missing_fields() {
        let (state, _dir) = test_state();
        let admin = state.ledger.create_user("Boss", "eventpass", true).unwrap();

        let request = BalanceRequest {
            user_id: Some(admin.id),
            balance: None,
        };
        let err = balance_handler(State(state), actor(Some(admin.id)), Ok(Json(request)))
            .await
            .unwrap_err();

        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        assert_eq!(err.to_string(), "UserId and balance are required");
    }
}

// Centralized error handling for the sign-up board

use axum::{
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use thiserror::Error;
use tracing::error;

/// Errors raised by the store and the vote ledger
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("User not found")]
    UserNotFound,

    #[error("Event not found")]
    EventNotFound,

    #[error("Registration not found")]
    RegistrationNotFound,

    #[error("User already exists")]
    DuplicateName,

    #[error("User already voted for this event")]
    AlreadyVoted,

    #[error("User has not voted for this event")]
    NotVoted,

    #[error("Too many additional players: {0}")]
    TooManyPlayers(u32),

    #[error("No IDs left to allocate")]
    IdsExhausted,

    #[error("Ledger lock poisoned")]
    LockPoisoned,

    #[error("Failed to write to WAL: {0}")]
    Wal(#[from] anyhow::Error),
}

#[derive(Error, Debug, PartialEq)]
pub enum ValidationError {
    #[error("Missing required parameter: {0}")]
    MissingParameter(String),

    /// Several fields are required together; the message names them
    #[error("{0}")]
    MissingFields(&'static str),

    #[error("Invalid parameter format: {0}")]
    InvalidFormat(String),

    #[error("Parameter out of range: {0}")]
    OutOfRange(String),
}

/// Errors returned to HTTP clients
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("{0}")]
    InvalidParameter(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error("Internal server error: {0}")]
    InternalError(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::InvalidParameter(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            // Duplicate votes and usernames are reported as plain bad requests
            ApiError::Conflict(_) => StatusCode::BAD_REQUEST,
            ApiError::InternalError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        use crate::models::requests::ErrorResponse;

        let status = self.status();
        let message = match &self {
            ApiError::InternalError(cause) => {
                error!(error = %cause, "Request failed with internal error");
                "Internal server error".to_string()
            }
            other => other.to_string(),
        };

        (
            status,
            Json(ErrorResponse {
                success: false,
                message,
            }),
        )
            .into_response()
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::UserNotFound
            | StoreError::EventNotFound
            | StoreError::RegistrationNotFound => ApiError::NotFound(err.to_string()),
            StoreError::DuplicateName | StoreError::AlreadyVoted | StoreError::NotVoted => {
                ApiError::Conflict(err.to_string())
            }
            StoreError::TooManyPlayers(_) => ApiError::InvalidParameter(err.to_string()),
            StoreError::IdsExhausted | StoreError::LockPoisoned | StoreError::Wal(_) => {
                ApiError::InternalError(err.to_string())
            }
        }
    }
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        ApiError::InvalidParameter(err.to_string())
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::InvalidParameter(format!("Invalid request body: {}", rejection.body_text()))
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::InvalidParameter(format!("Invalid query string: {}", rejection.body_text()))
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        ApiError::InvalidParameter(format!("Invalid path parameter: {}", rejection.body_text()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_errors_map_to_status_codes() {
        assert_eq!(ApiError::from(StoreError::UserNotFound).status(), StatusCode::NOT_FOUND);
        assert_eq!(ApiError::from(StoreError::EventNotFound).status(), StatusCode::NOT_FOUND);
        assert_eq!(
            ApiError::from(StoreError::RegistrationNotFound).status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(ApiError::from(StoreError::DuplicateName).status(), StatusCode::BAD_REQUEST);
        assert_eq!(ApiError::from(StoreError::AlreadyVoted).status(), StatusCode::BAD_REQUEST);
        assert_eq!(ApiError::from(StoreError::NotVoted).status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            ApiError::from(StoreError::TooManyPlayers(5000)).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::from(StoreError::LockPoisoned).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_validation_error_is_bad_request() {
        let err = ApiError::from(ValidationError::MissingParameter("userId".to_string()));
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        assert_eq!(err.to_string(), "Missing required parameter: userId");
    }

    #[tokio::test]
    async fn test_internal_error_hides_cause() {
        use axum::body::Body;
        use http_body_util::BodyExt;

        let response = ApiError::InternalError("disk on fire".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let bytes = Body::new(response.into_body()).collect().await.unwrap().to_bytes();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();

        assert_eq!(body["success"], false);
        assert_eq!(body["message"], "Internal server error");
    }
}

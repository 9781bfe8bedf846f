use crate::core::error::ApiError;
use axum::{http::Uri, response::{IntoResponse, Response}};
use tracing::debug;

pub async fn fallback_handler(uri: Uri) -> Response {
    debug!(path = %uri.path(), "No route matched");

    ApiError::NotFound(format!("Route not found: {}", uri.path())).into_response()
}

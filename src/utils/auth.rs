use crate::core::error::ApiError;
use crate::ledger::ledger::Ledger;
use crate::models::user::User;
use tracing::warn;

/// Compare a supplied password against the shared one in constant time
pub fn verify_password(provided: &str, expected: &str) -> bool {
    provided.len() == expected.len()
        && provided
            .as_bytes()
            .iter()
            .zip(expected.as_bytes().iter())
            .fold(0u8, |acc, (a, b)| acc | (a ^ b))
            == 0
}

/// Resolve `?userId` to an admin user.
///
/// Missing id is 401; an unknown or non-admin user is 403.
pub fn require_admin(ledger: &Ledger, actor_id: Option<u32>) -> Result<User, ApiError> {
    let Some(actor_id) = actor_id else {
        warn!("Admin route called without userId");
        return Err(ApiError::Unauthorized("Unauthorized - Admin ID required".to_string()));
    };

    match ledger.users.get(actor_id) {
        Some(user) if user.is_admin => Ok(user),
        _ => {
            warn!(actor_id, "Non-admin attempted admin action");
            Err(ApiError::Forbidden("Forbidden - Admin access required".to_string()))
        }
    }
}

/// Resolve `?userId` to any existing user. Missing id is 401, unknown is 404.
pub fn require_user(ledger: &Ledger, actor_id: Option<u32>) -> Result<User, ApiError> {
    let Some(actor_id) = actor_id else {
        return Err(ApiError::Unauthorized("Unauthorized - User ID required".to_string()));
    };

    ledger
        .users
        .get(actor_id)
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))
}

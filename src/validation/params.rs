use crate::core::error::ValidationError;
use crate::models::event::EventPatch;
use crate::models::requests::{
    BalanceRequest, EventCreateRequest, EventPatchRequest, LoginRequest, PaymentStatusRequest,
    RegisterRequest, UnvoteRequest, VoteRequest,
};

#[derive(Debug, PartialEq)]
pub struct ValidatedRegistration {
    pub name: String,
    pub password: String,
    pub is_admin: bool,
}

#[derive(Debug, PartialEq)]
pub struct ValidatedLogin {
    pub name: String,
    pub password: String,
}

#[derive(Debug, PartialEq)]
pub struct ValidatedVote {
    pub user_id: u32,
    pub event_id: u32,
    pub additional_players: u32,
}

#[derive(Debug, PartialEq)]
pub struct ValidatedUnvote {
    pub user_id: u32,
    pub event_id: u32,
}

#[derive(Debug, PartialEq)]
pub struct ValidatedEvent {
    pub title: String,
    pub description: String,
    pub date: String,
}

#[derive(Debug, PartialEq)]
pub struct ValidatedPaymentStatus {
    pub user_id: u32,
    pub event_id: u32,
    pub paid: bool,
}

#[derive(Debug, PartialEq)]
pub struct ValidatedBalance {
    pub user_id: u32,
    pub balance: i64,
}

/// Trimmed, non-empty text or `MissingParameter(field)`
fn required_text(value: Option<String>, field: &str) -> Result<String, ValidationError> {
    match value.map(|v| v.trim().to_string()) {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(ValidationError::MissingParameter(field.to_string())),
    }
}

/// Ids are positive; 0 counts as missing
fn positive_id(value: Option<u32>) -> Option<u32> {
    value.filter(|id| *id > 0)
}

impl RegisterRequest {
    pub fn validate(self) -> Result<ValidatedRegistration, ValidationError> {
        let name = required_text(self.name, "name")?;
        let password = self
            .password
            .filter(|p| !p.is_empty())
            .ok_or_else(|| ValidationError::MissingParameter("password".to_string()))?;

        Ok(ValidatedRegistration {
            name,
            password,
            is_admin: self.is_admin,
        })
    }
}

impl LoginRequest {
    pub fn validate(self) -> Result<ValidatedLogin, ValidationError> {
        const MESSAGE: &str = "Name and password are required";

        let name = self
            .name
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty())
            .ok_or(ValidationError::MissingFields(MESSAGE))?;
        let password = self
            .password
            .filter(|p| !p.is_empty())
            .ok_or(ValidationError::MissingFields(MESSAGE))?;

        Ok(ValidatedLogin { name, password })
    }
}

impl VoteRequest {
    /// `additional_players` defaults to 0 and must lie in `0..=max_additional_players`
    pub fn validate(self, max_additional_players: u32) -> Result<ValidatedVote, ValidationError> {
        let (Some(user_id), Some(event_id)) = (positive_id(self.user_id), positive_id(self.event_id))
        else {
            return Err(ValidationError::MissingFields("User ID and Event ID are required"));
        };

        let requested = self.additional_players.unwrap_or(0);
        let additional_players = u32::try_from(requested)
            .ok()
            .filter(|n| *n <= max_additional_players)
            .ok_or_else(|| {
                ValidationError::OutOfRange(format!(
                    "additionalPlayers must be between 0 and {}",
                    max_additional_players
                ))
            })?;

        Ok(ValidatedVote {
            user_id,
            event_id,
            additional_players,
        })
    }
}

impl UnvoteRequest {
    pub fn validate(self) -> Result<ValidatedUnvote, ValidationError> {
        match (positive_id(self.user_id), positive_id(self.event_id)) {
            (Some(user_id), Some(event_id)) => Ok(ValidatedUnvote { user_id, event_id }),
            _ => Err(ValidationError::MissingFields("User ID and Event ID are required")),
        }
    }
}

impl EventCreateRequest {
    pub fn validate(self) -> Result<ValidatedEvent, ValidationError> {
        Ok(ValidatedEvent {
            title: required_text(self.title, "title")?,
            description: required_text(self.description, "description")?,
            date: required_text(self.date, "date")?,
        })
    }
}

impl EventPatchRequest {
    /// Fields that are present must not be blank
    pub fn validate(self) -> Result<EventPatch, ValidationError> {
        let optional = |value: Option<String>, field: &str| -> Result<Option<String>, ValidationError> {
            value.map(|v| required_text(Some(v), field)).transpose()
        };

        Ok(EventPatch {
            title: optional(self.title, "title")?,
            description: optional(self.description, "description")?,
            date: optional(self.date, "date")?,
        })
    }
}

impl PaymentStatusRequest {
    pub fn validate(self) -> Result<ValidatedPaymentStatus, ValidationError> {
        match (positive_id(self.user_id), positive_id(self.event_id), self.paid) {
            (Some(user_id), Some(event_id), Some(paid)) => Ok(ValidatedPaymentStatus {
                user_id,
                event_id,
                paid,
            }),
            _ => Err(ValidationError::MissingFields(
                "UserId, eventId and paid status are required",
            )),
        }
    }
}

impl BalanceRequest {
    pub fn validate(self) -> Result<ValidatedBalance, ValidationError> {
        match (positive_id(self.user_id), self.balance) {
            (Some(user_id), Some(balance)) => Ok(ValidatedBalance { user_id, balance }),
            _ => Err(ValidationError::MissingFields("UserId and balance are required")),
        }
    }
}

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Upper bound on guests per sign-up, whatever the configured limit
pub const MAX_ADDITIONAL_PLAYERS: u32 = 1000;

/// A user's active sign-up for an event
#[derive(Clone, Debug, PartialEq)]
pub struct Registration {
    pub user_id: u32,
    pub event_id: u32,
    pub voted_at: DateTime<Utc>,
    pub additional_players: u32,
    pub paid: bool,
}

impl Registration {
    pub fn new(user_id: u32, event_id: u32, additional_players: u32, voted_at: DateTime<Utc>) -> Self {
        Self {
            user_id,
            event_id,
            voted_at,
            additional_players,
            paid: false,
        }
    }

    /// Seats this registration takes: the voter plus guests
    pub fn headcount(&self) -> u32 {
        self.additional_players.saturating_add(1)
    }
}

/// Registration joined with user and event names, as shown to admins
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoteDetail {
    pub event_id: u32,
    pub event_title: String,
    pub user_id: u32,
    pub user_name: String,
    pub voted_at: DateTime<Utc>,
    pub additional_players: u32,
    pub paid: bool,
}

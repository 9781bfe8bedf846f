use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum LogAction {
    #[serde(rename = "REGISTER")]
    Register,
    #[serde(rename = "LOGIN")]
    Login,
    #[serde(rename = "VOTE")]
    Vote,
    #[serde(rename = "UNVOTE")]
    Unvote,
    #[serde(rename = "ADD")]
    Add,
    #[serde(rename = "REMOVE")]
    Remove,
    #[serde(rename = "UPDATE")]
    Update,
    #[serde(rename = "Payment Made")]
    PaymentMade,
    #[serde(rename = "Payment Cancelled")]
    PaymentCancelled,
}

impl LogAction {
    pub const ALL: [LogAction; 9] = [
        LogAction::Register,
        LogAction::Login,
        LogAction::Vote,
        LogAction::Unvote,
        LogAction::Add,
        LogAction::Remove,
        LogAction::Update,
        LogAction::PaymentMade,
        LogAction::PaymentCancelled,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            LogAction::Register => "REGISTER",
            LogAction::Login => "LOGIN",
            LogAction::Vote => "VOTE",
            LogAction::Unvote => "UNVOTE",
            LogAction::Add => "ADD",
            LogAction::Remove => "REMOVE",
            LogAction::Update => "UPDATE",
            LogAction::PaymentMade => "Payment Made",
            LogAction::PaymentCancelled => "Payment Cancelled",
        }
    }

    pub fn for_payment(paid: bool) -> Self {
        if paid {
            LogAction::PaymentMade
        } else {
            LogAction::PaymentCancelled
        }
    }
}

impl fmt::Display for LogAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for LogAction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        LogAction::ALL
            .iter()
            .copied()
            .find(|action| action.as_str() == s)
            .ok_or_else(|| format!("Unknown log action: {}", s))
    }
}

/// Append-only audit record
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LogEntry {
    pub id: u64,
    pub timestamp: DateTime<Utc>,
    /// Name of the acting user
    pub user: String,
    pub action: LogAction,
    pub details: String,
}

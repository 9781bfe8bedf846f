use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// User ID
    pub id: u32,
    /// Display name, unique ignoring case
    pub name: String,
    /// Shared event password, stored in plaintext and never serialized
    #[serde(skip_serializing, default)]
    pub password: String,
    pub is_admin: bool,
    /// Event IDs the user is currently signed up for, in vote order
    pub votes: Vec<u32>,
    /// Lifetime count of votes cast, never decremented
    pub participation_count: u32,
    /// Earned badge IDs, only ever appended to
    pub badges: Vec<String>,
    /// Point balance, may go negative
    pub balance: i64,
    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn new(
        id: u32,
        name: String,
        password: String,
        is_admin: bool,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            name,
            password,
            is_admin,
            votes: Vec::new(),
            participation_count: 0,
            badges: Vec::new(),
            balance: 0,
            created_at,
        }
    }

    pub fn has_voted_for(&self, event_id: u32) -> bool {
        self.votes.contains(&event_id)
    }

    pub fn name_matches(&self, name: &str) -> bool {
        self.name.to_lowercase() == name.to_lowercase()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_password_is_not_serialized() {
        let user = User::new(1, "Alice".to_string(), "eventpass".to_string(), false, Utc::now());
        let json = serde_json::to_value(&user).unwrap();

        assert!(json.get("password").is_none());
        assert_eq!(json["name"], "Alice");
        assert_eq!(json["isAdmin"], false);
        assert_eq!(json["participationCount"], 0);
        assert!(json.get("createdAt").is_some());
    }

    #[test]
    fn test_name_matches_ignores_case() {
        let user = User::new(1, "Alice".to_string(), String::new(), false, Utc::now());

        assert!(user.name_matches("alice"));
        assert!(user.name_matches("ALICE"));
        assert!(!user.name_matches("alicia"));
    }
}

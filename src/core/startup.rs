use anyhow::{Context, Result};
use tracing::info;

use crate::core::config::{AuthConfig, SeedConfig};
use crate::core::state::AppState;
use crate::models::log::LogAction;

const SAMPLE_EVENTS: [(&str, &str, &str); 3] = [
    (
        "Monday Night Badminton",
        "Weekly badminton session for all levels. Bring your racket!",
        "Monday, April 15, 2024 6:00 PM",
    ),
    (
        "Saturday Morning Badminton",
        "Weekend badminton session. All players welcome!",
        "Saturday, April 20, 2024 9:30 AM",
    ),
    (
        "Thursday Evening Badminton",
        "After-work badminton session. Doubles and singles games.",
        "Thursday, April 18, 2024 7:00 PM",
    ),
];

// this runs at boot time
pub fn restore_from_wal(state: &AppState) -> Result<usize> {
    let applied = state.ledger.replay().context("Failed to restore state from WAL")?;

    info!(
        operations_replayed = applied,
        users = state.ledger.users.len(),
        events = state.ledger.events.len(),
        registrations = state.ledger.registrations.len(),
        log_entries = state.ledger.logs.len(),
        "WAL replay completed"
    );

    Ok(applied)
}

/// Create the admin account and sample events when the store has no users.
///
/// Returns true if anything was seeded.
pub fn seed_initial_data(state: &AppState, seed: &SeedConfig, auth: &AuthConfig) -> Result<bool> {
    if !seed.enabled || !state.ledger.users.is_empty() {
        return Ok(false);
    }

    let admin = state
        .ledger
        .create_user(&seed.admin_name, &auth.shared_password, true)
        .context("Failed to seed admin user")?;

    info!(user_id = admin.id, name = %admin.name, "Seeded admin user");

    if seed.sample_events {
        for (title, description, date) in SAMPLE_EVENTS {
            let event = state
                .ledger
                .create_event(title, description, date)
                .context("Failed to seed sample event")?;

            state
                .ledger
                .append_log(&admin.name, LogAction::Add, format!("Added new event: {}", event.title))
                .context("Failed to log seeded event")?;
        }

        info!(events = SAMPLE_EVENTS.len(), "Seeded sample events");
    }

    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::state::test_state;

    #[test]
    fn test_seed_creates_admin_and_events_once() {
        let (state, _dir) = test_state();
        let seed = SeedConfig::default();

        assert!(seed_initial_data(&state, &seed, &state.config.auth).unwrap());

        let users = state.ledger.users.list();
        assert_eq!(users.len(), 1);
        assert_eq!(users[0].name, "Admin");
        assert!(users[0].is_admin);
        assert_eq!(users[0].password, "eventpass");
        assert_eq!(state.ledger.events.len(), 3);
        assert_eq!(state.ledger.logs.len(), 3);

        // A populated store is left alone
        assert!(!seed_initial_data(&state, &seed, &state.config.auth).unwrap());
        assert_eq!(state.ledger.users.len(), 1);
    }

    #[test]
    fn test_seed_disabled() {
        let (state, _dir) = test_state();
        let seed = SeedConfig {
            enabled: false,
            ..SeedConfig::default()
        };

        assert!(!seed_initial_data(&state, &seed, &state.config.auth).unwrap());
        assert!(state.ledger.users.is_empty());
    }

    #[test]
    fn test_restore_after_seed() {
        let (state, dir) = test_state();
        seed_initial_data(&state, &SeedConfig::default(), &state.config.auth).unwrap();

        let wal = crate::wal::wal::Wal::new(dir.path().join("test.wal")).unwrap();
        let restored = AppState::new(state.config.as_ref().clone(), wal);

        assert_eq!(restore_from_wal(&restored).unwrap(), 7);
        assert_eq!(restored.ledger.events.list(), state.ledger.events.list());
        assert_eq!(restored.ledger.users.list(), state.ledger.users.list());
    }
}

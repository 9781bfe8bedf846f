//! Vote ledger: sign-ups, withdrawals and payment flags.

use crate::badges::rules::award_badges;
use crate::core::error::StoreError;
use crate::ledger::ledger::Ledger;
use crate::models::log::{LogAction, LogEntry};
use crate::models::registration::{Registration, MAX_ADDITIONAL_PLAYERS};
use crate::models::user::User;
use crate::utils::time::now;
use crate::wal::wal::WalOperation;
use chrono::{DateTime, Utc};
use tracing::{debug, warn};

impl Ledger {
    /// Sign `user_id` up for `event_id`, bringing `additional_players` guests.
    ///
    /// The participation count goes up by one whatever the guest count, newly
    /// reached badges are appended, and the event aggregate grows by the full
    /// headcount. Returns the updated user.
    pub fn add_vote(
        &self,
        user_id: u32,
        event_id: u32,
        additional_players: u32,
    ) -> Result<User, StoreError> {
        if additional_players > MAX_ADDITIONAL_PLAYERS {
            return Err(StoreError::TooManyPlayers(additional_players));
        }

        let _guard = self.lock()?;

        let user = self.users.get(user_id).ok_or(StoreError::UserNotFound)?;
        if self.events.get(event_id).is_none() {
            return Err(StoreError::EventNotFound);
        }
        if user.has_voted_for(event_id) {
            return Err(StoreError::AlreadyVoted);
        }

        self.commit(WalOperation::Vote {
            user_id,
            event_id,
            additional_players,
            voted_at: now(),
        })?;

        debug!(user_id, event_id, additional_players, "Vote recorded");
        self.users.get(user_id).ok_or(StoreError::UserNotFound)
    }

    /// Withdraw a sign-up.
    ///
    /// The aggregate drops by the headcount stored at vote time. Participation
    /// count and badges are kept.
    pub fn remove_vote(&self, user_id: u32, event_id: u32) -> Result<User, StoreError> {
        let _guard = self.lock()?;

        let user = self.users.get(user_id).ok_or(StoreError::UserNotFound)?;
        if self.events.get(event_id).is_none() {
            return Err(StoreError::EventNotFound);
        }
        if !user.has_voted_for(event_id) {
            return Err(StoreError::NotVoted);
        }

        self.commit(WalOperation::Unvote { user_id, event_id })?;

        debug!(user_id, event_id, "Vote withdrawn");
        self.users.get(user_id).ok_or(StoreError::UserNotFound)
    }

    /// Set the paid flag on a registration and record the transition in the
    /// audit log. The log entry is written on every call, even when the flag
    /// already had this value.
    pub fn update_payment_status(
        &self,
        user_id: u32,
        event_id: u32,
        paid: bool,
    ) -> Result<LogEntry, StoreError> {
        let _guard = self.lock()?;

        if self.registrations.get(user_id, event_id).is_none() {
            return Err(StoreError::RegistrationNotFound);
        }
        let user = self.users.get(user_id).ok_or(StoreError::UserNotFound)?;
        let event = self.events.get(event_id).ok_or(StoreError::EventNotFound)?;

        let log_id = self.logs.allocate_id();
        let logged_at = now();
        self.commit(WalOperation::SetPaid {
            user_id,
            event_id,
            paid,
            log_id,
            logged_at,
        })?;

        debug!(user_id, event_id, paid, "Payment status updated");
        Ok(payment_log_entry(log_id, logged_at, user.name, &event.title, paid))
    }

    pub(super) fn apply_vote(
        &self,
        user_id: u32,
        event_id: u32,
        additional_players: u32,
        voted_at: DateTime<Utc>,
    ) {
        match (self.users.get(user_id), self.events.get(event_id)) {
            (Some(user), Some(_)) if !user.has_voted_for(event_id) => {}
            _ => {
                warn!(user_id, event_id, "Cannot apply vote, skipping");
                return;
            }
        }

        self.users.update(user_id, |user| {
            user.votes.push(event_id);
            user.participation_count = user.participation_count.saturating_add(1);
            user.badges = award_badges(&user.badges, user.participation_count);
        });

        let registration = Registration::new(user_id, event_id, additional_players, voted_at);
        let headcount = registration.headcount();
        self.registrations.insert(registration);
        self.events.add_votes(event_id, headcount);
    }

    pub(super) fn apply_unvote(&self, user_id: u32, event_id: u32) {
        // Without a registration row only the voter's own seat is released
        let headcount = self
            .registrations
            .remove(user_id, event_id)
            .map(|registration| registration.headcount())
            .unwrap_or(1);

        self.users
            .update(user_id, |user| user.votes.retain(|id| *id != event_id));
        self.events.remove_votes(event_id, headcount);
    }

    pub(super) fn apply_set_paid(
        &self,
        user_id: u32,
        event_id: u32,
        paid: bool,
        log_id: u64,
        logged_at: DateTime<Utc>,
    ) {
        if !self.registrations.set_paid(user_id, event_id, paid) {
            warn!(user_id, event_id, "Payment update for unknown registration, skipping");
            return;
        }

        let (Some(user), Some(event)) = (self.users.get(user_id), self.events.get(event_id)) else {
            return;
        };

        self.logs
            .append(payment_log_entry(log_id, logged_at, user.name, &event.title, paid));
    }
}

fn payment_log_entry(
    id: u64,
    timestamp: DateTime<Utc>,
    user_name: String,
    event_title: &str,
    paid: bool,
) -> LogEntry {
    let action = LogAction::for_payment(paid);
    LogEntry {
        id,
        timestamp,
        user: user_name,
        action,
        details: format!("{} for game: {}", action, event_title),
    }
}

use crate::core::error::StoreError;
use crate::models::event::{Event, EventPatch};
use crate::models::log::{LogAction, LogEntry};
use crate::models::registration::{Registration, VoteDetail};
use crate::models::user::User;
use crate::stores::{
    event_store::EventStore, log_store::LogStore, registration_store::RegistrationStore,
    user_store::UserStore,
};
use crate::utils::time::now;
use crate::wal::wal::{Wal, WalOperation};
use anyhow::Context;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{debug, warn};

/// Write path for every table.
///
/// A mutation takes the ledger lock, checks its preconditions against the
/// tables, appends exactly one WAL record and only then applies it. Replaying
/// the WAL through [`Ledger::apply`] at startup rebuilds the same state.
pub struct Ledger {
    pub users: Arc<UserStore>,
    pub events: Arc<EventStore>,
    pub registrations: Arc<RegistrationStore>,
    pub logs: Arc<LogStore>,
    wal: Arc<Wal>,
    write_lock: Mutex<()>,
}

impl Ledger {
    pub fn new(wal: Wal) -> Self {
        Self {
            users: Arc::new(UserStore::new()),
            events: Arc::new(EventStore::new()),
            registrations: Arc::new(RegistrationStore::new()),
            logs: Arc::new(LogStore::new()),
            wal: Arc::new(wal),
            write_lock: Mutex::new(()),
        }
    }

    pub(super) fn lock(&self) -> Result<MutexGuard<'_, ()>, StoreError> {
        self.write_lock.lock().map_err(|_| StoreError::LockPoisoned)
    }

    /// Persist `op`, then apply it. Must be called with the ledger lock held.
    pub(super) fn commit(&self, op: WalOperation) -> Result<(), StoreError> {
        self.wal.log_operation(&op)?;
        self.apply(&op);
        Ok(())
    }

    /// Rebuild the tables from the WAL, returning how many records were applied
    pub fn replay(&self) -> anyhow::Result<usize> {
        let _guard = self
            .write_lock
            .lock()
            .map_err(|_| anyhow::anyhow!("Ledger lock poisoned"))?;

        let operations = self.wal.replay().context("Failed to replay WAL")?;
        for op in &operations {
            self.apply(op);
        }

        Ok(operations.len())
    }

    /// Apply a committed operation to the tables.
    ///
    /// Records that reference rows which no longer exist are skipped, so a
    /// damaged log degrades to missing rows instead of a failed startup.
    pub fn apply(&self, op: &WalOperation) {
        match op {
            WalOperation::CreateUser {
                id,
                name,
                password,
                is_admin,
                created_at,
            } => {
                self.users.insert(User::new(
                    *id,
                    name.clone(),
                    password.clone(),
                    *is_admin,
                    *created_at,
                ));
            }
            WalOperation::DeleteUser { id } => self.apply_delete_user(*id),
            WalOperation::SetBalance { user_id, balance } => {
                if self.users.update(*user_id, |user| user.balance = *balance).is_none() {
                    warn!(user_id, "Balance update for unknown user, skipping");
                }
            }
            WalOperation::CreateEvent {
                id,
                title,
                description,
                date,
            } => {
                self.events.insert(Event::new(
                    *id,
                    title.clone(),
                    description.clone(),
                    date.clone(),
                ));
            }
            WalOperation::UpdateEvent { id, patch } => {
                if self.events.update(*id, |event| patch.apply_to(event)).is_none() {
                    warn!(event_id = id, "Update for unknown event, skipping");
                }
            }
            WalOperation::DeleteEvent { id } => self.apply_delete_event(*id),
            WalOperation::Vote {
                user_id,
                event_id,
                additional_players,
                voted_at,
            } => self.apply_vote(*user_id, *event_id, *additional_players, *voted_at),
            WalOperation::Unvote { user_id, event_id } => self.apply_unvote(*user_id, *event_id),
            WalOperation::SetPaid {
                user_id,
                event_id,
                paid,
                log_id,
                logged_at,
            } => self.apply_set_paid(*user_id, *event_id, *paid, *log_id, *logged_at),
            WalOperation::AppendLog {
                id,
                timestamp,
                user,
                action,
                details,
            } => {
                self.logs.append(LogEntry {
                    id: *id,
                    timestamp: *timestamp,
                    user: user.clone(),
                    action: *action,
                    details: details.clone(),
                });
            }
        }
    }

    fn apply_delete_user(&self, id: u32) {
        // Release the seats the user was holding
        for registration in self.registrations.remove_for_user(id) {
            self.events
                .remove_votes(registration.event_id, registration.headcount());
        }
        self.users.remove(id);
    }

    fn apply_delete_event(&self, id: u32) {
        self.registrations.remove_for_event(id);
        self.users.update_all(|user| user.votes.retain(|event_id| *event_id != id));
        self.events.remove(id);
    }

    pub fn create_user(&self, name: &str, password: &str, is_admin: bool) -> Result<User, StoreError> {
        let _guard = self.lock()?;

        if self.users.get_by_name(name).is_some() {
            return Err(StoreError::DuplicateName);
        }

        let id = self.users.allocate_id();
        if self.users.get(id).is_some() {
            return Err(StoreError::IdsExhausted);
        }
        self.commit(WalOperation::CreateUser {
            id,
            name: name.to_string(),
            password: password.to_string(),
            is_admin,
            created_at: now(),
        })?;

        debug!(user_id = id, name, is_admin, "User created");
        self.users.get(id).ok_or(StoreError::UserNotFound)
    }

    /// Remove a user along with their registrations
    pub fn delete_user(&self, id: u32) -> Result<User, StoreError> {
        let _guard = self.lock()?;

        let user = self.users.get(id).ok_or(StoreError::UserNotFound)?;
        self.commit(WalOperation::DeleteUser { id })?;

        Ok(user)
    }

    pub fn set_balance(&self, user_id: u32, balance: i64) -> Result<User, StoreError> {
        let _guard = self.lock()?;

        if self.users.get(user_id).is_none() {
            return Err(StoreError::UserNotFound);
        }
        self.commit(WalOperation::SetBalance { user_id, balance })?;

        self.users.get(user_id).ok_or(StoreError::UserNotFound)
    }

    pub fn create_event(&self, title: &str, description: &str, date: &str) -> Result<Event, StoreError> {
        let _guard = self.lock()?;

        let id = self.events.allocate_id();
        if self.events.get(id).is_some() {
            return Err(StoreError::IdsExhausted);
        }
        self.commit(WalOperation::CreateEvent {
            id,
            title: title.to_string(),
            description: description.to_string(),
            date: date.to_string(),
        })?;

        self.events.get(id).ok_or(StoreError::EventNotFound)
    }

    /// Apply a partial update. An empty patch returns the event unchanged.
    pub fn update_event(&self, id: u32, patch: EventPatch) -> Result<Event, StoreError> {
        let _guard = self.lock()?;

        let event = self.events.get(id).ok_or(StoreError::EventNotFound)?;
        if patch.is_empty() {
            return Ok(event);
        }
        self.commit(WalOperation::UpdateEvent { id, patch })?;

        self.events.get(id).ok_or(StoreError::EventNotFound)
    }

    /// Remove an event, its registrations and every user's vote for it.
    /// Participation counts and badges are left alone.
    pub fn delete_event(&self, id: u32) -> Result<Event, StoreError> {
        let _guard = self.lock()?;

        let event = self.events.get(id).ok_or(StoreError::EventNotFound)?;
        self.commit(WalOperation::DeleteEvent { id })?;

        Ok(event)
    }

    pub fn append_log(
        &self,
        user: &str,
        action: LogAction,
        details: impl Into<String>,
    ) -> Result<LogEntry, StoreError> {
        let _guard = self.lock()?;

        let entry = LogEntry {
            id: self.logs.allocate_id(),
            timestamp: now(),
            user: user.to_string(),
            action,
            details: details.into(),
        };

        self.commit(WalOperation::AppendLog {
            id: entry.id,
            timestamp: entry.timestamp,
            user: entry.user.clone(),
            action: entry.action,
            details: entry.details.clone(),
        })?;

        Ok(entry)
    }

    /// Audit an operation that has already committed.
    ///
    /// The operation stands whether or not its log entry makes it to disk, so
    /// a failed append is reported with `warn!` and the caller carries on.
    pub fn record_audit(
        &self,
        user: &str,
        action: LogAction,
        details: impl Into<String>,
    ) -> Option<LogEntry> {
        match self.append_log(user, action, details) {
            Ok(entry) => Some(entry),
            Err(err) => {
                warn!(user, action = %action, error = %err, "Failed to append audit log entry");
                None
            }
        }
    }

    pub fn vote_details(&self) -> Vec<VoteDetail> {
        self.join_details(self.registrations.all())
    }

    pub fn vote_details_for_event(&self, event_id: u32) -> Vec<VoteDetail> {
        self.join_details(self.registrations.for_event(event_id))
    }

    pub fn vote_details_for_user(&self, user_id: u32) -> Vec<VoteDetail> {
        self.join_details(self.registrations.for_user(user_id))
    }

    /// Join registrations with user and event names, newest first
    fn join_details(&self, registrations: Vec<Registration>) -> Vec<VoteDetail> {
        let mut details: Vec<VoteDetail> = registrations
            .into_iter()
            .filter_map(|registration| {
                let user = self.users.get(registration.user_id)?;
                let event = self.events.get(registration.event_id)?;
                Some(VoteDetail {
                    event_id: event.id,
                    event_title: event.title,
                    user_id: user.id,
                    user_name: user.name,
                    voted_at: registration.voted_at,
                    additional_players: registration.additional_players,
                    paid: registration.paid,
                })
            })
            .collect();

        details.sort_by(|a, b| {
            b.voted_at
                .cmp(&a.voted_at)
                .then(a.event_id.cmp(&b.event_id))
                .then(a.user_id.cmp(&b.user_id))
        });
        details
    }
}

#[cfg(test)]
pub(crate) fn test_ledger() -> (Ledger, tempfile::TempDir) {
    let temp_dir = tempfile::TempDir::new().unwrap();
    let wal = Wal::new(temp_dir.path().join("test.wal")).unwrap();
    (Ledger::new(wal), temp_dir)
}

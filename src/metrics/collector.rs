use crate::ledger::ledger::Ledger;
use crate::utils::time::{elapsed_seconds, now};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};

pub struct Metrics {
    pub registrations: AtomicU64,
    pub logins: AtomicU64,
    pub votes_cast: AtomicU64,
    pub votes_withdrawn: AtomicU64,
    pub rejected_votes: AtomicU64,
    pub payment_updates: AtomicU64,
    pub start_time: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricsSnapshot {
    pub registrations: u64,
    pub logins: u64,
    pub votes_cast: u64,
    pub votes_withdrawn: u64,
    pub rejected_votes: u64,
    pub payment_updates: u64,
    pub users: usize,
    pub events: usize,
    pub active_registrations: usize,
    pub log_entries: usize,
    pub uptime_seconds: i64,
}

impl Metrics {
    pub fn new() -> Self {
        Self {
            registrations: AtomicU64::new(0),
            logins: AtomicU64::new(0),
            votes_cast: AtomicU64::new(0),
            votes_withdrawn: AtomicU64::new(0),
            rejected_votes: AtomicU64::new(0),
            payment_updates: AtomicU64::new(0),
            start_time: now(),
        }
    }

    pub fn increment_registrations(&self) {
        self.registrations.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_logins(&self) {
        self.logins.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_votes_cast(&self) {
        self.votes_cast.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_votes_withdrawn(&self) {
        self.votes_withdrawn.fetch_add(1, Ordering::Relaxed);
    }

    /// Duplicate votes and withdrawals of votes that were never cast
    pub fn increment_rejected_votes(&self) {
        self.rejected_votes.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_payment_updates(&self) {
        self.payment_updates.fetch_add(1, Ordering::Relaxed);
    }

    /// Combine the counters with current table sizes
    pub fn get_snapshot(&self, ledger: &Ledger) -> MetricsSnapshot {
        MetricsSnapshot {
            registrations: self.registrations.load(Ordering::Relaxed),
            logins: self.logins.load(Ordering::Relaxed),
            votes_cast: self.votes_cast.load(Ordering::Relaxed),
            votes_withdrawn: self.votes_withdrawn.load(Ordering::Relaxed),
            rejected_votes: self.rejected_votes.load(Ordering::Relaxed),
            payment_updates: self.payment_updates.load(Ordering::Relaxed),
            users: ledger.users.len(),
            events: ledger.events.len(),
            active_registrations: ledger.registrations.len(),
            log_entries: ledger.logs.len(),
            uptime_seconds: elapsed_seconds(&self.start_time, &now()),
        }
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

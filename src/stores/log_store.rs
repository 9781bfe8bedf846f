use crate::models::log::LogEntry;
use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, Ordering};

/// Append-only audit log. Entries are never changed or removed.
pub struct LogStore {
    entries: DashMap<u64, LogEntry>,
    next_id: AtomicU64,
}

impl LogStore {
    pub fn new() -> Self {
        Self {
            entries: DashMap::new(),
            next_id: AtomicU64::new(1),
        }
    }

    pub fn allocate_id(&self) -> u64 {
        self.next_id.fetch_add(1, Ordering::Relaxed)
    }

    /// Append an entry; an ID that is already taken is ignored
    pub fn append(&self, entry: LogEntry) {
        self.next_id.fetch_max(entry.id.saturating_add(1), Ordering::Relaxed);
        self.entries.entry(entry.id).or_insert(entry);
    }

    /// All entries, newest first
    pub fn list(&self) -> Vec<LogEntry> {
        let mut entries: Vec<LogEntry> =
            self.entries.iter().map(|entry| entry.value().clone()).collect();
        entries.sort_by(|a, b| b.timestamp.cmp(&a.timestamp).then(b.id.cmp(&a.id)));
        entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for LogStore {
    fn default() -> Self {
        Self::new()
    }
}

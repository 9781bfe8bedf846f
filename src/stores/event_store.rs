use crate::models::event::Event;
use dashmap::DashMap;
use std::sync::atomic::{AtomicU32, Ordering};

/// Events table keyed by event ID
pub struct EventStore {
    events: DashMap<u32, Event>,
    next_id: AtomicU32,
}

impl EventStore {
    pub fn new() -> Self {
        Self {
            events: DashMap::new(),
            next_id: AtomicU32::new(1),
        }
    }

    pub fn allocate_id(&self) -> u32 {
        // Sticks at u32::MAX instead of wrapping onto low, taken IDs
        self.next_id
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |id| Some(id.saturating_add(1)))
            .unwrap_or_else(|id| id)
    }

    pub fn insert(&self, event: Event) {
        self.next_id.fetch_max(event.id.saturating_add(1), Ordering::Relaxed);
        self.events.insert(event.id, event);
    }

    pub fn remove(&self, id: u32) -> Option<Event> {
        self.events.remove(&id).map(|(_, event)| event)
    }

    pub fn get(&self, id: u32) -> Option<Event> {
        self.events.get(&id).map(|entry| entry.value().clone())
    }

    pub fn update<F>(&self, id: u32, f: F) -> Option<Event>
    where
        F: FnOnce(&mut Event),
    {
        self.events.get_mut(&id).map(|mut entry| {
            f(entry.value_mut());
            entry.value().clone()
        })
    }

    /// Raise the aggregate vote count by `headcount`
    pub fn add_votes(&self, id: u32, headcount: u32) -> Option<Event> {
        self.update(id, |event| event.votes = event.votes.saturating_add(headcount))
    }

    /// Lower the aggregate vote count by `headcount`, stopping at zero
    pub fn remove_votes(&self, id: u32, headcount: u32) -> Option<Event> {
        self.update(id, |event| event.votes = event.votes.saturating_sub(headcount))
    }

    /// All events ordered by ID
    pub fn list(&self) -> Vec<Event> {
        let mut events: Vec<Event> = self.events.iter().map(|entry| entry.value().clone()).collect();
        events.sort_by_key(|event| event.id);
        events
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

impl Default for EventStore {
    fn default() -> Self {
        Self::new()
    }
}

use crate::models::user::User;
use dashmap::DashMap;
use std::sync::atomic::{AtomicU32, Ordering};

/// Users table keyed by user ID
pub struct UserStore {
    users: DashMap<u32, User>,
    next_id: AtomicU32,
}

impl UserStore {
    pub fn new() -> Self {
        Self {
            users: DashMap::new(),
            next_id: AtomicU32::new(1),
        }
    }

    /// Reserve the next unused ID
    pub fn allocate_id(&self) -> u32 {
        // Sticks at u32::MAX instead of wrapping onto low, taken IDs
        self.next_id
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |id| Some(id.saturating_add(1)))
            .unwrap_or_else(|id| id)
    }

    /// Insert or replace a user, keeping the ID counter ahead of it
    pub fn insert(&self, user: User) {
        self.next_id.fetch_max(user.id.saturating_add(1), Ordering::Relaxed);
        self.users.insert(user.id, user);
    }

    pub fn remove(&self, id: u32) -> Option<User> {
        self.users.remove(&id).map(|(_, user)| user)
    }

    /// Snapshot of a user
    pub fn get(&self, id: u32) -> Option<User> {
        self.users.get(&id).map(|entry| entry.value().clone())
    }

    /// Look a user up by name, ignoring case.
    /// Note: This is a linear scan
    pub fn get_by_name(&self, name: &str) -> Option<User> {
        self.users
            .iter()
            .find(|entry| entry.value().name_matches(name))
            .map(|entry| entry.value().clone())
    }

    /// Mutate a user in place, returning the updated snapshot
    pub fn update<F>(&self, id: u32, f: F) -> Option<User>
    where
        F: FnOnce(&mut User),
    {
        self.users.get_mut(&id).map(|mut entry| {
            f(entry.value_mut());
            entry.value().clone()
        })
    }

    /// Mutate every user in place
    pub fn update_all<F>(&self, mut f: F)
    where
        F: FnMut(&mut User),
    {
        for mut entry in self.users.iter_mut() {
            f(entry.value_mut());
        }
    }

    /// All users ordered by ID
    pub fn list(&self) -> Vec<User> {
        let mut users: Vec<User> = self.users.iter().map(|entry| entry.value().clone()).collect();
        users.sort_by_key(|user| user.id);
        users
    }

    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }
}

impl Default for UserStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn user(id: u32, name: &str) -> User {
        User::new(id, name.to_string(), "eventpass".to_string(), false, Utc::now())
    }

    #[test]
    fn test_insert_keeps_id_counter_ahead() {
        let store = UserStore::new();
        assert_eq!(store.allocate_id(), 1);

        store.insert(user(10, "Alice"));
        assert_eq!(store.allocate_id(), 11);

        // Inserting a lower ID never moves the counter back
        store.insert(user(3, "Bob"));
        assert_eq!(store.allocate_id(), 12);
    }

    #[test]
    fn test_get_by_name_is_case_insensitive() {
        let store = UserStore::new();
        store.insert(user(1, "alice"));

        assert_eq!(store.get_by_name("Alice").map(|u| u.id), Some(1));
        assert!(store.get_by_name("bob").is_none());
    }

    #[test]
    fn test_update_returns_snapshot() {
        let store = UserStore::new();
        store.insert(user(1, "Alice"));

        let updated = store.update(1, |u| u.balance = -5).unwrap();
        assert_eq!(updated.balance, -5);
        assert_eq!(store.get(1).unwrap().balance, -5);
        assert!(store.update(2, |u| u.balance = 1).is_none());
    }

    #[test]
    fn test_list_is_ordered_by_id() {
        let store = UserStore::new();
        store.insert(user(3, "C"));
        store.insert(user(1, "A"));
        store.insert(user(2, "B"));

        let ids: Vec<u32> = store.list().iter().map(|u| u.id).collect();
        assert_eq!(ids, vec![1, 2, 3]);
    }
}

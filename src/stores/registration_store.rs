use crate::models::registration::Registration;
use dashmap::DashMap;

/// Registrations keyed by `(user_id, event_id)`, at most one per pair
pub struct RegistrationStore {
    registrations: DashMap<(u32, u32), Registration>,
}

impl RegistrationStore {
    pub fn new() -> Self {
        Self {
            registrations: DashMap::new(),
        }
    }

    pub fn insert(&self, registration: Registration) {
        let key = (registration.user_id, registration.event_id);
        self.registrations.insert(key, registration);
    }

    pub fn get(&self, user_id: u32, event_id: u32) -> Option<Registration> {
        self.registrations
            .get(&(user_id, event_id))
            .map(|entry| entry.value().clone())
    }

    pub fn remove(&self, user_id: u32, event_id: u32) -> Option<Registration> {
        self.registrations
            .remove(&(user_id, event_id))
            .map(|(_, registration)| registration)
    }

    /// Set the paid flag, returning false if no registration matches
    pub fn set_paid(&self, user_id: u32, event_id: u32, paid: bool) -> bool {
        match self.registrations.get_mut(&(user_id, event_id)) {
            Some(mut entry) => {
                entry.value_mut().paid = paid;
                true
            }
            None => false,
        }
    }

    pub fn for_event(&self, event_id: u32) -> Vec<Registration> {
        self.filtered(|registration| registration.event_id == event_id)
    }

    pub fn for_user(&self, user_id: u32) -> Vec<Registration> {
        self.filtered(|registration| registration.user_id == user_id)
    }

    pub fn all(&self) -> Vec<Registration> {
        self.filtered(|_| true)
    }

    /// Drop every registration for an event, returning what was removed
    pub fn remove_for_event(&self, event_id: u32) -> Vec<Registration> {
        self.remove_matching(|registration| registration.event_id == event_id)
    }

    /// Drop every registration of a user, returning what was removed
    pub fn remove_for_user(&self, user_id: u32) -> Vec<Registration> {
        self.remove_matching(|registration| registration.user_id == user_id)
    }

    pub fn len(&self) -> usize {
        self.registrations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.registrations.is_empty()
    }

    fn filtered<F>(&self, predicate: F) -> Vec<Registration>
    where
        F: Fn(&Registration) -> bool,
    {
        self.registrations
            .iter()
            .filter(|entry| predicate(entry.value()))
            .map(|entry| entry.value().clone())
            .collect()
    }

    fn remove_matching<F>(&self, predicate: F) -> Vec<Registration>
    where
        F: Fn(&Registration) -> bool,
    {
        let mut removed = Vec::new();
        self.registrations.retain(|_, registration| {
            if predicate(registration) {
                removed.push(registration.clone());
                false
            } else {
                true
            }
        });
        removed
    }
}

impl Default for RegistrationStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn test_one_registration_per_pair() {
        let store = RegistrationStore::new();
        store.insert(Registration::new(1, 2, 0, Utc::now()));
        store.insert(Registration::new(1, 2, 3, Utc::now()));

        assert_eq!(store.len(), 1);
        assert_eq!(store.get(1, 2).unwrap().additional_players, 3);
    }

    #[test]
    fn test_set_paid() {
        let store = RegistrationStore::new();
        store.insert(Registration::new(1, 2, 0, Utc::now()));

        assert!(store.set_paid(1, 2, true));
        assert!(store.get(1, 2).unwrap().paid);
        assert!(!store.set_paid(2, 1, true));
    }

    #[test]
    fn test_remove_for_event_and_user() {
        let store = RegistrationStore::new();
        store.insert(Registration::new(1, 10, 0, Utc::now()));
        store.insert(Registration::new(2, 10, 1, Utc::now()));
        store.insert(Registration::new(1, 20, 0, Utc::now()));

        let removed = store.remove_for_event(10);
        assert_eq!(removed.len(), 2);
        assert_eq!(store.len(), 1);

        let removed = store.remove_for_user(1);
        assert_eq!(removed.len(), 1);
        assert!(store.is_empty());
    }
}

use dashmap::DashMap;
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use tracing::debug;

/// Cached JSON views keyed by request path (including the query string).
///
/// Mutations drop every view under the path prefixes they affect; the next
/// read refetches. Readers may see stale data until then.
pub struct ViewCache {
    views: DashMap<String, Value>,
}

impl ViewCache {
    pub fn new() -> Self {
        Self {
            views: DashMap::new(),
        }
    }

    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let value = self.views.get(key)?;

        serde_json::from_value(value.value().clone()).ok()
    }

    pub fn put<T: Serialize>(&self, key: &str, view: &T) {
        if let Ok(value) = serde_json::to_value(view) {
            self.views.insert(key.to_string(), value);
        }
    }

    /// Drop all views whose key starts with `prefix`, returning how many went
    pub fn invalidate(&self, prefix: &str) -> usize {
        let before = self.views.len();
        self.views.retain(|key, _| !key.starts_with(prefix));
        let removed = before.saturating_sub(self.views.len());

        debug!(prefix, removed, "Invalidated cached views");
        removed
    }

    pub fn invalidate_all(&self) {
        self.views.clear();
    }

    pub fn contains(&self, key: &str) -> bool {
        self.views.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.views.len()
    }

    pub fn is_empty(&self) -> bool {
        self.views.is_empty()
    }
}

impl Default for ViewCache {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_put_and_get() {
        let cache = ViewCache::new();
        cache.put("/api/events", &vec![1u32, 2, 3]);

        let view: Vec<u32> = cache.get("/api/events").unwrap();
        assert_eq!(view, vec![1, 2, 3]);
        assert!(cache.get::<Vec<u32>>("/api/users").is_none());
    }

    #[test]
    fn test_get_with_wrong_shape_misses() {
        let cache = ViewCache::new();
        cache.put("/api/events", &"not a list");

        assert!(cache.get::<Vec<u32>>("/api/events").is_none());
    }

    #[test]
    fn test_invalidate_prefix() {
        let cache = ViewCache::new();
        cache.put("/api/votes?userId=1", &1u32);
        cache.put("/api/votes/event/3?userId=1", &2u32);
        cache.put("/api/events", &3u32);

        assert_eq!(cache.invalidate("/api/votes"), 2);
        assert!(!cache.contains("/api/votes/event/3?userId=1"));
        assert!(cache.contains("/api/events"));

        cache.invalidate_all();
        assert!(cache.is_empty());
    }
}

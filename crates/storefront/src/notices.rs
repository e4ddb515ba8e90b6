//! Scoped, auto-expiring user-facing messages.
//!
//! A notice is attached to a key (a cart line, an order row, the whole cart)
//! and disappears once its time-to-live has elapsed. Setting a new notice for
//! the same key replaces the old one and restarts its clock.

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;
use tokio::time::Instant;

#[derive(Debug)]
pub struct Notices<K> {
    ttl: Duration,
    entries: Mutex<HashMap<K, (String, Instant)>>,
}

impl<K: Eq + Hash + Clone> Notices<K> {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: Mutex::new(HashMap::new()),
        }
    }

    pub fn set(&self, key: K, message: impl Into<String>) {
        let expires_at = Instant::now() + self.ttl;
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key, (message.into(), expires_at));
    }

    /// The live notice for `key`, if any. Expired entries are dropped.
    pub fn get(&self, key: &K) -> Option<String> {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        let now = Instant::now();
        let live = entries
            .get(key)
            .map(|(message, expires_at)| (now < *expires_at).then(|| message.clone()));
        match live {
            Some(Some(message)) => Some(message),
            Some(None) => {
                entries.remove(key);
                None
            }
            None => None,
        }
    }

    pub fn clear(&self, key: &K) {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(key);
    }

    /// Drops notices whose key fails `keep`.
    pub fn retain(&self, mut keep: impl FnMut(&K) -> bool) {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .retain(|key, _| keep(key));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_notice_expires_after_ttl() {
        let notices = Notices::new(Duration::from_millis(4000));
        notices.set(7u64, "Chỉ còn 3 sản phẩm trong kho.");

        tokio::time::advance(Duration::from_millis(3999)).await;
        assert_eq!(notices.get(&7).as_deref(), Some("Chỉ còn 3 sản phẩm trong kho."));

        tokio::time::advance(Duration::from_millis(1)).await;
        assert_eq!(notices.get(&7), None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_replacing_restarts_the_clock() {
        let notices = Notices::new(Duration::from_secs(4));
        notices.set(1u64, "first");
        tokio::time::advance(Duration::from_secs(3)).await;
        notices.set(1u64, "second");
        tokio::time::advance(Duration::from_secs(3)).await;

        assert_eq!(notices.get(&1).as_deref(), Some("second"));
    }
}

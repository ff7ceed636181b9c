//! Synchronization primitives.

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::Mutex;

/// Per-key async mutex.
///
/// Different keys can be locked concurrently while operations on the same
/// key are serialized. Entries nobody holds can be dropped with
/// [`KeyedLocks::prune_idle`].
///
/// # Example
///
/// ```ignore
/// let locks = KeyedLocks::new();
///
/// let lock = locks.get("player-1");
/// let _guard = lock.lock().await;
/// // Another call to locks.get("player-1").lock().await would wait
/// ```
#[derive(Clone, Default)]
pub struct KeyedLocks {
    locks: Arc<DashMap<String, Arc<Mutex<()>>>>,
}

impl KeyedLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get or create the lock for `key`.
    pub fn get(&self, key: &str) -> Arc<Mutex<()>> {
        self.locks
            .entry(key.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    /// Drop every lock that no caller currently holds a reference to.
    ///
    /// Returns the number of entries removed.
    pub fn prune_idle(&self) -> usize {
        let before = self.locks.len();
        // strong_count == 1 means only the map holds it
        self.locks.retain(|_, lock| Arc::strong_count(lock) > 1);
        before.saturating_sub(self.locks.len())
    }

    pub fn len(&self) -> usize {
        self.locks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locks.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn get_returns_same_lock_for_same_key() {
        let locks = KeyedLocks::new();

        let lock1 = locks.get("key1");
        let lock2 = locks.get("key1");

        assert!(Arc::ptr_eq(&lock1, &lock2));
    }

    #[test]
    fn get_returns_different_locks_for_different_keys() {
        let locks = KeyedLocks::new();

        let lock1 = locks.get("key1");
        let lock2 = locks.get("key2");

        assert!(!Arc::ptr_eq(&lock1, &lock2));
    }

    #[test]
    fn prune_keeps_held_locks() {
        let locks = KeyedLocks::new();

        let held = locks.get("held");
        locks.get("idle");
        assert_eq!(locks.len(), 2);

        let removed = locks.prune_idle();

        assert_eq!(removed, 1);
        assert_eq!(locks.len(), 1);
        assert!(Arc::ptr_eq(&held, &locks.get("held")));
    }

    #[tokio::test]
    async fn same_key_serializes() {
        let locks = KeyedLocks::new();
        let lock = locks.get("key1");
        let _guard = lock.lock().await;

        assert!(locks.get("key1").try_lock().is_err());
        assert!(locks.get("key2").try_lock().is_ok());
    }
}

//! Keyed lock arena
//!
//! One async mutex per active key. Entries are created on first use and
//! counted per caller (holders and waiters alike); the entry is removed when
//! the last caller goes away, whether it held the lock or gave up waiting.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::OwnedMutexGuard;

#[derive(Debug, Default)]
struct Slot {
    mutex: Arc<tokio::sync::Mutex<()>>,
    users: usize,
}

#[derive(Debug, Default)]
pub struct KeyedLocks {
    slots: Mutex<HashMap<String, Slot>>,
}

impl KeyedLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for exclusive access to `key`
    ///
    /// The lock is released when the returned guard drops, on every exit path.
    /// Dropping the returned future while it waits also releases the entry.
    pub async fn lock(&self, key: &str) -> KeyedLockGuard<'_> {
        let mutex = {
            let mut slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
            let slot = slots.entry(key.to_string()).or_default();
            slot.users += 1;
            slot.mutex.clone()
        };
        // Registered before waiting so a cancelled wait still gives the entry back
        let mut guard = KeyedLockGuard {
            locks: self,
            key: key.to_string(),
            guard: None,
        };
        guard.guard = Some(mutex.lock_owned().await);
        guard
    }

    /// Number of keys currently held or awaited
    pub fn active_keys(&self) -> usize {
        self.slots
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

pub struct KeyedLockGuard<'a> {
    locks: &'a KeyedLocks,
    key: String,
    guard: Option<OwnedMutexGuard<()>>,
}

impl KeyedLockGuard<'_> {
    pub fn key(&self) -> &str {
        &self.key
    }
}

impl Drop for KeyedLockGuard<'_> {
    fn drop(&mut self) {
        self.guard.take();
        let mut slots = self
            .locks
            .slots
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if let Some(slot) = slots.get_mut(&self.key) {
            slot.users = slot.users.saturating_sub(1);
            if slot.users == 0 {
                slots.remove(&self.key);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[tokio::test]
    async fn test_slot_reclaimed_after_release() {
        let locks = KeyedLocks::new();
        {
            let guard = locks.lock("A1").await;
            assert_eq!(guard.key(), "A1");
            assert_eq!(locks.active_keys(), 1);
        }
        assert_eq!(locks.active_keys(), 0);
    }

    #[tokio::test]
    async fn test_distinct_keys_do_not_block() {
        let locks = KeyedLocks::new();
        let _a = locks.lock("A1").await;
        let b = tokio::time::timeout(Duration::from_millis(100), locks.lock("B2")).await;
        assert!(b.is_ok());
        assert_eq!(locks.active_keys(), 2);
    }

    #[tokio::test]
    async fn test_same_key_blocks() {
        let locks = KeyedLocks::new();
        let held = locks.lock("A1").await;
        let waiting = tokio::time::timeout(Duration::from_millis(50), locks.lock("A1")).await;
        assert!(waiting.is_err());
        drop(held);
        assert_eq!(locks.active_keys(), 0);
        let again = tokio::time::timeout(Duration::from_millis(50), locks.lock("A1")).await;
        assert!(again.is_ok());
    }

    #[tokio::test]
    async fn test_abandoned_waiter_after_release_is_reclaimed() {
        let locks = Arc::new(KeyedLocks::new());
        let held = locks.lock("A1").await;

        let waiter = {
            let locks = locks.clone();
            tokio::spawn(async move {
                let _guard = locks.lock("A1").await;
            })
        };
        // Let the waiter register and park on the mutex
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(locks.active_keys(), 1);

        drop(held);
        waiter.abort();
        let _ = waiter.await;

        assert_eq!(locks.active_keys(), 0);
        let again = tokio::time::timeout(Duration::from_millis(50), locks.lock("A1")).await;
        assert!(again.is_ok());
    }

    #[tokio::test]
    async fn test_abandoned_waiter_while_held_is_reclaimed() {
        let locks = KeyedLocks::new();
        let held = locks.lock("A1").await;

        let waiting = tokio::time::timeout(Duration::from_millis(20), locks.lock("A1")).await;
        assert!(waiting.is_err());
        assert_eq!(locks.active_keys(), 1);

        drop(held);
        assert_eq!(locks.active_keys(), 0);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_mutual_exclusion_under_contention() {
        let locks = Arc::new(KeyedLocks::new());
        let inside = Arc::new(AtomicUsize::new(0));
        let max_inside = Arc::new(AtomicUsize::new(0));

        let mut tasks = Vec::new();
        for _ in 0..32 {
            let locks = locks.clone();
            let inside = inside.clone();
            let max_inside = max_inside.clone();
            tasks.push(tokio::spawn(async move {
                let _guard = locks.lock("hot").await;
                let now = inside.fetch_add(1, Ordering::SeqCst) + 1;
                max_inside.fetch_max(now, Ordering::SeqCst);
                tokio::task::yield_now().await;
                inside.fetch_sub(1, Ordering::SeqCst);
            }));
        }
        for task in tasks {
            task.await.unwrap();
        }

        assert_eq!(max_inside.load(Ordering::SeqCst), 1);
        assert_eq!(locks.active_keys(), 0);
    }
}

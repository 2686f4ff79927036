use std::collections::HashMap;
use std::hash::Hash;
use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

/// One async mutex per key, created on first use and dropped once no task
/// holds or waits for it.
#[derive(Debug)]
pub struct LockTable<K> {
    slots: Mutex<HashMap<K, Arc<AsyncMutex<()>>>>,
}

impl<K> LockTable<K>
where
    K: Eq + Hash + Clone,
{
    pub fn new() -> Self {
        Self {
            slots: Mutex::new(HashMap::new()),
        }
    }

    /// Wait for exclusive access to `key`. Released when the guard drops.
    pub async fn lock(&self, key: &K) -> KeyGuard<'_, K> {
        let slot = {
            let mut slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
            slots.entry(key.clone()).or_default().clone()
        };
        KeyGuard {
            table: self,
            key: key.clone(),
            guard: Some(slot.lock_owned().await),
        }
    }

    #[cfg(test)]
    fn slot_count(&self) -> usize {
        self.slots
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

/// Exclusive access to one key of a [`LockTable`].
#[derive(Debug)]
pub struct KeyGuard<'a, K>
where
    K: Eq + Hash,
{
    table: &'a LockTable<K>,
    key: K,
    guard: Option<OwnedMutexGuard<()>>,
}

impl<K> Drop for KeyGuard<'_, K>
where
    K: Eq + Hash,
{
    fn drop(&mut self) {
        drop(self.guard.take());

        // Waiters clone the slot under the map lock, so a count of one means
        // nobody else can reach this mutex.
        let mut slots = self
            .table
            .slots
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if slots
            .get(&self.key)
            .is_some_and(|slot| Arc::strong_count(slot) == 1)
        {
            slots.remove(&self.key);
        }
    }
}

impl<K> Default for LockTable<K>
where
    K: Eq + Hash + Clone,
{
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn same_key_is_serialized() {
        let locks = Arc::new(LockTable::new());
        let inside = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));

        let mut handles = Vec::new();
        for _ in 0..8 {
            let locks = locks.clone();
            let inside = inside.clone();
            let peak = peak.clone();
            handles.push(tokio::spawn(async move {
                let _guard = locks.lock(&42u64).await;
                let now = inside.fetch_add(1, Ordering::SeqCst) + 1;
                peak.fetch_max(now, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(2)).await;
                inside.fetch_sub(1, Ordering::SeqCst);
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        assert_eq!(peak.load(Ordering::SeqCst), 1);
        assert_eq!(locks.slot_count(), 0);
    }

    #[tokio::test]
    async fn released_keys_leave_no_slot_behind() {
        let locks = LockTable::new();
        for key in 0..100u64 {
            let _guard = locks.lock(&key).await;
            assert_eq!(locks.slot_count(), 1);
        }
        assert_eq!(locks.slot_count(), 0);
    }

    #[tokio::test]
    async fn slot_survives_while_another_task_waits() {
        let locks = Arc::new(LockTable::new());
        let first = locks.lock(&7u64).await;

        let waiter = {
            let locks = locks.clone();
            tokio::spawn(async move {
                let _guard = locks.lock(&7u64).await;
            })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!waiter.is_finished());
        assert_eq!(locks.slot_count(), 1);

        drop(first);
        waiter.await.unwrap();
        assert_eq!(locks.slot_count(), 0);
    }

    #[tokio::test]
    async fn different_keys_do_not_block() {
        let locks = LockTable::new();
        let _a = locks.lock(&1u64).await;
        let b = tokio::time::timeout(Duration::from_millis(50), locks.lock(&2u64)).await;
        assert!(b.is_ok());
    }
}

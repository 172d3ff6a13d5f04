//! Per-key mutual exclusion.
//!
//! One `parking_lot::Mutex<()>` per key, created on first use and dropped
//! again once no caller holds or waits on it. The registry lock is held only
//! while looking up or releasing a slot, never while the caller's closure
//! runs, so unrelated keys never contend.
//!
//! The registry lives with the store: every service built on the same store
//! serializes on the same slots.

use parking_lot::Mutex;
use std::collections::HashMap;
use std::hash::Hash;
use std::sync::Arc;

#[derive(Debug)]
pub struct KeyedLocks<K> {
    slots: Mutex<HashMap<K, Arc<Mutex<()>>>>,
}

impl<K> Default for KeyedLocks<K> {
    fn default() -> Self {
        Self {
            slots: Mutex::new(HashMap::new()),
        }
    }
}

impl<K: Clone + Eq + Hash> KeyedLocks<K> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `f` while holding the lock for `key`.
    pub fn with_key<R>(&self, key: &K, f: impl FnOnce() -> R) -> R {
        let slot = self.slot(key);
        let out = {
            let _guard = slot.lock();
            f()
        };
        self.release(key, slot);
        out
    }

    /// Keys currently held or waited on.
    pub fn len(&self) -> usize {
        self.slots.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.lock().is_empty()
    }

    fn slot(&self, key: &K) -> Arc<Mutex<()>> {
        let mut slots = self.slots.lock();
        Arc::clone(slots.entry(key.clone()).or_default())
    }

    /// Slots are cloned and released under the registry lock, so a count of
    /// one means only the registry still refers to it.
    fn release(&self, key: &K, slot: Arc<Mutex<()>>) {
        let mut slots = self.slots.lock();
        drop(slot);
        if slots.get(key).is_some_and(|s| Arc::strong_count(s) == 1) {
            slots.remove(key);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::thread;

    #[test]
    fn same_key_sections_never_overlap() {
        let locks = Arc::new(KeyedLocks::<String>::new());
        let inside = Arc::new(AtomicUsize::new(0));
        let overlaps = Arc::new(AtomicUsize::new(0));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let locks = Arc::clone(&locks);
                let inside = Arc::clone(&inside);
                let overlaps = Arc::clone(&overlaps);
                thread::spawn(move || {
                    for _ in 0..200 {
                        locks.with_key(&"X".to_string(), || {
                            if inside.fetch_add(1, Ordering::SeqCst) != 0 {
                                overlaps.fetch_add(1, Ordering::SeqCst);
                            }
                            inside.fetch_sub(1, Ordering::SeqCst);
                        });
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }

        assert_eq!(overlaps.load(Ordering::SeqCst), 0);
        assert!(locks.is_empty());
    }

    #[test]
    fn idle_keys_are_dropped() {
        let locks = KeyedLocks::<u32>::new();
        for key in 0..100 {
            assert_eq!(locks.with_key(&key, || key * 2), key * 2);
        }
        assert!(locks.is_empty());
    }

    #[test]
    fn nested_distinct_keys_are_kept_while_held() {
        let locks = KeyedLocks::<u32>::new();
        let seen = locks.with_key(&1, || locks.with_key(&2, || locks.len()));
        assert_eq!(seen, 2);
        assert!(locks.is_empty());
    }
}

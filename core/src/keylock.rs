use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

/// Registry of one mutex per string key. Work on different keys never
/// contends; work on the same key runs one closure at a time.
#[derive(Default)]
pub struct KeyedLocks {
    slots: Arc<Mutex<HashMap<String, Arc<Mutex<()>>>>>,
}

impl Clone for KeyedLocks {
    fn clone(&self) -> Self { KeyedLocks { slots: self.slots.clone() } }
}

impl KeyedLocks {
    pub fn new() -> Self {
        Self::default()
    }

    fn slot(&self, key: &str) -> Arc<Mutex<()>> {
        let mut slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
        slots.entry(key.to_string()).or_default().clone()
    }

    /// Run `f` while holding the lock for `key`.
    pub fn with_lock<R>(&self, key: &str, f: impl FnOnce() -> R) -> R {
        let slot = self.slot(key);
        // A panic in an earlier holder leaves nothing half-written behind the
        // unit value, so a poisoned lock is still usable.
        let _guard = slot.lock().unwrap_or_else(PoisonError::into_inner);
        f()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::thread;
    use std::time::Duration;

    #[test]
    fn same_key_is_serialized() {
        let locks = KeyedLocks::new();
        let inside = Arc::new(AtomicUsize::new(0));
        let max_seen = Arc::new(AtomicUsize::new(0));
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let locks = locks.clone();
                let inside = inside.clone();
                let max_seen = max_seen.clone();
                thread::spawn(move || {
                    locks.with_lock("20240101", || {
                        let now = inside.fetch_add(1, Ordering::SeqCst) + 1;
                        max_seen.fetch_max(now, Ordering::SeqCst);
                        thread::sleep(Duration::from_millis(5));
                        inside.fetch_sub(1, Ordering::SeqCst);
                    })
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }
        assert_eq!(max_seen.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn different_keys_share_no_slot() {
        let locks = KeyedLocks::new();
        let a = locks.slot("1");
        let b = locks.slot("2");
        assert!(!Arc::ptr_eq(&a, &b));
        assert!(Arc::ptr_eq(&a, &locks.slot("1")));
    }

    #[test]
    fn returns_closure_value() {
        let locks = KeyedLocks::new();
        assert_eq!(locks.with_lock("k", || 41 + 1), 42);
    }
}

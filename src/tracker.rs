//! In-memory set of in-flight backup identifiers (SPEC_FULL §3, §5).

use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use crate::types::Key;

/// Concurrency-safe set of `(namespace, name)` keys currently between
/// the `InProgress` assignment and the terminal status write.
#[derive(Clone, Default)]
pub struct BackupTracker {
    inner: Arc<Mutex<HashSet<Key>>>,
}

impl BackupTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&self, key: Key) {
        self.inner.lock().unwrap().insert(key);
    }

    pub fn delete(&self, key: &Key) {
        self.inner.lock().unwrap().remove(key);
    }

    pub fn has(&self, key: &Key) -> bool {
        self.inner.lock().unwrap().contains(key)
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().unwrap().is_empty()
    }

    pub fn len(&self) -> usize {
        self.inner.lock().unwrap().len()
    }

    /// Adds `key` and returns a guard that removes it again on drop,
    /// whichever way the scope is exited (normal return, early
    /// `return`, or unwind). This is how the Runner satisfies the
    /// "guaranteed cleanup including panics" invariant without a
    /// `catch_unwind`.
    pub fn track(&self, key: Key) -> TrackerGuard {
        self.add(key.clone());
        TrackerGuard {
            tracker: self.clone(),
            key,
        }
    }
}

/// RAII handle returned by [`BackupTracker::track`]. Removes its key
/// from the tracker when dropped.
pub struct TrackerGuard {
    tracker: BackupTracker,
    key: Key,
}

impl Drop for TrackerGuard {
    fn drop(&mut self) {
        self.tracker.delete(&self.key);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_delete_has_round_trip() {
        let tracker = BackupTracker::new();
        let key = ("ns".to_string(), "name".to_string());
        assert!(!tracker.has(&key));
        tracker.add(key.clone());
        assert!(tracker.has(&key));
        tracker.delete(&key);
        assert!(!tracker.has(&key));
    }

    #[test]
    fn guard_removes_key_on_normal_drop() {
        let tracker = BackupTracker::new();
        let key = ("ns".to_string(), "name".to_string());
        {
            let _guard = tracker.track(key.clone());
            assert!(tracker.has(&key));
        }
        assert!(!tracker.has(&key));
    }

    #[test]
    fn guard_removes_key_on_unwind() {
        let tracker = BackupTracker::new();
        let key = ("ns".to_string(), "name".to_string());
        let tracker_clone = tracker.clone();
        let key_clone = key.clone();

        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let _guard = tracker_clone.track(key_clone);
            panic!("simulated pipeline panic");
        }));

        assert!(result.is_err());
        assert!(!tracker.has(&key));
    }

    #[test]
    fn tracker_empty_iff_nothing_in_flight() {
        let tracker = BackupTracker::new();
        assert!(tracker.is_empty());
        let guard = tracker.track(("ns".to_string(), "a".to_string()));
        assert!(!tracker.is_empty());
        drop(guard);
        assert!(tracker.is_empty());
    }

    #[quickcheck_macros::quickcheck]
    fn tracker_is_empty_exactly_when_no_guard_is_held(keys: Vec<(String, String)>) -> bool {
        let tracker = BackupTracker::new();
        if !tracker.is_empty() {
            return false;
        }

        let guards: Vec<TrackerGuard> = keys.into_iter().map(|k| tracker.track(k)).collect();
        let should_be_nonempty = !guards.is_empty();
        if tracker.is_empty() != !should_be_nonempty {
            return false;
        }

        drop(guards);
        tracker.is_empty()
    }
}

//! Per-key coordination gates.
//!
//! A `GateMap` hands out one `Arc<Mutex<T>>` slot per string key. The outer
//! map lock is held only while inserting or cloning a slot; the per-key gate
//! may then be held across long operations (extraction, native bind) without
//! blocking unrelated keys.
//!
//! Lock ordering: the map lock is always acquired before, and released
//! before, any slot lock. Nothing in this module ever holds both at once
//! past `slot()` returning.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Lock a mutex, recovering the guard if a previous holder panicked.
///
/// A poisoned gate only means some resolver thread panicked; the recorded
/// state is still consistent because every write happens before a decided
/// outcome is published.
pub(crate) fn lock_recover<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Map of per-key gates, each guarding an independent `T`.
#[derive(Debug)]
pub(crate) struct GateMap<T> {
    slots: Mutex<HashMap<String, Arc<Mutex<T>>>>,
}

impl<T: Default> GateMap<T> {
    pub(crate) fn new() -> Self {
        Self {
            slots: Mutex::new(HashMap::new()),
        }
    }

    /// Fetch (creating if absent) the gate for `key`.
    ///
    /// The returned slot is shared: every caller asking for the same key gets
    /// the same mutex, which is what serializes their work.
    pub(crate) fn slot(&self, key: &str) -> Arc<Mutex<T>> {
        let mut slots = lock_recover(&self.slots);
        slots
            .entry(key.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(T::default())))
            .clone()
    }
}

impl<T: Default> Default for GateMap<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn same_key_yields_same_slot() {
        let gates: GateMap<u32> = GateMap::new();
        let a = gates.slot("engine");
        let b = gates.slot("engine");
        assert!(Arc::ptr_eq(&a, &b));
    }

    #[test]
    fn different_keys_are_independent() {
        let gates: GateMap<u32> = GateMap::new();
        let a = gates.slot("one");
        let b = gates.slot("two");
        assert!(!Arc::ptr_eq(&a, &b));

        // Holding one gate must not block the other
        let _held = a.lock().unwrap();
        *b.lock().unwrap() = 7;
        assert_eq!(*b.lock().unwrap(), 7);
    }

    #[test]
    fn concurrent_slot_access_serializes_increments() {
        let gates: Arc<GateMap<u32>> = Arc::new(GateMap::new());
        thread::scope(|scope| {
            for _ in 0..8 {
                let gates = Arc::clone(&gates);
                scope.spawn(move || {
                    for _ in 0..100 {
                        let slot = gates.slot("counter");
                        let mut value = slot.lock().unwrap();
                        *value += 1;
                    }
                });
            }
        });
        assert_eq!(*gates.slot("counter").lock().unwrap(), 800);
    }
}

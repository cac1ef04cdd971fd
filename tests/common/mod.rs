//! Shared test helpers for integration tests
//!
//! Note: Functions may appear unused because each test file compiles separately.

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;

use input_base::input::{Binding, InputSystem, KeyCallback, KeyId, KeySnapshot};

/// Parse a key name that is known to be valid
pub fn key(name: &str) -> KeyId {
    KeyId::new(name).unwrap()
}

/// Snapshot of the given held keys
pub fn held(names: &[&str]) -> Option<KeySnapshot> {
    Some(KeySnapshot::from_names(names.iter().copied()))
}

/// Shared hit counter and a no-args callback bumping it
pub fn counter() -> (Arc<AtomicUsize>, KeyCallback) {
    let hits = Arc::new(AtomicUsize::new(0));
    let inner = hits.clone();
    let callback = KeyCallback::no_args(move || {
        inner.fetch_add(1, Ordering::SeqCst);
    });
    (hits, callback)
}

pub fn hits(counter: &AtomicUsize) -> usize {
    counter.load(Ordering::SeqCst)
}

/// Event log filled by an enabled wildcard binding, entries are `KEY:Kind`
pub struct EventLog {
    pub entries: Arc<Mutex<Vec<String>>>,
    pub binding: Binding,
}

impl EventLog {
    pub fn attach(system: &InputSystem) -> Self {
        let entries = Arc::new(Mutex::new(Vec::new()));
        let sink = entries.clone();
        let binding = system
            .bind(KeyId::ANY)
            .callback(KeyCallback::with_event_and_key(move |event, key: &KeyId| {
                sink.lock().push(format!("{}:{}", key, event));
            }))
            .enable();
        Self { entries, binding }
    }

    /// Take the events logged so far
    pub fn take(&self) -> Vec<String> {
        std::mem::take(&mut *self.entries.lock())
    }
}

//! Thread-safe mapping from keys to the bindings interested in them

use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Weak};

use parking_lot::{ReentrantMutex, ReentrantMutexGuard};

use super::binding::BindingCore;
use super::types::KeyId;

/// Opaque token returned by [`CallbackRegistry::register`]
///
/// Handles are never reused, so a stale handle cannot remove a newer
/// registration.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RegistryHandle(u64);

struct RegistryEntry {
    handle: RegistryHandle,
    binding: Weak<BindingCore>,
}

#[derive(Default)]
struct RegistryInner {
    next_handle: u64,
    /// Per-key binding lists in registration order
    lists: HashMap<KeyId, Vec<RegistryEntry>>,
    /// Which list each live handle lives in
    owners: HashMap<RegistryHandle, KeyId>,
}

impl RegistryInner {
    fn remove(&mut self, handle: RegistryHandle) -> bool {
        let Some(key) = self.owners.remove(&handle) else {
            return false;
        };

        if let Some(list) = self.lists.get_mut(&key) {
            list.retain(|entry| entry.handle != handle && entry.binding.strong_count() > 0);
            if list.is_empty() {
                self.lists.remove(&key);
            }
        }
        true
    }

    fn live(&self, key: &KeyId, out: &mut Vec<Arc<BindingCore>>) {
        if let Some(list) = self.lists.get(key) {
            out.extend(list.iter().filter_map(|entry| entry.binding.upgrade()));
        }
    }
}

/// Guard holding the registry's reentrant lock
///
/// While held, no other thread can read or mutate the registry; the owning
/// thread may still call any registry method.
#[must_use = "the registry is unlocked as soon as the guard drops"]
pub struct RegistryGuard<'a>(#[allow(dead_code)] ReentrantMutexGuard<'a, RefCell<RegistryInner>>);

/// Key to ordered binding list, guarded by one reentrant lock
///
/// The lock is reentrant so that a callback running on the dispatching
/// thread can enable, disable or rebind bindings. No `RefCell` borrow is
/// held outside the methods of this type, and user code never runs while
/// one is.
pub struct CallbackRegistry {
    inner: ReentrantMutex<RefCell<RegistryInner>>,
}

impl CallbackRegistry {
    pub fn new() -> Self {
        Self {
            inner: ReentrantMutex::new(RefCell::new(RegistryInner::default())),
        }
    }

    /// Hold the registry lock across several operations
    ///
    /// Lookups made by the dispatcher on other threads wait until the guard
    /// drops, so they observe either the state before or after the sequence.
    pub fn lock(&self) -> RegistryGuard<'_> {
        RegistryGuard(self.inner.lock())
    }

    fn with_inner<R>(&self, f: impl FnOnce(&mut RegistryInner) -> R) -> R {
        let guard = self.inner.lock();
        let mut inner = guard.borrow_mut();
        f(&mut inner)
    }

    /// Append a binding to `key`'s list
    pub fn register(&self, key: KeyId, binding: &Arc<BindingCore>) -> RegistryHandle {
        self.with_inner(|inner| {
            let handle = RegistryHandle(inner.next_handle);
            inner.next_handle += 1;

            inner
                .lists
                .entry(key.clone())
                .or_default()
                .push(RegistryEntry {
                    handle,
                    binding: Arc::downgrade(binding),
                });
            inner.owners.insert(handle, key);
            handle
        })
    }

    /// Remove the registration behind `handle`
    ///
    /// Unknown or already-removed handles are ignored. Returns whether
    /// anything was removed.
    pub fn deregister(&self, handle: RegistryHandle) -> bool {
        self.with_inner(|inner| inner.remove(handle))
    }

    /// Remove every registration on `key` (the wildcard clears only wildcard bindings)
    pub fn deregister_key(&self, key: &KeyId) -> usize {
        self.with_inner(|inner| {
            let Some(list) = inner.lists.remove(key) else {
                return 0;
            };
            for entry in &list {
                inner.owners.remove(&entry.handle);
            }
            list.len()
        })
    }

    /// Drop all registrations
    ///
    /// Bindings that still believe they are registered will find their
    /// handles unknown on `disable()`, which is a no-op.
    pub fn reset(&self) {
        self.with_inner(|inner| {
            inner.lists.clear();
            inner.owners.clear();
        });
    }

    /// Snapshot of the live bindings registered on exactly `key`
    pub fn lookup(&self, key: &KeyId) -> Vec<Arc<BindingCore>> {
        self.with_inner(|inner| {
            let mut out = Vec::new();
            inner.live(key, &mut out);
            out
        })
    }

    /// Snapshot of every binding an event on `key` reaches
    ///
    /// Wildcard bindings come first, then `key`'s own, each group in
    /// registration order.
    pub fn lookup_event(&self, key: &KeyId) -> Vec<Arc<BindingCore>> {
        self.with_inner(|inner| {
            let mut out = Vec::new();
            inner.live(&KeyId::ANY, &mut out);
            if !key.is_wildcard() {
                inner.live(key, &mut out);
            }
            out
        })
    }

    /// Check if `handle` is still registered
    pub fn contains(&self, handle: RegistryHandle) -> bool {
        self.with_inner(|inner| inner.owners.contains_key(&handle))
    }

    /// Number of registrations on exactly `key`
    pub fn bindings_for(&self, key: &KeyId) -> usize {
        self.with_inner(|inner| inner.lists.get(key).map_or(0, Vec::len))
    }

    /// Total number of registrations
    pub fn len(&self) -> usize {
        self.with_inner(|inner| inner.owners.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Keys with at least one registration, sorted
    pub fn keys(&self) -> Vec<KeyId> {
        let mut keys: Vec<KeyId> = self.with_inner(|inner| inner.lists.keys().cloned().collect());
        keys.sort();
        keys
    }
}

impl Default for CallbackRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for CallbackRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CallbackRegistry")
            .field("registrations", &self.len())
            .finish()
    }
}

//! Raw key-event hook: the alternative to the tick-diff path
//!
//! Engines that expose a native per-event input hook deliver press/release
//! transitions directly. [`RawKeyHook`] is the seam bindings register
//! through; [`RawHookTable`] is an in-process implementation a host's native
//! detour can feed with [`RawHookTable::on_input_event`].

use std::collections::HashMap;
use std::fmt;

use parking_lot::Mutex;

use super::callback::{invoke_isolated, EventFlow, KeyCallback, Outcome};
use super::dispatch::FireReport;
use super::types::{EventFilter, EventKind, InputContext, KeyId};

/// Token for a registration with a raw key hook
///
/// Bindings store it only to hand it back on deregistration.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct NativeHandle(u64);

impl NativeHandle {
    /// Wrap a token issued by a native hook implementation
    pub const fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    pub const fn into_raw(self) -> u64 {
        self.0
    }
}

/// A lower-level input hook that bindings can register with directly
pub trait RawKeyHook: Send + Sync {
    /// Register `callback` for events on `key` ([`KeyId::ANY`] for every key)
    fn register_raw_key_hook(
        &self,
        key: &KeyId,
        filter: EventFilter,
        context: InputContext,
        callback: KeyCallback,
    ) -> NativeHandle;

    /// Release a registration; unknown handles are ignored
    fn deregister_raw_key_hook(&self, handle: NativeHandle);

    /// Move a registration to `key`, returning its new handle
    ///
    /// The default releases and registers in two calls. Hooks that dispatch
    /// on their own threads should override it so no event sees the
    /// registration under neither key.
    fn rebind_raw_key_hook(
        &self,
        handle: NativeHandle,
        key: &KeyId,
        filter: EventFilter,
        context: InputContext,
        callback: KeyCallback,
    ) -> NativeHandle {
        self.deregister_raw_key_hook(handle);
        self.register_raw_key_hook(key, filter, context, callback)
    }
}

struct RawEntry {
    handle: NativeHandle,
    key: KeyId,
    filter: EventFilter,
    context: InputContext,
    callback: KeyCallback,
}

#[derive(Default)]
struct TableState {
    next_handle: u64,
    entries: Vec<RawEntry>,
    /// Last event delivered per key, to drop repeated identical events
    last_event: HashMap<KeyId, EventKind>,
}

impl TableState {
    /// Append an entry; it goes last in its key's firing order
    fn push(
        &mut self,
        key: &KeyId,
        filter: EventFilter,
        context: InputContext,
        callback: KeyCallback,
    ) -> NativeHandle {
        let handle = NativeHandle(self.next_handle);
        self.next_handle += 1;
        self.entries.push(RawEntry {
            handle,
            key: key.clone(),
            filter,
            context,
            callback,
        });
        handle
    }
}

/// In-process raw key hook
///
/// Wildcard registrations run before key registrations, each in
/// registration order. A second identical event for a key (say, two presses
/// with no release between them) is suppressed.
#[derive(Default)]
pub struct RawHookTable {
    state: Mutex<TableState>,
    full_trace: bool,
}

impl RawHookTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Log the full error chain of failing callbacks
    pub fn with_full_trace(mut self, full_trace: bool) -> Self {
        self.full_trace = full_trace;
        self
    }

    /// Deliver one native input event
    ///
    /// Returns `None` when the event repeats the previous one for this key
    /// and was suppressed.
    pub fn on_input_event(
        &self,
        key: &KeyId,
        kind: EventKind,
        context: InputContext,
    ) -> Option<FireReport> {
        let callbacks: Vec<KeyCallback> = {
            let mut state = self.state.lock();
            if state.last_event.get(key) == Some(&kind) {
                tracing::trace!(key = %key, event = %kind, "Repeated raw event suppressed");
                return None;
            }
            state.last_event.insert(key.clone(), kind);

            let wildcard = state.entries.iter().filter(|e| e.key.is_wildcard());
            let specific = state
                .entries
                .iter()
                .filter(|e| !key.is_wildcard() && e.key == *key);
            wildcard
                .chain(specific)
                .filter(|e| e.context == context && e.filter.matches(kind))
                .map(|e| e.callback.clone())
                .collect()
        };

        let mut report = FireReport::default();
        for callback in &callbacks {
            report.invoked += 1;
            match invoke_isolated(callback, key, kind, self.full_trace) {
                Outcome::Completed(EventFlow::Continue) => {}
                Outcome::Completed(EventFlow::Block) => {
                    report.blocked = true;
                    break;
                }
                Outcome::Failed => report.failed += 1,
            }
        }
        Some(report)
    }

    /// Remove every registration on exactly `key`
    pub fn deregister_key(&self, key: &KeyId) -> usize {
        self.take_where(|e| e.key == *key).len()
    }

    /// Remove every registration and forget the last events seen
    pub fn clear(&self) {
        let removed = {
            let mut state = self.state.lock();
            state.last_event.clear();
            std::mem::take(&mut state.entries)
        };
        drop(removed);
    }

    /// Detach matching entries; they are dropped after the lock is released
    /// since dropping a callback may run user code.
    fn take_where(&self, pred: impl Fn(&RawEntry) -> bool) -> Vec<RawEntry> {
        let mut state = self.state.lock();
        let (removed, kept): (Vec<_>, Vec<_>) = std::mem::take(&mut state.entries)
            .into_iter()
            .partition(|e| pred(e));
        state.entries = kept;
        removed
    }

    pub fn len(&self) -> usize {
        self.state.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl RawKeyHook for RawHookTable {
    fn register_raw_key_hook(
        &self,
        key: &KeyId,
        filter: EventFilter,
        context: InputContext,
        callback: KeyCallback,
    ) -> NativeHandle {
        self.state.lock().push(key, filter, context, callback)
    }

    fn deregister_raw_key_hook(&self, handle: NativeHandle) {
        self.take_where(|e| e.handle == handle);
    }

    fn rebind_raw_key_hook(
        &self,
        handle: NativeHandle,
        key: &KeyId,
        filter: EventFilter,
        context: InputContext,
        callback: KeyCallback,
    ) -> NativeHandle {
        let (new_handle, old) = {
            let mut state = self.state.lock();
            let old = state
                .entries
                .iter()
                .position(|e| e.handle == handle)
                .map(|idx| state.entries.remove(idx));
            (state.push(key, filter, context, callback), old)
        };
        drop(old);
        new_handle
    }
}

impl fmt::Debug for RawHookTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RawHookTable")
            .field("entries", &self.len())
            .field("full_trace", &self.full_trace)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn key(name: &str) -> KeyId {
        KeyId::new(name).unwrap()
    }

    fn recorder(log: &Arc<Mutex<Vec<String>>>, tag: &'static str) -> KeyCallback {
        let log = log.clone();
        KeyCallback::with_event_and_key(move |event, key: &KeyId| {
            log.lock().push(format!("{}:{}:{}", tag, key, event));
        })
    }

    #[test]
    fn test_wildcard_first_then_key() {
        let table = RawHookTable::new();
        let log = Arc::new(Mutex::new(Vec::new()));
        table.register_raw_key_hook(
            &key("A"),
            EventFilter::Any,
            InputContext::Gameplay,
            recorder(&log, "key"),
        );
        table.register_raw_key_hook(
            &KeyId::ANY,
            EventFilter::Any,
            InputContext::Gameplay,
            recorder(&log, "any"),
        );

        let report = table
            .on_input_event(&key("A"), EventKind::Pressed, InputContext::Gameplay)
            .unwrap();
        assert_eq!(report.invoked, 2);
        assert_eq!(*log.lock(), ["any:A:Pressed", "key:A:Pressed"]);
    }

    #[test]
    fn test_repeated_event_suppressed() {
        let table = RawHookTable::new();
        let a = key("A");
        assert!(table
            .on_input_event(&a, EventKind::Pressed, InputContext::Gameplay)
            .is_some());
        assert!(table
            .on_input_event(&a, EventKind::Pressed, InputContext::Gameplay)
            .is_none());
        assert!(table
            .on_input_event(&a, EventKind::Released, InputContext::Gameplay)
            .is_some());
    }

    #[test]
    fn test_context_and_filter_respected() {
        let table = RawHookTable::new();
        let log = Arc::new(Mutex::new(Vec::new()));
        table.register_raw_key_hook(
            &key("A"),
            EventFilter::Released,
            InputContext::Gameplay,
            recorder(&log, "released"),
        );
        table.register_raw_key_hook(
            &key("A"),
            EventFilter::Any,
            InputContext::Menu,
            recorder(&log, "menu"),
        );

        table.on_input_event(&key("A"), EventKind::Pressed, InputContext::Gameplay);
        assert!(log.lock().is_empty());

        table.on_input_event(&key("A"), EventKind::Released, InputContext::Gameplay);
        assert_eq!(*log.lock(), ["released:A:Released"]);
    }

    #[test]
    fn test_block_stops_chain() {
        let table = RawHookTable::new();
        let log = Arc::new(Mutex::new(Vec::new()));
        table.register_raw_key_hook(
            &KeyId::ANY,
            EventFilter::Any,
            InputContext::Gameplay,
            KeyCallback::no_args(|| EventFlow::Block),
        );
        table.register_raw_key_hook(
            &key("A"),
            EventFilter::Any,
            InputContext::Gameplay,
            recorder(&log, "key"),
        );

        let report = table
            .on_input_event(&key("A"), EventKind::Pressed, InputContext::Gameplay)
            .unwrap();
        assert!(report.blocked);
        assert_eq!(report.invoked, 1);
        assert!(log.lock().is_empty());
    }

    #[test]
    fn test_rebind_moves_entry_to_new_key() {
        let table = RawHookTable::new();
        let log = Arc::new(Mutex::new(Vec::new()));
        let handle = table.register_raw_key_hook(
            &key("A"),
            EventFilter::Any,
            InputContext::Gameplay,
            recorder(&log, "moved"),
        );

        let moved = table.rebind_raw_key_hook(
            handle,
            &key("B"),
            EventFilter::Any,
            InputContext::Gameplay,
            recorder(&log, "moved"),
        );
        assert_ne!(moved, handle);
        assert_eq!(table.len(), 1);

        table.on_input_event(&key("A"), EventKind::Pressed, InputContext::Gameplay);
        table.on_input_event(&key("B"), EventKind::Pressed, InputContext::Gameplay);
        assert_eq!(*log.lock(), ["moved:B:Pressed"]);

        // The old handle no longer names anything
        table.deregister_raw_key_hook(handle);
        assert_eq!(table.len(), 1);
    }

    /// Hook relying on the default rebind
    struct Forwarding(RawHookTable);

    impl RawKeyHook for Forwarding {
        fn register_raw_key_hook(
            &self,
            key: &KeyId,
            filter: EventFilter,
            context: InputContext,
            callback: KeyCallback,
        ) -> NativeHandle {
            self.0.register_raw_key_hook(key, filter, context, callback)
        }

        fn deregister_raw_key_hook(&self, handle: NativeHandle) {
            self.0.deregister_raw_key_hook(handle);
        }
    }

    #[test]
    fn test_default_rebind_releases_then_registers() {
        let hook = Forwarding(RawHookTable::new());
        let handle = hook.register_raw_key_hook(
            &key("A"),
            EventFilter::Any,
            InputContext::Gameplay,
            KeyCallback::no_args(|| ()),
        );

        hook.rebind_raw_key_hook(
            handle,
            &key("B"),
            EventFilter::Any,
            InputContext::Gameplay,
            KeyCallback::no_args(|| ()),
        );
        assert_eq!(hook.0.len(), 1);
        assert_eq!(hook.0.deregister_key(&key("A")), 0);
        assert_eq!(hook.0.deregister_key(&key("B")), 1);
    }

    #[test]
    fn test_deregister() {
        let table = RawHookTable::new();
        let handle = table.register_raw_key_hook(
            &key("A"),
            EventFilter::Any,
            InputContext::Gameplay,
            KeyCallback::no_args(|| ()),
        );
        table.register_raw_key_hook(
            &key("B"),
            EventFilter::Any,
            InputContext::Gameplay,
            KeyCallback::no_args(|| ()),
        );

        table.deregister_raw_key_hook(handle);
        table.deregister_raw_key_hook(handle);
        assert_eq!(table.len(), 1);

        assert_eq!(table.deregister_key(&key("B")), 1);
        assert!(table.is_empty());
    }
}

//! Bindings and their enable/disable/rebind lifecycle

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use super::callback::KeyCallback;
use super::raw_hook::{NativeHandle, RawKeyHook};
use super::registry::{CallbackRegistry, RegistryHandle};
use super::types::{EventFilter, EventKind, InputContext, KeyId};

/// The part of a binding the dispatcher sees
///
/// Shared between the owning [`Binding`] and the registry, which only holds a
/// weak reference to it.
pub struct BindingCore {
    filter: EventFilter,
    callback: Option<KeyCallback>,
    context: InputContext,
    enabled: AtomicBool,
}

impl BindingCore {
    pub(crate) fn new(
        filter: EventFilter,
        callback: Option<KeyCallback>,
        context: InputContext,
    ) -> Self {
        Self {
            filter,
            callback,
            context,
            enabled: AtomicBool::new(false),
        }
    }

    pub fn filter(&self) -> EventFilter {
        self.filter
    }

    pub fn callback(&self) -> Option<&KeyCallback> {
        self.callback.as_ref()
    }

    pub fn context(&self) -> InputContext {
        self.context
    }

    #[inline]
    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::Acquire)
    }

    /// Check if an event of `kind` should reach this binding right now
    #[inline]
    pub fn accepts(&self, kind: EventKind) -> bool {
        self.is_enabled() && self.callback.is_some() && self.filter.matches(kind)
    }

    pub(crate) fn set_enabled(&self, enabled: bool) {
        self.enabled.store(enabled, Ordering::Release);
    }
}

impl fmt::Debug for BindingCore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BindingCore")
            .field("filter", &self.filter)
            .field("callback", &self.callback)
            .field("context", &self.context)
            .field("enabled", &self.is_enabled())
            .finish()
    }
}

/// Where enabled bindings are registered
#[derive(Clone)]
pub(crate) enum Route {
    /// The registry, fed by the per-tick snapshot diff
    TickDiff,
    /// An external raw key-event hook
    RawHook(Arc<dyn RawKeyHook>),
}

/// State every binding created by one input system shares
pub(crate) struct LifecycleContext {
    pub(crate) registry: Arc<CallbackRegistry>,
    pub(crate) route: Route,
}

enum Registration {
    Registry(RegistryHandle),
    Native {
        handle: NativeHandle,
        hook: Arc<dyn RawKeyHook>,
    },
}

/// Enable, disable and rebind operations on a binding
pub trait Lifecycle {
    /// Mark enabled and register, unless the binding has no key or callback
    fn enable(&mut self);
    /// Mark disabled and release any registration; idempotent
    fn disable(&mut self);
    /// Move to `new_key` (`None` unbinds), re-registering only if enabled
    fn rebind(&mut self, new_key: Option<KeyId>);
    fn is_enabled(&self) -> bool;
}

/// One registered interest in a key, owned by mod code
///
/// Starts disabled. Dropping a binding disables it.
pub struct Binding {
    key: Option<KeyId>,
    core: Arc<BindingCore>,
    ctx: Arc<LifecycleContext>,
    registration: Option<Registration>,
}

impl Binding {
    pub(crate) fn new(
        ctx: Arc<LifecycleContext>,
        key: Option<KeyId>,
        filter: EventFilter,
        context: InputContext,
        callback: Option<KeyCallback>,
    ) -> Self {
        Self {
            key,
            core: Arc::new(BindingCore::new(filter, callback, context)),
            ctx,
            registration: None,
        }
    }

    /// Bound key; `None` means unbound
    pub fn key(&self) -> Option<&KeyId> {
        self.key.as_ref()
    }

    pub fn filter(&self) -> EventFilter {
        self.core.filter()
    }

    pub fn context(&self) -> InputContext {
        self.core.context()
    }

    pub fn callback(&self) -> Option<&KeyCallback> {
        self.core.callback()
    }

    /// Check if the binding has no key or no callback and so can never fire
    pub fn is_inert(&self) -> bool {
        self.key.is_none() || self.core.callback().is_none()
    }

    /// Check if the binding currently holds a live registration
    ///
    /// A registry handle forgotten by [`CallbackRegistry::reset`] does not count.
    pub fn is_registered(&self) -> bool {
        match &self.registration {
            Some(Registration::Registry(handle)) => self.ctx.registry.contains(*handle),
            Some(Registration::Native { .. }) => true,
            None => false,
        }
    }

    /// Handle in the callback registry, when routed through the tick diff
    pub fn registry_handle(&self) -> Option<RegistryHandle> {
        match &self.registration {
            Some(Registration::Registry(handle)) => Some(*handle),
            _ => None,
        }
    }

    /// Handle issued by the raw key hook, when routed through it
    pub fn native_handle(&self) -> Option<NativeHandle> {
        match &self.registration {
            Some(Registration::Native { handle, .. }) => Some(*handle),
            _ => None,
        }
    }

    /// Register under the current key; caller holds the registry lock
    fn register(&mut self) {
        if let Some(Registration::Registry(handle)) = &self.registration {
            if !self.ctx.registry.contains(*handle) {
                tracing::debug!(handle = ?handle, "Registry forgot binding, registering again");
                self.registration = None;
            }
        }
        if self.registration.is_some() {
            return;
        }

        let (Some(key), Some(callback)) = (self.key.clone(), self.core.callback()) else {
            tracing::trace!("Enable on inert binding ignored");
            return;
        };

        let registration = match &self.ctx.route {
            Route::TickDiff => {
                Registration::Registry(self.ctx.registry.register(key.clone(), &self.core))
            }
            Route::RawHook(hook) => {
                let handle = hook.register_raw_key_hook(
                    &key,
                    self.core.filter(),
                    self.core.context(),
                    callback.clone(),
                );
                Registration::Native {
                    handle,
                    hook: hook.clone(),
                }
            }
        };

        tracing::debug!(key = %key, filter = ?self.core.filter(), "Binding registered");
        self.registration = Some(registration);
    }

    /// Drop the registration and clear the stored handle; caller holds the lock
    fn release(&mut self) {
        match self.registration.take() {
            Some(Registration::Registry(handle)) => {
                self.ctx.registry.deregister(handle);
            }
            Some(Registration::Native { handle, hook }) => {
                hook.deregister_raw_key_hook(handle);
            }
            None => return,
        }

        if let Some(key) = &self.key {
            tracing::debug!(key = %key, "Binding released");
        }
    }
}

impl Lifecycle for Binding {
    fn enable(&mut self) {
        let registry = self.ctx.registry.clone();
        let _guard = registry.lock();

        self.core.set_enabled(true);
        self.register();
    }

    fn disable(&mut self) {
        let registry = self.ctx.registry.clone();
        let _guard = registry.lock();

        self.core.set_enabled(false);
        self.release();
    }

    fn rebind(&mut self, new_key: Option<KeyId>) {
        // One critical section: dispatch sees the old key or the new, never both or neither
        let registry = self.ctx.registry.clone();
        let _guard = registry.lock();

        // Raw hooks get the swap in one call so their own dispatch never sees a gap
        let swapped = match (&self.registration, &new_key, self.core.callback()) {
            (Some(Registration::Native { handle, hook }), Some(key), Some(callback)) => {
                let handle = hook.rebind_raw_key_hook(
                    *handle,
                    key,
                    self.core.filter(),
                    self.core.context(),
                    callback.clone(),
                );
                Some(Registration::Native {
                    handle,
                    hook: hook.clone(),
                })
            }
            _ => None,
        };
        if let Some(registration) = swapped {
            tracing::debug!(from = ?self.key, to = ?new_key, "Raw binding rebound");
            self.registration = Some(registration);
            self.key = new_key;
            return;
        }

        self.release();
        self.key = new_key;
        if self.core.is_enabled() {
            self.register();
        }
    }

    fn is_enabled(&self) -> bool {
        self.core.is_enabled()
    }
}

impl Drop for Binding {
    fn drop(&mut self) {
        self.disable();
    }
}

impl fmt::Debug for Binding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Binding")
            .field("key", &self.key)
            .field("core", &self.core)
            .field("registry_handle", &self.registry_handle())
            .field("native_handle", &self.native_handle())
            .finish()
    }
}

/// Builder for a [`Binding`], created by `InputSystem::bind`
#[must_use]
pub struct BindingBuilder {
    ctx: Arc<LifecycleContext>,
    key: Option<KeyId>,
    filter: EventFilter,
    context: InputContext,
    callback: Option<KeyCallback>,
}

impl BindingBuilder {
    pub(crate) fn new(ctx: Arc<LifecycleContext>, key: Option<KeyId>) -> Self {
        Self {
            ctx,
            key,
            filter: EventFilter::Any,
            context: InputContext::Gameplay,
            callback: None,
        }
    }

    pub fn filter(mut self, filter: EventFilter) -> Self {
        self.filter = filter;
        self
    }

    /// Only fire on presses
    pub fn on_pressed(self) -> Self {
        self.filter(EventFilter::Pressed)
    }

    /// Only fire on releases
    pub fn on_released(self) -> Self {
        self.filter(EventFilter::Released)
    }

    pub fn context(mut self, context: InputContext) -> Self {
        self.context = context;
        self
    }

    pub fn callback(mut self, callback: KeyCallback) -> Self {
        self.callback = Some(callback);
        self
    }

    /// Create the binding, disabled
    pub fn build(self) -> Binding {
        Binding::new(self.ctx, self.key, self.filter, self.context, self.callback)
    }

    /// Create the binding and enable it
    pub fn enable(self) -> Binding {
        let mut binding = self.build();
        binding.enable();
        binding
    }
}

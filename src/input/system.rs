//! Host-facing facade: one per-tick entry point plus binding creation

use std::sync::Arc;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::config::InputConfig;
use crate::error::{InputError, Result};

use super::binding::{Binding, BindingBuilder, LifecycleContext, Route};
use super::callback::KeyCallback;
use super::dispatch::{Dispatcher, TickReport};
use super::edge::EdgeDetector;
use super::raw_hook::RawKeyHook;
use super::registry::CallbackRegistry;
use super::snapshot::KeySnapshot;
use super::types::{EventFilter, KeyId};

/// Where enabled bindings get registered
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DispatchRoute {
    /// The callback registry, fed by [`InputSystem::on_tick`]
    #[default]
    TickDiff,
    /// A [`RawKeyHook`] supplied by the host
    RawHook,
}

/// The input subsystem of one host
///
/// Owns the registry, the dispatcher and the edge detector. Bindings created
/// here share the system's lifecycle context and outlive nothing but
/// themselves: dropping a binding disables it.
pub struct InputSystem {
    ctx: Arc<LifecycleContext>,
    dispatcher: Dispatcher,
    detector: Mutex<EdgeDetector>,
}

impl InputSystem {
    /// Tick-diff system with default settings
    pub fn new() -> Self {
        let registry = Arc::new(CallbackRegistry::new());
        Self::assemble(&InputConfig::default(), registry, Route::TickDiff)
    }

    /// System configured from `config`
    ///
    /// Fails with [`InputError::MissingRawHook`] when the config asks for the
    /// raw-hook route, since no hook was supplied.
    pub fn with_config(config: &InputConfig) -> Result<Self> {
        Self::build(config, None)
    }

    /// System configured from `config`, with a raw hook for the raw-hook route
    ///
    /// The hook is only used when `config.route` selects it.
    pub fn with_raw_hook(config: &InputConfig, hook: Arc<dyn RawKeyHook>) -> Result<Self> {
        Self::build(config, Some(hook))
    }

    fn build(config: &InputConfig, hook: Option<Arc<dyn RawKeyHook>>) -> Result<Self> {
        let route = match (config.route, hook) {
            (DispatchRoute::TickDiff, hook) => {
                if hook.is_some() {
                    tracing::debug!("Raw key hook supplied but tick-diff route selected");
                }
                Route::TickDiff
            }
            (DispatchRoute::RawHook, Some(hook)) => Route::RawHook(hook),
            (DispatchRoute::RawHook, None) => return Err(InputError::MissingRawHook),
        };

        let registry = Arc::new(CallbackRegistry::new());
        Ok(Self::assemble(config, registry, route))
    }

    fn assemble(config: &InputConfig, registry: Arc<CallbackRegistry>, route: Route) -> Self {
        tracing::info!(
            route = ?config.route,
            full_trace = config.full_trace,
            log_events = config.log_events,
            "Input system ready"
        );

        let dispatcher = Dispatcher::new(registry.clone())
            .with_full_trace(config.full_trace)
            .with_event_logging(config.log_events);
        Self {
            ctx: Arc::new(LifecycleContext { registry, route }),
            dispatcher,
            detector: Mutex::new(EdgeDetector::new()),
        }
    }

    pub fn route(&self) -> DispatchRoute {
        match self.ctx.route {
            Route::TickDiff => DispatchRoute::TickDiff,
            Route::RawHook(_) => DispatchRoute::RawHook,
        }
    }

    pub fn registry(&self) -> &Arc<CallbackRegistry> {
        &self.ctx.registry
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    /// Start building a binding on `key`
    pub fn bind(&self, key: KeyId) -> BindingBuilder {
        BindingBuilder::new(self.ctx.clone(), Some(key))
    }

    /// Start building a binding with no key yet
    pub fn unbound(&self) -> BindingBuilder {
        BindingBuilder::new(self.ctx.clone(), None)
    }

    /// Create a disabled gameplay binding in one call
    pub fn binding(
        &self,
        key: Option<KeyId>,
        filter: EventFilter,
        callback: Option<KeyCallback>,
    ) -> Binding {
        let builder = BindingBuilder::new(self.ctx.clone(), key).filter(filter);
        match callback {
            Some(callback) => builder.callback(callback).build(),
            None => builder.build(),
        }
    }

    /// Per-tick entry point
    ///
    /// `None` means the host could not capture input this tick: the held set
    /// is forgotten without emitting events. Callbacks run after the detector
    /// lock is released, so they may call back into the system.
    pub fn on_tick(&self, snapshot: Option<KeySnapshot>) -> TickReport {
        let edges = self.detector.lock().advance(snapshot);
        if edges.is_empty() {
            return TickReport {
                edges,
                ..TickReport::default()
            };
        }
        self.dispatcher.dispatch(edges)
    }

    /// Keys held as of the last tick
    pub fn held_keys(&self) -> KeySnapshot {
        self.detector.lock().previous().clone()
    }

    /// Forget held keys; the next tick presses everything it reports
    pub fn reset(&self) {
        self.detector.lock().reset();
    }
}

impl Default for InputSystem {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for InputSystem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InputSystem")
            .field("route", &self.route())
            .field("registry", &self.ctx.registry)
            .field("held", &self.held_keys())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::raw_hook::RawHookTable;
    use crate::input::Lifecycle;

    fn raw_config() -> InputConfig {
        InputConfig {
            route: DispatchRoute::RawHook,
            ..InputConfig::default()
        }
    }

    #[test]
    fn test_raw_route_without_hook_fails() {
        let result = InputSystem::with_config(&raw_config());
        assert!(matches!(result, Err(InputError::MissingRawHook)));
    }

    #[test]
    fn test_raw_route_registers_with_hook() {
        let table = Arc::new(RawHookTable::new());
        let system = InputSystem::with_raw_hook(&raw_config(), table.clone()).unwrap();
        assert_eq!(system.route(), DispatchRoute::RawHook);

        let mut binding = system
            .bind(KeyId::new("F5").unwrap())
            .callback(KeyCallback::no_args(|| ()))
            .enable();
        assert!(binding.native_handle().is_some());
        assert_eq!(table.len(), 1);
        assert!(system.registry().is_empty());

        binding.disable();
        assert!(table.is_empty());
    }

    #[test]
    fn test_hook_ignored_on_tick_route() {
        let table = Arc::new(RawHookTable::new());
        let system = InputSystem::with_raw_hook(&InputConfig::default(), table.clone()).unwrap();
        assert_eq!(system.route(), DispatchRoute::TickDiff);

        let _binding = system
            .bind(KeyId::new("F5").unwrap())
            .callback(KeyCallback::no_args(|| ()))
            .enable();
        assert!(table.is_empty());
        assert_eq!(system.registry().len(), 1);
    }

    #[test]
    fn test_held_keys_and_reset() {
        let system = InputSystem::new();
        system.on_tick(Some(KeySnapshot::from_names(["A", "B"])));
        assert_eq!(system.held_keys().len(), 2);

        system.reset();
        assert!(system.held_keys().is_empty());
        let report = system.on_tick(Some(KeySnapshot::from_names(["A"])));
        assert_eq!(report.edges.pressed.len(), 1);
    }

    #[test]
    fn test_binding_without_callback_is_inert() {
        let system = InputSystem::new();
        let mut binding = system.binding(Some(KeyId::new("A").unwrap()), EventFilter::Any, None);
        binding.enable();
        assert!(binding.is_inert());
        assert!(system.registry().is_empty());
    }
}

//! Fan-out of edge events to registered bindings

use std::sync::Arc;

use super::callback::{invoke_isolated, EventFlow, Outcome};
use super::edge::KeyEdges;
use super::registry::CallbackRegistry;
use super::types::{EventKind, KeyId};

/// What firing one event did
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FireReport {
    /// Callbacks called (including ones that failed)
    pub invoked: usize,
    /// Callbacks that returned an error or panicked
    pub failed: usize,
    /// A callback returned [`EventFlow::Block`]
    pub blocked: bool,
}

/// What dispatching one tick did
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TickReport {
    pub edges: KeyEdges,
    pub invoked: usize,
    pub failed: usize,
    /// Events whose chain was cut short by a blocking callback
    pub blocked: usize,
}

impl TickReport {
    fn absorb(&mut self, fire: FireReport) {
        self.invoked += fire.invoked;
        self.failed += fire.failed;
        if fire.blocked {
            self.blocked += 1;
        }
    }
}

/// Delivers events to the bindings the registry holds for them
///
/// The registry lock is held only while the matching bindings are copied
/// out; callbacks run unlocked. A binding disabled by another thread after
/// the copy is re-checked right before its call, but one whose call already
/// started cannot be un-fired.
#[derive(Debug, Clone)]
pub struct Dispatcher {
    registry: Arc<CallbackRegistry>,
    full_trace: bool,
    log_events: bool,
}

impl Dispatcher {
    pub fn new(registry: Arc<CallbackRegistry>) -> Self {
        Self {
            registry,
            full_trace: false,
            log_events: false,
        }
    }

    /// Log the full error chain of failing callbacks
    pub fn with_full_trace(mut self, full_trace: bool) -> Self {
        self.full_trace = full_trace;
        self
    }

    /// Log every fired event at info instead of debug
    pub fn with_event_logging(mut self, log_events: bool) -> Self {
        self.log_events = log_events;
        self
    }

    pub fn registry(&self) -> &Arc<CallbackRegistry> {
        &self.registry
    }

    pub fn full_trace(&self) -> bool {
        self.full_trace
    }

    pub fn logs_events(&self) -> bool {
        self.log_events
    }

    /// Fire one event: wildcard bindings first, then `key`'s own
    pub fn fire(&self, key: &KeyId, kind: EventKind) -> FireReport {
        let bindings = self.registry.lookup_event(key);

        if self.log_events {
            tracing::info!(key = %key, event = %kind, bindings = bindings.len(), "Key event");
        } else {
            tracing::debug!(key = %key, event = %kind, bindings = bindings.len(), "Key event");
        }

        let mut report = FireReport::default();
        for binding in &bindings {
            if !binding.accepts(kind) {
                continue;
            }
            let Some(callback) = binding.callback() else {
                continue;
            };

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
        report
    }

    /// Fire every press, then every release, of one tick
    pub fn dispatch(&self, edges: KeyEdges) -> TickReport {
        let mut report = TickReport::default();
        for (key, kind) in edges.events() {
            report.absorb(self.fire(key, kind));
        }
        report.edges = edges;
        report
    }
}

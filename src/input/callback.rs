//! Callbacks with an arity fixed at construction

use std::any::Any;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use crate::error::InputError;

use super::types::{EventKind, KeyId};

/// What the remaining callbacks for the current event should do
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum EventFlow {
    #[default]
    Continue,
    /// Skip the rest of this event's callbacks (other events are unaffected)
    Block,
}

/// Return types accepted from user callbacks
pub trait IntoFlow {
    fn into_flow(self) -> anyhow::Result<EventFlow>;
}

impl IntoFlow for () {
    fn into_flow(self) -> anyhow::Result<EventFlow> {
        Ok(EventFlow::Continue)
    }
}

impl IntoFlow for EventFlow {
    fn into_flow(self) -> anyhow::Result<EventFlow> {
        Ok(self)
    }
}

impl IntoFlow for anyhow::Result<()> {
    fn into_flow(self) -> anyhow::Result<EventFlow> {
        self.map(|()| EventFlow::Continue)
    }
}

impl IntoFlow for anyhow::Result<EventFlow> {
    fn into_flow(self) -> anyhow::Result<EventFlow> {
        self
    }
}

/// The parameter shape a callback was registered with
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CallbackArity {
    NoArgs,
    WithEventKind,
    /// Event kind plus the key that fired; meant for wildcard bindings
    WithEventKindAndKey,
}

impl CallbackArity {
    /// Map a declared parameter count to an arity
    pub fn from_param_count(count: usize) -> Result<Self, InputError> {
        match count {
            0 => Ok(CallbackArity::NoArgs),
            1 => Ok(CallbackArity::WithEventKind),
            2 => Ok(CallbackArity::WithEventKindAndKey),
            n => Err(InputError::UnsupportedCallbackArity(n)),
        }
    }

    pub fn param_count(self) -> usize {
        match self {
            CallbackArity::NoArgs => 0,
            CallbackArity::WithEventKind => 1,
            CallbackArity::WithEventKindAndKey => 2,
        }
    }
}

/// Arguments handed to a callback built with [`KeyCallback::declared`]
///
/// Only the fields covered by the declared arity are populated.
#[derive(Clone, Copy, Debug)]
pub struct CallbackArgs<'a> {
    pub event: Option<EventKind>,
    pub key: Option<&'a KeyId>,
}

type FlowResult = anyhow::Result<EventFlow>;

#[derive(Clone)]
enum CallbackFn {
    NoArgs(Arc<dyn Fn() -> FlowResult + Send + Sync>),
    WithEvent(Arc<dyn Fn(EventKind) -> FlowResult + Send + Sync>),
    WithEventAndKey(Arc<dyn Fn(EventKind, &KeyId) -> FlowResult + Send + Sync>),
}

/// A user callback and the arity it is invoked with
#[derive(Clone)]
pub struct KeyCallback {
    func: CallbackFn,
    label: Arc<str>,
}

impl KeyCallback {
    /// Callback taking no arguments
    pub fn no_args<F, R>(f: F) -> Self
    where
        F: Fn() -> R + Send + Sync + 'static,
        R: IntoFlow,
    {
        Self {
            func: CallbackFn::NoArgs(Arc::new(move || f().into_flow())),
            label: std::any::type_name::<F>().into(),
        }
    }

    /// Callback receiving the firing event kind
    pub fn with_event<F, R>(f: F) -> Self
    where
        F: Fn(EventKind) -> R + Send + Sync + 'static,
        R: IntoFlow,
    {
        Self {
            func: CallbackFn::WithEvent(Arc::new(move |event| f(event).into_flow())),
            label: std::any::type_name::<F>().into(),
        }
    }

    /// Callback receiving the event kind and the key that fired
    pub fn with_event_and_key<F, R>(f: F) -> Self
    where
        F: Fn(EventKind, &KeyId) -> R + Send + Sync + 'static,
        R: IntoFlow,
    {
        Self {
            func: CallbackFn::WithEventAndKey(Arc::new(move |event, key: &KeyId| {
                f(event, key).into_flow()
            })),
            label: std::any::type_name::<F>().into(),
        }
    }

    /// Callback whose shape is only known by its declared parameter count
    ///
    /// For hosts bridging dynamically typed callables. Counts other than
    /// 0, 1 or 2 are rejected here rather than at some later dispatch.
    pub fn declared<F, R>(param_count: usize, f: F) -> Result<Self, InputError>
    where
        F: Fn(CallbackArgs<'_>) -> R + Send + Sync + 'static,
        R: IntoFlow,
    {
        let label: Arc<str> = std::any::type_name::<F>().into();
        let func = match CallbackArity::from_param_count(param_count)? {
            CallbackArity::NoArgs => CallbackFn::NoArgs(Arc::new(move || {
                f(CallbackArgs {
                    event: None,
                    key: None,
                })
                .into_flow()
            })),
            CallbackArity::WithEventKind => CallbackFn::WithEvent(Arc::new(move |event| {
                f(CallbackArgs {
                    event: Some(event),
                    key: None,
                })
                .into_flow()
            })),
            CallbackArity::WithEventKindAndKey => {
                CallbackFn::WithEventAndKey(Arc::new(move |event, key: &KeyId| {
                    f(CallbackArgs {
                        event: Some(event),
                        key: Some(key),
                    })
                    .into_flow()
                }))
            }
        };
        Ok(Self { func, label })
    }

    /// Replace the identity used in log records
    pub fn named(mut self, label: impl Into<Arc<str>>) -> Self {
        self.label = label.into();
        self
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn arity(&self) -> CallbackArity {
        match self.func {
            CallbackFn::NoArgs(_) => CallbackArity::NoArgs,
            CallbackFn::WithEvent(_) => CallbackArity::WithEventKind,
            CallbackFn::WithEventAndKey(_) => CallbackArity::WithEventKindAndKey,
        }
    }

    /// Call with the arguments the arity asks for
    pub fn invoke(&self, key: &KeyId, event: EventKind) -> anyhow::Result<EventFlow> {
        match &self.func {
            CallbackFn::NoArgs(f) => f(),
            CallbackFn::WithEvent(f) => f(event),
            CallbackFn::WithEventAndKey(f) => f(event, key),
        }
    }
}

impl fmt::Debug for KeyCallback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyCallback")
            .field("label", &self.label)
            .field("arity", &self.arity())
            .finish()
    }
}

/// How a single isolated invocation ended
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Outcome {
    Completed(EventFlow),
    Failed,
}

/// Invoke a callback, containing errors and panics
///
/// Failures are logged with the key, event and callback identity and never
/// propagate. With `full_trace` the whole error chain is logged.
pub(crate) fn invoke_isolated(
    callback: &KeyCallback,
    key: &KeyId,
    event: EventKind,
    full_trace: bool,
) -> Outcome {
    match panic::catch_unwind(AssertUnwindSafe(|| callback.invoke(key, event))) {
        Ok(Ok(flow)) => Outcome::Completed(flow),
        Ok(Err(err)) => {
            if full_trace {
                tracing::error!(
                    key = %key,
                    event = %event,
                    callback = callback.label(),
                    "Key callback failed: {:?}",
                    err
                );
            } else {
                tracing::error!(
                    key = %key,
                    event = %event,
                    callback = callback.label(),
                    "Key callback failed: {}",
                    err
                );
            }
            Outcome::Failed
        }
        Err(payload) => {
            tracing::error!(
                key = %key,
                event = %event,
                callback = callback.label(),
                "Key callback panicked: {}",
                panic_message(payload.as_ref())
            );
            Outcome::Failed
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(s) = payload.downcast_ref::<&'static str>() {
        *s
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.as_str()
    } else {
        "non-string panic payload"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn key_a() -> KeyId {
        KeyId::new("A").unwrap()
    }

    #[test]
    fn test_arity_from_param_count() {
        assert_eq!(
            CallbackArity::from_param_count(0).unwrap(),
            CallbackArity::NoArgs
        );
        assert_eq!(
            CallbackArity::from_param_count(2).unwrap(),
            CallbackArity::WithEventKindAndKey
        );
        assert!(matches!(
            CallbackArity::from_param_count(3),
            Err(InputError::UnsupportedCallbackArity(3))
        ));
    }

    #[test]
    fn test_declared_rejects_unsupported_arity() {
        let result = KeyCallback::declared(4, |_args| ());
        assert!(matches!(
            result,
            Err(InputError::UnsupportedCallbackArity(4))
        ));
    }

    #[test]
    fn test_declared_populates_args_by_arity() {
        let cb = KeyCallback::declared(1, |args: CallbackArgs<'_>| {
            assert_eq!(args.event, Some(EventKind::Released));
            assert!(args.key.is_none());
        })
        .unwrap();
        assert_eq!(cb.arity(), CallbackArity::WithEventKind);
        assert_eq!(
            cb.invoke(&key_a(), EventKind::Released).unwrap(),
            EventFlow::Continue
        );
    }

    #[test]
    fn test_with_event_and_key_receives_key() {
        let cb = KeyCallback::with_event_and_key(|event, key: &KeyId| {
            assert_eq!(event, EventKind::Pressed);
            assert_eq!(key.as_str(), "A");
            EventFlow::Block
        });
        assert_eq!(
            cb.invoke(&key_a(), EventKind::Pressed).unwrap(),
            EventFlow::Block
        );
    }

    #[test]
    fn test_error_is_contained() {
        let cb = KeyCallback::no_args(|| -> anyhow::Result<()> { anyhow::bail!("boom") });
        assert_eq!(
            invoke_isolated(&cb, &key_a(), EventKind::Pressed, false),
            Outcome::Failed
        );
    }

    #[test]
    fn test_panic_is_contained() {
        let cb = KeyCallback::no_args::<_, ()>(|| panic!("callback exploded"));
        assert_eq!(
            invoke_isolated(&cb, &key_a(), EventKind::Pressed, true),
            Outcome::Failed
        );
    }

    #[test]
    fn test_no_args_called() {
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = hits.clone();
        let cb = KeyCallback::no_args(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        })
        .named("counter");

        assert_eq!(cb.label(), "counter");
        assert_eq!(
            invoke_isolated(&cb, &key_a(), EventKind::Released, false),
            Outcome::Completed(EventFlow::Continue)
        );
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }
}

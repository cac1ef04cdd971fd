//! Edge-triggered key events for mod code
//!
//! This module turns the host's per-tick list of held keys into discrete
//! `Pressed`/`Released` events and delivers them to registered callbacks:
//! - Diffs consecutive snapshots into press and release edges
//! - Keeps a thread-safe, reentrant key → bindings registry
//! - Isolates failing or panicking callbacks from each other
//! - Manages binding enable/disable/rebind, including from inside callbacks
//!
//! # Architecture
//!
//! ```text
//! host tick → KeySnapshot → EdgeDetector → KeyEdges → Dispatcher → KeyCallback
//!                                                          ↑
//!                               Binding::enable() → CallbackRegistry
//! ```
//!
//! Bindings may instead be routed to a [`RawKeyHook`] when the host exposes
//! native per-event input.
//!
//! # Usage
//!
//! ```ignore
//! let system = InputSystem::new();
//! let _quicksave = system
//!     .bind(KeyId::new("F5")?)
//!     .on_pressed()
//!     .callback(KeyCallback::no_args(|| save_game()))
//!     .enable();
//!
//! // once per tick
//! system.on_tick(Some(KeySnapshot::from_names(host.held_keys())));
//! ```

mod binding;
mod callback;
mod dispatch;
mod edge;
mod raw_hook;
mod registry;
mod snapshot;
mod system;
mod types;

pub use binding::{Binding, BindingBuilder, BindingCore, Lifecycle};
pub use callback::{CallbackArgs, CallbackArity, EventFlow, IntoFlow, KeyCallback};
pub use dispatch::{Dispatcher, FireReport, TickReport};
pub use edge::{EdgeDetector, KeyEdges};
pub use raw_hook::{NativeHandle, RawHookTable, RawKeyHook};
pub use registry::{CallbackRegistry, RegistryGuard, RegistryHandle};
pub use snapshot::KeySnapshot;
pub use system::{DispatchRoute, InputSystem};
pub use types::{EventFilter, EventKind, InputContext, KeyId};

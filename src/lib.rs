//! input-base - edge-triggered key events for game mod hosts
//!
//! This crate turns a polled "keys held this tick" snapshot into discrete
//! press/release events and dispatches them to bindings that mod code can
//! enable, disable and rebind from any thread.

pub mod cli;
pub mod config;
pub mod config_paths;
pub mod error;
pub mod input;
pub mod replay;
pub mod tracing;

// Re-export commonly used types
pub use config::InputConfig;
pub use error::InputError;
pub use input::{
    Binding, EventFilter, EventFlow, EventKind, InputSystem, KeyCallback, KeyId, KeySnapshot,
    Lifecycle,
};

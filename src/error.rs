//! Error type shared by the input subsystem, its config layer and the replay tool

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised by fallible input-base operations
///
/// Dispatch itself never returns these: callback failures are logged and
/// swallowed at the per-callback boundary.
#[derive(Debug, Error)]
pub enum InputError {
    /// A key name that cannot identify any key (empty after trimming)
    #[error("invalid key name: {0:?}")]
    InvalidKey(String),

    /// A callback declared with a parameter count the dispatcher cannot call
    #[error("unsupported callback arity: {0} parameters (expected 0, 1 or 2)")]
    UnsupportedCallbackArity(usize),

    /// Raw-hook routing was requested but no raw-hook collaborator was supplied
    #[error("dispatch route is raw_hook but no raw key hook was provided")]
    MissingRawHook,

    #[error("no config directory available")]
    NoConfigDir,

    #[error("failed to read or write {}: {source}", path.display())]
    ConfigIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    ConfigParse(#[source] serde_yaml::Error),

    #[error("failed to serialize config: {0}")]
    ConfigSerialize(#[source] serde_yaml::Error),

    /// A malformed line in a keytrace tick script
    #[error("script line {line}: {message}")]
    Script { line: usize, message: String },
}

pub type Result<T, E = InputError> = std::result::Result<T, E>;

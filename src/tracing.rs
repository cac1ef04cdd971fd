//! Subscriber setup for hosts embedding input-base and for `keytrace`
//!
//! Two sinks are installed:
//! - stderr, filtered by `RUST_LOG` (falls back to `warn`), so keytrace's
//!   stdout stays machine-readable
//! - `<config dir>/logs/input-base.log.YYYY-MM-DD`, always at `debug`
//!
//! Useful filters: `RUST_LOG=input_base=debug` shows every fired event,
//! `RUST_LOG=input_base::input::binding=debug` only registration changes.

use tracing_subscriber::{
    fmt, layer::SubscriberExt, registry::LookupSpan, util::SubscriberInitExt, EnvFilter, Layer,
};

const LOG_FILE_PREFIX: &str = "input-base.log";

/// Install the global subscriber; call once per process
///
/// A missing or unwritable config directory only disables the file sink.
pub fn init() {
    let stderr_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let stderr = fmt::layer()
        .with_writer(std::io::stderr)
        .with_line_number(true)
        .with_filter(stderr_filter);

    tracing_subscriber::registry()
        .with(stderr)
        .with(file_layer())
        .init();
}

fn file_layer<S>() -> Option<impl Layer<S>>
where
    S: ::tracing::Subscriber + for<'span> LookupSpan<'span>,
{
    let dir = match crate::config_paths::ensure_logs_dir() {
        Ok(dir) => dir,
        Err(e) => {
            eprintln!("input-base: file logging disabled: {}", e);
            return None;
        }
    };

    Some(
        fmt::layer()
            .with_writer(tracing_appender::rolling::daily(dir, LOG_FILE_PREFIX))
            .with_ansi(false)
            .with_line_number(true)
            .with_filter(EnvFilter::new("debug")),
    )
}

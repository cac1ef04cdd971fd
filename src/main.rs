//! keytrace - replay a tick script and print the key events it produces

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use parking_lot::Mutex;
use serde::Serialize;

use input_base::cli::CliArgs;
use input_base::input::{Binding, DispatchRoute, EventKind, InputSystem, KeyCallback, KeyId};
use input_base::{replay, InputConfig};

/// One event seen by the trace binding
#[derive(Debug, Serialize)]
struct TraceEvent {
    tick: usize,
    key: String,
    event: EventKind,
}

/// Per-kind hit counts of a `--watch` binding
#[derive(Debug, Serialize)]
struct WatchSummary {
    watch: String,
    pressed: usize,
    released: usize,
}

struct Watch {
    key: KeyId,
    pressed: Arc<AtomicUsize>,
    released: Arc<AtomicUsize>,
    _binding: Binding,
}

impl Watch {
    fn new(system: &InputSystem, key: KeyId) -> Self {
        let pressed = Arc::new(AtomicUsize::new(0));
        let released = Arc::new(AtomicUsize::new(0));
        let (p, r) = (pressed.clone(), released.clone());
        let binding = system
            .bind(key.clone())
            .callback(
                KeyCallback::with_event(move |event| {
                    let counter = match event {
                        EventKind::Pressed => &p,
                        EventKind::Released => &r,
                    };
                    counter.fetch_add(1, Ordering::Relaxed);
                })
                .named(format!("watch:{}", key)),
            )
            .enable();
        Self {
            key,
            pressed,
            released,
            _binding: binding,
        }
    }

    fn summary(&self) -> WatchSummary {
        WatchSummary {
            watch: self.key.to_string(),
            pressed: self.pressed.load(Ordering::Relaxed),
            released: self.released.load(Ordering::Relaxed),
        }
    }
}

fn main() -> Result<()> {
    input_base::tracing::init();

    let args = CliArgs::parse();

    let mut config = match &args.config {
        Some(path) => InputConfig::load_from(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => InputConfig::load(),
    };
    if config.route == DispatchRoute::RawHook {
        tracing::warn!("keytrace replays through the tick diff; ignoring route raw_hook");
        config.route = DispatchRoute::TickDiff;
    }

    let ticks = replay::load_script(&args.script)
        .with_context(|| format!("reading script {}", args.script.display()))?;
    let system = InputSystem::with_config(&config)?;

    let current_tick = Arc::new(AtomicUsize::new(0));
    let seen: Arc<Mutex<Vec<TraceEvent>>> = Arc::new(Mutex::new(Vec::new()));

    let tick_no = current_tick.clone();
    let sink = seen.clone();
    let _trace = system
        .bind(KeyId::ANY)
        .callback(
            KeyCallback::with_event_and_key(move |event, key: &KeyId| {
                sink.lock().push(TraceEvent {
                    tick: tick_no.load(Ordering::Relaxed),
                    key: key.to_string(),
                    event,
                });
            })
            .named("keytrace"),
        )
        .enable();

    let watches = args
        .watch
        .iter()
        .map(|name| -> Result<Watch> {
            let key: KeyId = name.parse()?;
            Ok(Watch::new(&system, key))
        })
        .collect::<Result<Vec<_>>>()?;

    let mut failed = 0;
    for (idx, snapshot) in ticks.into_iter().enumerate() {
        let tick = idx + 1;
        current_tick.store(tick, Ordering::Relaxed);

        let lost = snapshot.is_none();
        let report = system.on_tick(snapshot);
        failed += report.failed;

        if lost && !args.json {
            println!("{:>5}  (capture lost)", tick);
        }
        for event in seen.lock().drain(..) {
            if args.json {
                println!("{}", serde_json::to_string(&event)?);
            } else {
                println!("{:>5}  {:<8} {}", event.tick, event.event, event.key);
            }
        }
    }

    for watch in &watches {
        let summary = watch.summary();
        if args.json {
            println!("{}", serde_json::to_string(&summary)?);
        } else {
            println!(
                "watch {}: {} pressed, {} released",
                summary.watch, summary.pressed, summary.released
            );
        }
    }

    if failed > 0 {
        tracing::warn!(failed, "Some callbacks failed during replay");
    }
    Ok(())
}

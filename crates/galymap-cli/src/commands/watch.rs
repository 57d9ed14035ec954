//! Main watch mode command.

use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use anyhow::{Context, Result};
use galymap_core::{
    Config, Error, PollOutcome, Poller, PollerAnchors, ProcessHandle, RemoteAccessor,
    ShutdownSignal, Snapshot, SnapshotStore, is_in_game,
};
use tracing::{debug, error, info, warn};

use crate::cli_utils::{TargetArgs, open_process, resolve_anchors};
use crate::display::format_snapshot;

/// Text output is redrawn at most this often.
const TEXT_REFRESH: Duration = Duration::from_secs(1);

/// Options for one watch run.
pub struct WatchOptions {
    pub json: bool,
    pub interval_ms: Option<u64>,
    pub once: bool,
}

/// Run the watch mode
pub fn run(target: &TargetArgs<'_>, mut config: Config, options: WatchOptions) -> Result<()> {
    if let Some(interval_ms) = options.interval_ms {
        config.polling.interval_ms = interval_ms;
    }

    if options.once {
        return run_once(target, &config, options.json);
    }

    let shutdown = setup_shutdown_handler()?;
    println!("Waiting for {}... (Press Ctrl+C to quit)", target.exe);

    while !shutdown.is_shutdown() {
        if let Some(process) = wait_for_process(target, &shutdown) {
            if let Err(e) = run_session(&process, target, &config, options.json, &shutdown) {
                error!("Session error: {}", e);
            }
            println!("Waiting for {}...", target.exe);
        }

        if shutdown.wait(Duration::from_secs(5)) {
            break;
        }
    }

    println!("Shutdown complete.");
    Ok(())
}

/// Setup graceful shutdown on Ctrl+C
fn setup_shutdown_handler() -> Result<Arc<ShutdownSignal>> {
    let shutdown = Arc::new(ShutdownSignal::new());
    let handler = Arc::clone(&shutdown);
    ctrlc::set_handler(move || handler.trigger()).context("Failed to set Ctrl+C handler")?;

    println!("galymap v{}", env!("CARGO_PKG_VERSION"));
    Ok(shutdown)
}

/// Wait for the game process to become available
fn wait_for_process(target: &TargetArgs<'_>, shutdown: &ShutdownSignal) -> Option<ProcessHandle> {
    if shutdown.is_shutdown() {
        return None;
    }

    match open_process(target) {
        Ok(process) => {
            println!("Connected to {} (PID: {})", target.exe, process.pid);
            debug!(
                "Process base: {:#x}, module size: {:#x}",
                process.base_address, process.module_size
            );
            Some(process)
        }
        Err(e) => {
            debug!("Process not found: {}", e);
            None
        }
    }
}

/// Poll until a player unit shows up. Returns `false` on shutdown or exit.
fn wait_for_game(
    reader: &RemoteAccessor<'_>,
    process: &ProcessHandle,
    unit_table: u64,
    shutdown: &ShutdownSignal,
) -> bool {
    let mut announced = false;
    loop {
        match is_in_game(reader, unit_table) {
            Ok(true) => return true,
            Ok(false) => {}
            Err(e) => debug!("In-game probe failed: {}", e),
        }
        if !process.is_alive() {
            return false;
        }
        if !announced {
            println!("Waiting for a game to start...");
            announced = true;
        }
        if shutdown.wait(Duration::from_secs(1)) {
            return false;
        }
    }
}

/// Run a single session with a connected process
fn run_session(
    process: &ProcessHandle,
    target: &TargetArgs<'_>,
    config: &Config,
    json: bool,
    shutdown: &Arc<ShutdownSignal>,
) -> Result<()> {
    println!("Resolving anchors...");
    let reader = RemoteAccessor::new(process);
    let table = resolve_anchors(&reader, process, target)?;
    let anchors = PollerAnchors::from_table(&table)?;
    info!("Resolved {} anchors", table.len());

    if !wait_for_game(&reader, process, anchors.unit_table, shutdown) {
        return Ok(());
    }
    println!("In game. Watching...");

    let store = Arc::new(SnapshotStore::new());
    let session_done = Arc::new(ShutdownSignal::new());
    let refresh = if json {
        Duration::from_millis(config.polling.interval_ms)
    } else {
        TEXT_REFRESH.max(Duration::from_millis(config.polling.interval_ms))
    };
    let printer = spawn_printer(Arc::clone(&store), Arc::clone(&session_done), json, refresh);

    let mut poller = Poller::new(&reader, anchors, config.clone(), store);
    let result = poller.run(shutdown);

    session_done.trigger();
    if printer.join().is_err() {
        warn!("Printer thread panicked");
    }

    match result {
        Ok(()) => Ok(()),
        Err(Error::TargetLost) => {
            println!("Game closed.");
            Ok(())
        }
        Err(e) => Err(e.into()),
    }
}

/// Print every snapshot generation the printer observes until the session ends.
fn spawn_printer(
    store: Arc<SnapshotStore>,
    session_done: Arc<ShutdownSignal>,
    json: bool,
    refresh: Duration,
) -> JoinHandle<()> {
    thread::spawn(move || {
        let mut last_generation = 0;
        let mut was_in_game = true;

        while !session_done.wait(refresh) {
            let snapshot = store.current();
            if snapshot.generation == last_generation {
                continue;
            }
            last_generation = snapshot.generation;

            // menus produce a new empty generation every tick
            if !json && !snapshot.in_game && !was_in_game {
                continue;
            }
            was_in_game = snapshot.in_game;

            if let Err(e) = print_snapshot(&snapshot, json) {
                error!("Failed to print snapshot: {}", e);
            }
        }
    })
}

fn print_snapshot(snapshot: &Snapshot, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string(snapshot)?);
    } else {
        println!("{}", format_snapshot(snapshot));
    }
    Ok(())
}

/// Attach, take one snapshot and print it.
fn run_once(target: &TargetArgs<'_>, config: &Config, json: bool) -> Result<()> {
    let process = open_process(target)?;
    let reader = RemoteAccessor::new(&process);
    let table = resolve_anchors(&reader, &process, target)?;
    let anchors = PollerAnchors::from_table(&table)?;

    let store = Arc::new(SnapshotStore::new());
    let mut poller = Poller::new(&reader, anchors, config.clone(), Arc::clone(&store));
    match poller.poll_once()? {
        PollOutcome::Published(generation) => debug!("Published generation {}", generation),
        PollOutcome::NotInGame(_) => info!("No player found"),
        PollOutcome::Retained => warn!("Tick aborted, nothing captured"),
    }

    print_snapshot(&store.current(), json)
}

//! Status command implementation.

use std::sync::Arc;

use anyhow::Result;
use galymap_core::{
    Config, PollOutcome, Poller, PollerAnchors, RemoteAccessor, SnapshotStore, is_in_game,
};
use serde_json::json;

use crate::cli_utils::{TargetArgs, module_version, open_process, resolve_anchors};

/// Run the status command
pub fn run(target: &TargetArgs<'_>, config: Config, json: bool) -> Result<()> {
    let process = open_process(target)?;
    let reader = RemoteAccessor::new(&process);
    let table = resolve_anchors(&reader, &process, target)?;
    let anchors = PollerAnchors::from_table(&table)?;
    let in_game = is_in_game(&reader, anchors.unit_table)?;

    let store = Arc::new(SnapshotStore::new());
    let mut poller = Poller::new(&reader, anchors, config, Arc::clone(&store));
    let outcome = if in_game {
        Some(poller.poll_once()?)
    } else {
        None
    };
    let snapshot = store.current();

    if json {
        let anchors: serde_json::Map<_, _> = table
            .iter()
            .map(|(name, anchor)| (name.to_string(), json!(format!("{:#x}", anchor.offset))))
            .collect();
        let output = json!({
            "version": env!("CARGO_PKG_VERSION"),
            "process": {
                "pid": process.pid,
                "base_address": format!("{:#x}", process.base_address),
                "module_size": module_version(&process),
            },
            "anchors": anchors,
            "in_game": in_game,
            "oracle": poller.oracle().state().to_string(),
            "player": snapshot.player,
            "mobs": snapshot.mobs.len(),
            "items": snapshot.items.len(),
            "other_players": snapshot.other_players.len(),
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    println!("galymap {} - Status", env!("CARGO_PKG_VERSION"));
    println!(
        "Process    : PID {} (Base: 0x{:X}, Size: 0x{:X})",
        process.pid, process.base_address, process.module_size
    );
    println!("Anchors    : {}", table.len());
    for (name, anchor) in table.iter() {
        println!("  {:<12} {:#x}", name, anchor.offset);
    }
    println!("In game    : {}", if in_game { "yes" } else { "no" });
    println!("Oracle     : {}", poller.oracle().state());

    match (outcome, snapshot.player.as_ref()) {
        (Some(PollOutcome::Published(_)), Some(player)) => {
            println!(
                "Player     : {} (id {}) Lv.{} {} area {}",
                player.name,
                player.unit_id,
                player.progress.level,
                player.difficulty,
                player.level_no
            );
            println!(
                "Visible    : {} mobs, {} items, {} players",
                snapshot.mobs.len(),
                snapshot.items.len(),
                snapshot.other_players.len()
            );
        }
        (Some(PollOutcome::Retained), _) => println!("Player     : read failed"),
        _ => println!("Player     : -"),
    }

    Ok(())
}

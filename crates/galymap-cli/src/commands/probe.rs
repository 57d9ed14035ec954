//! In-game probe command.

use anyhow::Result;
use galymap_core::{PollerAnchors, RemoteAccessor, is_in_game};

use crate::cli_utils::{TargetArgs, open_process, resolve_anchors};

/// Run the probe command. Exits non-zero when no game is in progress.
pub fn run(target: &TargetArgs<'_>) -> Result<bool> {
    let process = open_process(target)?;
    let reader = RemoteAccessor::new(&process);
    let table = resolve_anchors(&reader, &process, target)?;
    let anchors = PollerAnchors::from_table(&table)?;

    let in_game = is_in_game(&reader, anchors.unit_table)?;
    println!("{}", if in_game { "In game" } else { "Not in game" });
    Ok(in_game)
}

//! Typed memory read command.

use anyhow::Result;
use galymap_core::{ReadMemory, RemoteAccessor, ValueKind};
use tracing::debug;

use crate::cli_utils::{TargetArgs, open_process, parse_hex_address, parse_offset};

/// Run the read command
pub fn run(
    target: &TargetArgs<'_>,
    address: &str,
    kind: ValueKind,
    module: bool,
    chain: &[String],
) -> Result<()> {
    let process = open_process(target)?;
    let reader = RemoteAccessor::new(&process);

    let address = parse_hex_address(address)?;
    let address = if module {
        reader.module_address(address)
    } else {
        address
    };
    let offsets = chain
        .iter()
        .map(String::as_str)
        .map(parse_offset)
        .collect::<Result<Vec<_>>>()?;

    if !offsets.is_empty() {
        let resolved = reader.read_pointer_chain(address, &offsets)?;
        debug!("Chain from {:#x} resolved to {:#x}", address, resolved);
    }
    let value = reader.read_chain(address, &offsets, kind)?;
    println!("{} ({})", value, kind);
    Ok(())
}

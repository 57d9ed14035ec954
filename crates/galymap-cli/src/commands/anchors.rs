//! Anchor resolution command.

use anyhow::{Result, bail};
use galymap_core::{RemoteAccessor, save_anchors};
use serde_json::json;

use crate::cli_utils::{TargetArgs, load_signature_set, module_version, open_process, scan_anchors};

/// Run the anchors command
pub fn run(target: &TargetArgs<'_>, output: Option<&str>, json: bool) -> Result<()> {
    let process = open_process(target)?;
    if !json {
        println!(
            "Found process (PID: {}, Base: 0x{:X}, Size: 0x{:X})",
            process.pid, process.base_address, process.module_size
        );
    }

    let reader = RemoteAccessor::new(&process);
    let signatures = load_signature_set(target.signatures)?;
    let resolution = scan_anchors(&reader, &process, &signatures)?;

    if json {
        let resolved: Vec<_> = resolution
            .table
            .iter()
            .map(|(name, anchor)| {
                json!({
                    "name": name,
                    "offset": format!("{:#x}", anchor.offset),
                    "address": format!("{:#x}", process.base_address + anchor.offset),
                    "required": anchor.required,
                })
            })
            .collect();
        let failed: Vec<_> = resolution
            .failures
            .iter()
            .map(|failure| {
                json!({
                    "name": failure.name,
                    "required": failure.required,
                    "error": failure.error.to_string(),
                })
            })
            .collect();
        let output = json!({
            "version": module_version(&process),
            "signatures": signatures.version,
            "resolved": resolved,
            "failed": failed,
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        println!();
        println!("Anchors ({}):", signatures.version);
        for (name, anchor) in resolution.table.iter() {
            println!(
                "  {:<12} {:#010x}  (0x{:X}){}",
                name,
                anchor.offset,
                process.base_address + anchor.offset,
                if anchor.required { "" } else { "  optional" }
            );
        }
        for failure in &resolution.failures {
            println!("  {:<12} not found: {}", failure.name, failure.error);
        }
    }

    let missing: Vec<&str> = resolution
        .missing_required()
        .map(|failure| failure.name.as_str())
        .collect();
    if !missing.is_empty() {
        bail!("Required anchors not resolved: {}", missing.join(", "));
    }

    if let Some(path) = output {
        save_anchors(path, &module_version(&process), &resolution.table)?;
        if !json {
            println!();
            println!("Anchors saved to {}", path);
        }
    }

    Ok(())
}

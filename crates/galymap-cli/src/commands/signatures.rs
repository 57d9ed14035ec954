//! Signature table export command.

use anyhow::Result;
use galymap_core::save_signatures;

use crate::cli_utils::load_signature_set;

/// Run the signatures command
pub fn run(source: Option<&str>, output: Option<&str>) -> Result<()> {
    let signatures = load_signature_set(source)?;

    match output {
        Some(path) => {
            save_signatures(path, &signatures)?;
            println!("{} signatures written to {}", signatures.entries.len(), path);
        }
        None => println!("{}", serde_json::to_string_pretty(&signatures)?),
    }
    Ok(())
}

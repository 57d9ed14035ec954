//! Default configuration export command.

use std::path::Path;

use anyhow::{Result, bail};
use galymap_core::Config;

/// Run the init-config command
pub fn run(output: &Path, force: bool) -> Result<()> {
    if output.exists() && !force {
        bail!(
            "{} already exists (use --force to overwrite)",
            output.display()
        );
    }

    Config::default().save(output)?;
    println!("Default config written to {}", output.display());
    Ok(())
}

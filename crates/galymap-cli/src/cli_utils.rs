//! Common CLI utility functions shared across commands.

use std::path::Path;

use anyhow::{Context, Result, bail};
use galymap_core::config::scan::IMAGE_CHUNK_SIZE;
use galymap_core::{
    AnchorResolution, AnchorTable, Config, ModuleImage, ProcessHandle, ProcessProvider,
    ReadMemory, SignatureSet, SystemProcessProvider, builtin_signatures, load_anchors,
    load_signatures,
};
use tracing::{debug, info, warn};

/// Global options that select and describe the target process.
pub struct TargetArgs<'a> {
    pub pid: Option<u32>,
    pub exe: &'a str,
    pub signatures: Option<&'a str>,
    pub anchors_file: Option<&'a str>,
}

/// Open the game process by PID or auto-detect.
pub fn open_process(target: &TargetArgs<'_>) -> Result<ProcessHandle> {
    Ok(SystemProcessProvider::new(target.exe).attach(target.pid)?)
}

/// Load the config file, falling back to defaults when it is absent or broken.
pub fn load_config(path: &Path) -> Config {
    if !path.exists() {
        debug!("No config file at {}, using defaults", path.display());
        return Config::default();
    }
    match Config::load(path) {
        Ok(config) => {
            info!("Loaded config from {}", path.display());
            config
        }
        Err(e) => {
            warn!("Failed to load config from {}: {}", path.display(), e);
            Config::default()
        }
    }
}

pub fn load_signature_set(path: Option<&str>) -> Result<SignatureSet> {
    match path {
        Some(path) => {
            let signatures = load_signatures(path)
                .with_context(|| format!("Failed to load signatures from {}", path))?;
            info!(
                "Loaded {} signatures ({}) from {}",
                signatures.entries.len(),
                signatures.version,
                path
            );
            Ok(signatures)
        }
        None => Ok(builtin_signatures()),
    }
}

/// Capture the module image and run every signature against it.
pub fn scan_anchors<R: ReadMemory>(
    reader: &R,
    process: &ProcessHandle,
    signatures: &SignatureSet,
) -> Result<AnchorResolution> {
    let image = ModuleImage::capture(
        reader,
        process.base_address,
        process.module_size as usize,
        IMAGE_CHUNK_SIZE,
    )?;
    if image.unreadable_chunks() > 0 {
        warn!("{} unreadable chunks in module image", image.unreadable_chunks());
    }
    Ok(AnchorTable::resolve_all(&image, signatures))
}

/// Anchors from the anchors file when given, otherwise from a fresh scan.
pub fn resolve_anchors<R: ReadMemory>(
    reader: &R,
    process: &ProcessHandle,
    target: &TargetArgs<'_>,
) -> Result<AnchorTable> {
    if let Some(path) = target.anchors_file {
        let cached =
            load_anchors(path).with_context(|| format!("Failed to load anchors from {}", path))?;
        let expected = module_version(process);
        if cached.version != expected {
            warn!(
                "Anchors file {} was written for {}, running module is {}",
                path, cached.version, expected
            );
        }
        info!("Loaded {} anchors from {}", cached.table.len(), path);
        return Ok(cached.table);
    }

    let signatures = load_signature_set(target.signatures)?;
    let resolution = scan_anchors(reader, process, &signatures)?;
    Ok(resolution.into_table()?)
}

/// Version tag stored alongside cached anchors.
pub fn module_version(process: &ProcessHandle) -> String {
    format!("{:#x}", process.module_size)
}

/// Parse a hex address with or without the `0x` prefix.
pub fn parse_hex_address(text: &str) -> Result<u64> {
    let text = text.trim();
    let digits = text
        .strip_prefix("0x")
        .or_else(|| text.strip_prefix("0X"))
        .unwrap_or(text);
    u64::from_str_radix(digits, 16).with_context(|| format!("Invalid hex address '{}'", text))
}

/// Parse a signed hex offset such as `0x18` or `-0x8`.
pub fn parse_offset(text: &str) -> Result<i64> {
    let text = text.trim();
    let (negative, rest) = match text.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, text),
    };
    let magnitude = parse_hex_address(rest)?;
    let Ok(magnitude) = i64::try_from(magnitude) else {
        bail!("Offset '{}' out of range", text);
    };
    Ok(if negative { -magnitude } else { magnitude })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_hex_address() {
        assert_eq!(parse_hex_address("0x1F").unwrap(), 0x1F);
        assert_eq!(parse_hex_address("7ff6a1c2d3e0").unwrap(), 0x7FF6_A1C2_D3E0);
        assert!(parse_hex_address("0xZZ").is_err());
    }

    #[test]
    fn test_parse_offset() {
        assert_eq!(parse_offset("0x18").unwrap(), 0x18);
        assert_eq!(parse_offset("-0x8").unwrap(), -8);
        assert_eq!(parse_offset(" 90 ").unwrap(), 0x90);
        assert!(parse_offset("-").is_err());
        assert!(parse_offset("0xFFFFFFFFFFFFFFFF").is_err());
    }

    #[test]
    fn test_load_config_missing_file_uses_defaults() {
        let config = load_config(Path::new("does-not-exist/galymap.toml"));
        assert_eq!(config, Config::default());
    }
}

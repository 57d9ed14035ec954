//! Plain-text cache of resolved anchors.
//!
//! The first line is a free-form version tag (the executable's module size by
//! default), then one `name = 0x...` line per anchor. A `!` after the value
//! marks a required anchor.

use tracing::warn;

use crate::error::{Error, Result};
use crate::offset::anchors::{Anchor, AnchorTable};
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachedAnchors {
    pub version: String,
    pub table: AnchorTable,
}

pub fn load_anchors<P: AsRef<Path>>(path: P) -> Result<CachedAnchors> {
    let content = fs::read_to_string(&path)?;
    parse_anchors(&content)
}

pub fn save_anchors<P: AsRef<Path>>(path: P, version: &str, table: &AnchorTable) -> Result<()> {
    let content = format_anchors(version, table);
    fs::write(path, content)?;
    Ok(())
}

fn parse_anchors(content: &str) -> Result<CachedAnchors> {
    let mut lines = content.lines();
    let version = lines.next().map(|v| v.trim().to_string()).unwrap_or_default();
    let mut entries = Vec::new();

    for line in lines {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') || line.starts_with(';') {
            continue;
        }

        match line.split_once('=') {
            Some((name, value)) => {
                let value = value.trim();
                let (value, required) = match value.strip_suffix('!') {
                    Some(value) => (value.trim_end(), true),
                    None => (value, false),
                };
                let offset = parse_hex_value(value)?;
                entries.push((name.trim().to_string(), Anchor { offset, required }));
            }
            None => warn!("Ignoring malformed anchor line: '{}'", line),
        }
    }

    Ok(CachedAnchors {
        version,
        table: AnchorTable::from_entries(entries),
    })
}

fn parse_hex_value(value: &str) -> Result<u64> {
    let value = value.trim();
    let digits = value
        .strip_prefix("0x")
        .or_else(|| value.strip_prefix("0X"))
        .unwrap_or(value);

    u64::from_str_radix(digits, 16)
        .map_err(|e| Error::ConfigParseError(format!("Failed to parse '{}': {}", value, e)))
}

fn format_anchors(version: &str, table: &AnchorTable) -> String {
    let mut lines = vec![version.to_string()];
    for (name, anchor) in table.iter() {
        let marker = if anchor.required { " !" } else { "" };
        lines.push(format!("{} = {:#x}{}", name, anchor.offset, marker));
    }
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_anchors() {
        let content = r#"module:0x3A1F000
unitTable = 0x1E9F4A0 !
# cached by hand
rosterOffset = 0x1EA2D28
garbage line
"#;
        let cached = parse_anchors(content).unwrap();

        assert_eq!(cached.version, "module:0x3A1F000");
        assert_eq!(cached.table.get("unitTable"), Some(0x1E9F4A0));
        assert_eq!(cached.table.get("rosterOffset"), Some(0x1EA2D28));
        assert_eq!(cached.table.len(), 2);
        assert!(cached.table.iter().any(|(n, a)| n == "unitTable" && a.required));
    }

    #[test]
    fn test_parse_rejects_bad_hex() {
        assert!(parse_anchors("v\nunitTable = 0xZZ").is_err());
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("anchors.txt");
        let table = AnchorTable::from_entries([
            (
                "unitTable",
                Anchor {
                    offset: 0x127,
                    required: true,
                },
            ),
            (
                "uiOffset",
                Anchor {
                    offset: 0x20A,
                    required: false,
                },
            ),
        ]);

        save_anchors(&path, "module:0x1000", &table).unwrap();
        let loaded = load_anchors(&path).unwrap();

        assert_eq!(loaded.version, "module:0x1000");
        assert_eq!(loaded.table, table);
    }
}

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::error::Result;
use crate::process::Pattern;

/// How the displacement found next to a signature turns into an anchor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, strum::Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ResolveMode {
    /// `(match - base) + instruction_len + displacement + fixup`
    #[default]
    Relative,
    /// `displacement + fixup`, for operands that already hold a module offset
    Absolute,
}

/// One configured signature: where to find the code site and how to derive
/// the data offset it references.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignatureSpec {
    pub name: String,
    pub pattern: String,
    /// Offset of the 32-bit displacement from the match start; may be negative.
    pub operand_offset: i64,
    #[serde(default)]
    pub instruction_len: i64,
    #[serde(default)]
    pub fixup: i64,
    #[serde(default)]
    pub mode: ResolveMode,
    /// Startup fails if a required anchor cannot be resolved.
    #[serde(default)]
    pub required: bool,
}

impl SignatureSpec {
    pub fn relative(name: &str, pattern: &str, operand_offset: i64, instruction_len: i64) -> Self {
        Self {
            name: name.to_string(),
            pattern: pattern.to_string(),
            operand_offset,
            instruction_len,
            fixup: 0,
            mode: ResolveMode::Relative,
            required: false,
        }
    }

    pub fn absolute(name: &str, pattern: &str, operand_offset: i64) -> Self {
        Self {
            mode: ResolveMode::Absolute,
            ..Self::relative(name, pattern, operand_offset, 0)
        }
    }

    pub fn with_fixup(mut self, fixup: i64) -> Self {
        self.fixup = fixup;
        self
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn parsed_pattern(&self) -> Result<Pattern> {
        Pattern::parse(&self.pattern)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignatureSet {
    pub version: String,
    pub entries: Vec<SignatureSpec>,
}

impl SignatureSet {
    pub fn entry(&self, name: &str) -> Option<&SignatureSpec> {
        self.entries
            .iter()
            .find(|entry| entry.name.eq_ignore_ascii_case(name))
    }

    pub fn required(&self) -> impl Iterator<Item = &SignatureSpec> {
        self.entries.iter().filter(|entry| entry.required)
    }
}

pub fn load_signatures<P: AsRef<Path>>(path: P) -> Result<SignatureSet> {
    let content = fs::read_to_string(&path)?;
    let data = serde_json::from_str(&content)?;
    Ok(data)
}

pub fn save_signatures<P: AsRef<Path>>(path: P, signatures: &SignatureSet) -> Result<()> {
    let content = serde_json::to_string_pretty(signatures)?;
    fs::write(path, content)?;
    Ok(())
}

/// Well-known anchor names.
pub mod names {
    pub const UNIT_TABLE: &str = "unitTable";
    pub const UI: &str = "uiOffset";
    pub const EXPANSION: &str = "expOffset";
    pub const GAME_DATA: &str = "gameDataOffset";
    pub const MENU: &str = "menuOffset";
    pub const HOVER: &str = "hoverOffset";
    pub const ROSTER: &str = "rosterOffset";
}

pub fn builtin_signatures() -> SignatureSet {
    SignatureSet {
        version: "D2R 2.x".to_string(),
        entries: vec![
            SignatureSpec::relative(names::UNIT_TABLE, "48 03 C7 49 8B 8C C6", 7, 7).required(),
            SignatureSpec::relative(names::UI, "40 84 ed 0f 94 05", 6, 10),
            SignatureSpec::relative(
                names::EXPANSION,
                "48 8B 05 ?? ?? ?? ?? 48 8B D9 F3 0F 10 50 ??",
                3,
                7,
            )
            .required(),
            SignatureSpec::relative(
                names::GAME_DATA,
                "44 88 25 ?? ?? ?? ?? 66 44 89 25 ?? ?? ?? ??",
                3,
                0,
            )
            .with_fixup(-0x121),
            SignatureSpec::relative(names::MENU, "8B 05 ?? ?? ?? ?? 89 44 24 20 74 07", 2, 6),
            SignatureSpec::absolute(names::HOVER, "C6 84 C2 ?? ?? ?? ?? ?? 48 8B 74 24 ??", 3)
                .with_fixup(-1),
            SignatureSpec::relative(names::ROSTER, "02 45 33 D2 4D 8B", -3, 1),
        ],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_patterns_parse() {
        for entry in builtin_signatures().entries {
            assert!(
                entry.parsed_pattern().is_ok(),
                "pattern for {} must parse",
                entry.name
            );
        }
    }

    #[test]
    fn test_builtin_required_anchors() {
        let set = builtin_signatures();
        let required: Vec<&str> = set.required().map(|s| s.name.as_str()).collect();
        assert_eq!(required, vec![names::UNIT_TABLE, names::EXPANSION]);
    }

    #[test]
    fn test_entry_lookup_ignores_case() {
        let set = builtin_signatures();
        assert_eq!(set.entry("UNITTABLE").unwrap().operand_offset, 7);
        assert_eq!(set.entry("hoveroffset").unwrap().mode, ResolveMode::Absolute);
        assert!(set.entry("missing").is_none());
    }

    #[test]
    fn test_save_and_load_signatures() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("signatures.json");

        let set = builtin_signatures();
        save_signatures(&path, &set).unwrap();
        let loaded = load_signatures(&path).unwrap();

        assert_eq!(loaded, set);
    }

    #[test]
    fn test_optional_fields_default() {
        let json = r#"{
            "version": "test",
            "entries": [
                { "name": "rosterOffset", "pattern": "02 45 33 D2 4D 8B", "operand_offset": -3 }
            ]
        }"#;
        let set: SignatureSet = serde_json::from_str(json).unwrap();
        let entry = &set.entries[0];

        assert_eq!(entry.instruction_len, 0);
        assert_eq!(entry.fixup, 0);
        assert_eq!(entry.mode, ResolveMode::Relative);
        assert!(!entry.required);
    }
}

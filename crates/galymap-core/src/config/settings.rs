use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::config::{polling, scan};
use crate::error::{Error, Result};

/// User configuration, read from a TOML file.
///
/// Every section and field has a default, so an empty file is a valid config.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub polling: PollingConfig,
    pub features: FeatureToggles,
    pub oracle: OracleConfig,
    pub items: ItemAlertConfig,
    pub walker: WalkerConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PollingConfig {
    pub interval_ms: u64,
    /// Ticks between party roster refreshes.
    pub party_every: u32,
    /// Ticks between player level/experience refreshes.
    pub stats_every: u32,
    /// Ticks between ground item refreshes.
    pub items_every: u32,
    /// Liveness checks made after an anchor-level failure before giving up.
    pub liveness_retries: u32,
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            interval_ms: polling::POLL_INTERVAL_MS,
            party_every: polling::PARTY_EVERY,
            stats_every: polling::STATS_EVERY,
            items_every: polling::ITEMS_EVERY,
            liveness_retries: super::retry::MAX_LIVENESS_RETRIES,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeatureToggles {
    pub mobs: bool,
    pub items: bool,
    pub other_players: bool,
    pub party: bool,
    pub ui: bool,
}

impl Default for FeatureToggles {
    fn default() -> Self {
        Self {
            mobs: true,
            items: true,
            other_players: true,
            party: true,
            ui: true,
        }
    }
}

/// Player oracle scan bound and plausibility thresholds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OracleConfig {
    /// Player table slots scanned per rescan.
    pub max_attempts: usize,
    pub inventory_dead_marker: u16,
    pub expansion_dead_marker: u16,
    pub min_seed_digits: u32,
}

impl Default for OracleConfig {
    fn default() -> Self {
        Self {
            max_attempts: scan::ORACLE_MAX_ATTEMPTS,
            inventory_dead_marker: 1,
            expansion_dead_marker: 0,
            min_seed_digits: 7,
        }
    }
}

/// Which ground items are worth reporting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ItemAlertConfig {
    /// Item base ids reported regardless of quality.
    pub alert_ids: Vec<u32>,
    /// Lowest quality reported without being on the alert list.
    pub min_quality: u32,
}

impl Default for ItemAlertConfig {
    fn default() -> Self {
        Self {
            alert_ids: Vec::new(),
            min_quality: 3,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WalkerConfig {
    /// Records visited per chain before the chain is cut.
    pub step_cap: usize,
}

impl Default for WalkerConfig {
    fn default() -> Self {
        Self {
            step_cap: scan::CHAIN_STEP_CAP,
        }
    }
}

impl Config {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| Error::ConfigParseError(e.to_string()))
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        fs::write(path, self.to_toml()?)?;
        Ok(())
    }

    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| Error::ConfigParseError(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_file_is_default() {
        assert_eq!(Config::parse("").unwrap(), Config::default());
    }

    #[test]
    fn test_partial_sections() {
        let config = Config::parse(
            r#"
[polling]
interval_ms = 40

[features]
mobs = false

[items]
alert_ids = [522, 523]
"#,
        )
        .unwrap();

        assert_eq!(config.polling.interval_ms, 40);
        assert_eq!(config.polling.party_every, 3);
        assert!(!config.features.mobs);
        assert!(config.features.items);
        assert_eq!(config.items.alert_ids, vec![522, 523]);
        assert_eq!(config.items.min_quality, 3);
    }

    #[test]
    fn test_invalid_toml() {
        assert!(matches!(
            Config::parse("[polling\ninterval_ms = 1"),
            Err(Error::ConfigParseError(_))
        ));
        assert!(matches!(
            Config::parse("[polling]\ninterval_ms = \"fast\""),
            Err(Error::ConfigParseError(_))
        ));
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("galymap.toml");

        let mut config = Config::default();
        config.oracle.max_attempts = 64;
        config.items.alert_ids = vec![610];
        config.save(&path).unwrap();

        assert_eq!(Config::load(&path).unwrap(), config);
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            Config::load(dir.path().join("absent.toml")),
            Err(Error::Io(_))
        ));
    }
}

//! Stat lists attached to units.
//!
//! A stat list holds two arrays of `[layer u16][stat u16][value u32]` entries:
//! the base stats and the extended (item-granted) stats. Only the base array
//! is decoded here; items keep a reference to both for later reads.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::process::ReadMemory;
use crate::process::layout::stat_list;

/// Stat identifiers read by the decoders.
pub mod stat_id {
    pub const HIT_POINTS: u16 = 6;
    pub const MAX_HIT_POINTS: u16 = 7;
    pub const LEVEL: u16 = 12;
    pub const EXPERIENCE: u16 = 13;
    pub const DAMAGE_RESIST: u16 = 36;
    pub const MAGIC_RESIST: u16 = 37;
    pub const FIRE_RESIST: u16 = 39;
    pub const LIGHTNING_RESIST: u16 = 41;
    pub const COLD_RESIST: u16 = 43;
    pub const POISON_RESIST: u16 = 45;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatEntry {
    pub stat: u16,
    pub value: u32,
}

/// Location and length of one stat array.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatArray {
    pub address: u64,
    pub count: u32,
}

impl StatArray {
    pub fn read<R: ReadMemory>(&self, reader: &R) -> Result<Vec<StatEntry>> {
        read_stat_entries(reader, self.address, self.count)
    }
}

/// Header of a unit's stat list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatBlock {
    pub address: u64,
    pub base: StatArray,
    pub extended: StatArray,
}

impl StatBlock {
    pub fn read<R: ReadMemory>(reader: &R, address: u64) -> Result<Self> {
        if address == 0 {
            return Err(Error::decode(address, "unit has no stat list"));
        }
        let record = reader.read_record(address, &stat_list::LAYOUT)?;
        Ok(Self {
            address,
            base: StatArray {
                address: record.pointer(stat_list::STATS)?,
                count: record.get(stat_list::STAT_COUNT)?,
            },
            extended: StatArray {
                address: record.pointer(stat_list::EXTENDED_STATS)?,
                count: record.get(stat_list::EXTENDED_STAT_COUNT)?,
            },
        })
    }

    /// Whether the unit is a revived minion (low five bits of the state word equal 1).
    pub fn is_revived<R: ReadMemory>(&self, reader: &R) -> Result<bool> {
        let flags = reader.read_u32(self.address + stat_list::STATE_FLAGS_OFFSET)?;
        Ok(flags & 0x1F == 1)
    }
}

/// Read `count` stat entries in one round trip.
pub fn read_stat_entries<R: ReadMemory>(
    reader: &R,
    address: u64,
    count: u32,
) -> Result<Vec<StatEntry>> {
    if count == 0 {
        return Ok(Vec::new());
    }
    if count > stat_list::MAX_ENTRIES {
        return Err(Error::decode(
            address,
            format!("stat count {} exceeds {}", count, stat_list::MAX_ENTRIES),
        ));
    }
    if address == 0 {
        return Err(Error::decode(address, "stat array is null"));
    }

    let bytes = reader.read_bytes(address, count as usize * stat_list::ENTRY_SIZE)?;
    Ok(parse_stat_entries(&bytes))
}

fn parse_stat_entries(bytes: &[u8]) -> Vec<StatEntry> {
    let stat_at = stat_list::ENTRY_STAT.offset;
    let value_at = stat_list::ENTRY_VALUE.offset;

    bytes
        .chunks_exact(stat_list::ENTRY_SIZE)
        .map(|entry| StatEntry {
            stat: u16::from_le_bytes([entry[stat_at], entry[stat_at + 1]]),
            value: u32::from_le_bytes([
                entry[value_at],
                entry[value_at + 1],
                entry[value_at + 2],
                entry[value_at + 3],
            ]),
        })
        .collect()
}

/// Value of the first entry for `stat`.
pub fn find_stat(entries: &[StatEntry], stat: u16) -> Option<u32> {
    entries.iter().find(|e| e.stat == stat).map(|e| e.value)
}

/// Resistances in percent; 100 or more means immune.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Immunities {
    pub physical: u32,
    pub magic: u32,
    pub fire: u32,
    pub lightning: u32,
    pub cold: u32,
    pub poison: u32,
}

impl Immunities {
    pub fn from_stats(entries: &[StatEntry]) -> Self {
        let mut out = Self::default();
        for entry in entries {
            match entry.stat {
                stat_id::DAMAGE_RESIST => out.physical = entry.value,
                stat_id::MAGIC_RESIST => out.magic = entry.value,
                stat_id::FIRE_RESIST => out.fire = entry.value,
                stat_id::LIGHTNING_RESIST => out.lightning = entry.value,
                stat_id::COLD_RESIST => out.cold = entry.value,
                stat_id::POISON_RESIST => out.poison = entry.value,
                _ => {}
            }
        }
        out
    }

    /// Names of the damage types this unit is immune to.
    pub fn immune_to(&self) -> Vec<&'static str> {
        [
            ("physical", self.physical),
            ("magic", self.magic),
            ("fire", self.fire),
            ("lightning", self.lightning),
            ("cold", self.cold),
            ("poison", self.poison),
        ]
        .into_iter()
        .filter(|(_, value)| *value >= 100)
        .map(|(name, _)| name)
        .collect()
    }
}

/// Current and maximum hit points; the game stores life shifted left by 8.
pub fn hit_points(entries: &[StatEntry]) -> (u32, u32) {
    let hp = find_stat(entries, stat_id::HIT_POINTS).unwrap_or(0) >> 8;
    let max_hp = find_stat(entries, stat_id::MAX_HIT_POINTS).unwrap_or(0) >> 8;
    (hp, max_hp)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::process::MockMemoryBuilder;

    fn entry(stat: u16, value: u32) -> Vec<u8> {
        let mut bytes = vec![0u8; 2];
        bytes.extend_from_slice(&stat.to_le_bytes());
        bytes.extend_from_slice(&value.to_le_bytes());
        bytes
    }

    #[test]
    fn test_read_entries() {
        let mut bytes = entry(stat_id::LEVEL, 85);
        bytes.extend(entry(stat_id::EXPERIENCE, 1_200_000));
        let reader = MockMemoryBuilder::new().write_bytes(0, &bytes).build();

        let entries = read_stat_entries(&reader, 0x1000, 2).unwrap();
        assert_eq!(find_stat(&entries, stat_id::LEVEL), Some(85));
        assert_eq!(find_stat(&entries, stat_id::EXPERIENCE), Some(1_200_000));
        assert_eq!(find_stat(&entries, stat_id::HIT_POINTS), None);
    }

    #[test]
    fn test_implausible_count_rejected() {
        let reader = MockMemoryBuilder::new().with_size(16).build();
        assert!(matches!(
            read_stat_entries(&reader, 0x1000, 100_000),
            Err(Error::Decode { .. })
        ));
        assert!(read_stat_entries(&reader, 0x1000, 0).unwrap().is_empty());
    }

    #[test]
    fn test_immunities_and_life() {
        let entries = [
            StatEntry { stat: stat_id::FIRE_RESIST, value: 100 },
            StatEntry { stat: stat_id::COLD_RESIST, value: 75 },
            StatEntry { stat: stat_id::HIT_POINTS, value: 300 << 8 },
            StatEntry { stat: stat_id::MAX_HIT_POINTS, value: 512 << 8 },
        ];

        let immunities = Immunities::from_stats(&entries);
        assert_eq!(immunities.fire, 100);
        assert_eq!(immunities.cold, 75);
        assert_eq!(immunities.immune_to(), vec!["fire"]);
        assert_eq!(hit_points(&entries), (300, 512));
    }

    #[test]
    fn test_stat_block_and_revive_flag() {
        let reader = MockMemoryBuilder::new()
            .write_u64(0x30, 0x2000)
            .write_u32(0x38, 3)
            .write_u64(0x88, 0x3000)
            .write_u32(0x90, 1)
            .write_u32(0xAC8 + 0x0C, 0x21)
            .build();

        let block = StatBlock::read(&reader, 0x1000).unwrap();
        assert_eq!(block.base, StatArray { address: 0x2000, count: 3 });
        assert_eq!(block.extended, StatArray { address: 0x3000, count: 1 });
        assert!(block.is_revived(&reader).unwrap());
    }
}

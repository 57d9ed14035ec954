use serde::{Deserialize, Serialize};

use crate::config::ItemAlertConfig;
use crate::error::{Error, Result};
use crate::game::position::{Position, read_item_position};
use crate::game::stats::{StatArray, StatBlock};
use crate::process::layout::{item_data, unit};
use crate::process::{ReadMemory, Record};
use crate::walker::{StructuralWalker, UnitKind, Walk};

const ITEM_UNIT_TYPE: u32 = 4;

/// Item locations that mean "lying on the ground".
const LOCATION_ON_GROUND: u32 = 3;
const LOCATION_DROPPING: u32 = 5;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, strum::Display,
)]
#[strum(serialize_all = "lowercase")]
pub enum ItemQuality {
    Inferior = 1,
    Normal = 2,
    Superior = 3,
    Magic = 4,
    Set = 5,
    Rare = 6,
    Unique = 7,
    Crafted = 8,
}

impl ItemQuality {
    pub fn from_u32(value: u32) -> Option<Self> {
        match value {
            1 => Some(Self::Inferior),
            2 => Some(Self::Normal),
            3 => Some(Self::Superior),
            4 => Some(Self::Magic),
            5 => Some(Self::Set),
            6 => Some(Self::Rare),
            7 => Some(Self::Unique),
            8 => Some(Self::Crafted),
            _ => None,
        }
    }
}

/// Item flag word from the item data block.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemFlags(pub u32);

impl ItemFlags {
    pub const IDENTIFIED: u32 = 0x0000_0010;
    pub const SOCKETED: u32 = 0x0000_0800;
    pub const ETHEREAL: u32 = 0x0040_0000;
    pub const RUNEWORD: u32 = 0x0400_0000;

    pub fn identified(self) -> bool {
        self.0 & Self::IDENTIFIED != 0
    }

    pub fn socketed(self) -> bool {
        self.0 & Self::SOCKETED != 0
    }

    pub fn ethereal(self) -> bool {
        self.0 & Self::ETHEREAL != 0
    }

    pub fn runeword(self) -> bool {
        self.0 & Self::RUNEWORD != 0
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroundItem {
    pub unit_id: u32,
    /// Base item id.
    pub txt_file_no: u32,
    pub location: u32,
    pub quality: u32,
    pub flags: ItemFlags,
    pub unique_or_set_id: u32,
    pub position: Position,
    /// Base and extended stat arrays, for a later detail read.
    pub stats: StatArray,
    pub extended_stats: StatArray,
    /// Whether the item matched the alert list rather than the quality threshold.
    pub alerted: bool,
}

impl GroundItem {
    pub fn quality(&self) -> Option<ItemQuality> {
        ItemQuality::from_u32(self.quality)
    }
}

/// Decode one item unit. Items not on the ground, or neither on the alert
/// list nor of sufficient quality, are rejected.
pub fn decode_item<R: ReadMemory>(
    reader: &R,
    record: &Record,
    alerts: &ItemAlertConfig,
) -> Result<Option<GroundItem>> {
    let unit_type: u32 = record.get(unit::UNIT_TYPE)?;
    let location: u32 = record.get(unit::MODE)?;
    if unit_type != ITEM_UNIT_TYPE
        || !matches!(location, LOCATION_ON_GROUND | LOCATION_DROPPING)
    {
        return Ok(None);
    }

    let unit_data = record.pointer(unit::UNIT_DATA)?;
    if unit_data == 0 {
        return Err(Error::decode(record.address(), "item has no unit data"));
    }
    let data = reader.read_record(unit_data, &item_data::LAYOUT)?;
    let quality: u32 = data.get(item_data::QUALITY)?;
    let txt_file_no: u32 = record.get(unit::TXT_FILE_NO)?;

    let alerted = alerts.alert_ids.contains(&txt_file_no);
    if !alerted && quality < alerts.min_quality {
        return Ok(None);
    }

    let position = read_item_position(reader, record.pointer(unit::PATH)?)?;
    let stats = StatBlock::read(reader, record.pointer(unit::STAT_LIST)?)?;

    Ok(Some(GroundItem {
        unit_id: record.get(unit::UNIT_ID)?,
        txt_file_no,
        location,
        quality,
        flags: ItemFlags(data.get(item_data::FLAGS)?),
        unique_or_set_id: data.get(item_data::UNIQUE_OR_SET_ID)?,
        position,
        stats: stats.base,
        extended_stats: stats.extended,
        alerted,
    }))
}

pub fn read_items<R: ReadMemory>(
    walker: &StructuralWalker<'_, R>,
    reader: &R,
    unit_table: u64,
    alerts: &ItemAlertConfig,
) -> Result<Walk<GroundItem>> {
    let table = walker.table_address(unit_table, UnitKind::Item);
    walker.walk(table, |record| decode_item(reader, record, alerts))
}

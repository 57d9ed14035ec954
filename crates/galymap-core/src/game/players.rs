use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::game::party::PartyMember;
use crate::game::position::{Position, read_unit_position};
use crate::process::layout::{player_data, unit};
use crate::process::{ReadMemory, Record};
use crate::walker::{StructuralWalker, UnitKind, Walk};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OtherPlayer {
    pub name: String,
    pub unit_id: u32,
    pub position: Position,
    pub is_corpse: bool,
    /// Seen only through the party roster, not as a unit in range.
    pub from_roster: bool,
}

/// Name stored at the start of a player's unit data block.
pub fn read_player_name<R: ReadMemory>(reader: &R, record: &Record) -> Result<String> {
    let unit_data = record.pointer(unit::UNIT_DATA)?;
    reader.read_string_field(unit_data, player_data::NAME)
}

/// Decode one player unit other than the local player.
///
/// Units without an inventory are stale slots; units not yet placed are rejected.
pub fn decode_other_player<R: ReadMemory>(
    reader: &R,
    record: &Record,
    local_unit_id: u32,
) -> Result<Option<OtherPlayer>> {
    if record.pointer(unit::INVENTORY)? == 0 {
        return Ok(None);
    }
    let unit_id: u32 = record.get(unit::UNIT_ID)?;
    if unit_id == local_unit_id {
        return Ok(None);
    }

    let position = read_unit_position(reader, record.pointer(unit::PATH)?)?;
    if !position.is_placed() {
        return Ok(None);
    }

    let is_corpse: u8 = record.get(unit::IS_CORPSE)?;
    Ok(Some(OtherPlayer {
        name: read_player_name(reader, record)?,
        unit_id,
        position,
        is_corpse: is_corpse == 1,
        from_roster: false,
    }))
}

pub fn read_other_players<R: ReadMemory>(
    walker: &StructuralWalker<'_, R>,
    reader: &R,
    unit_table: u64,
    local_unit_id: u32,
) -> Result<Walk<OtherPlayer>> {
    let table = walker.table_address(unit_table, UnitKind::Player);
    walker.walk(table, |record| decode_other_player(reader, record, local_unit_id))
}

/// Add roster members on the same level that are not visible as units.
pub fn merge_party(
    players: &mut Vec<OtherPlayer>,
    party: &[PartyMember],
    level_no: u32,
    local_unit_id: u32,
) {
    let seen: HashSet<u32> = players.iter().map(|p| p.unit_id).collect();
    players.extend(
        party
            .iter()
            .filter(|m| m.area == level_no)
            .filter(|m| m.unit_id != local_unit_id && !seen.contains(&m.unit_id))
            .map(|m| OtherPlayer {
                name: m.name.clone(),
                unit_id: m.unit_id,
                position: m.position,
                is_corpse: false,
                from_roster: true,
            }),
    );
}

//! The local player's unit.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::game::players::read_player_name;
use crate::game::position::{Position, read_unit_position};
use crate::game::stats::{StatBlock, find_stat, stat_id};
use crate::process::layout::{act, act_misc, path, room, unit};
use crate::process::{ReadMemory, ValueKind};

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, strum::Display,
)]
pub enum Difficulty {
    #[default]
    Normal,
    Nightmare,
    Hell,
}

impl Difficulty {
    pub fn from_u16(value: u16) -> Option<Self> {
        match value {
            0 => Some(Self::Normal),
            1 => Some(Self::Nightmare),
            2 => Some(Self::Hell),
            _ => None,
        }
    }
}

/// Encrypted seed material from the act's misc block.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeedHashes {
    pub init_1: u32,
    pub init_2: u32,
    pub end_1: u32,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Progress {
    pub level: u32,
    pub experience: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocalPlayer {
    pub unit_id: u32,
    pub name: String,
    pub position: Position,
    /// Level (area) number.
    pub level_no: u32,
    pub difficulty: Difficulty,
    pub map_seed: u32,
    pub seed_hashes: SeedHashes,
    pub progress: Progress,
}

/// Area number through path → room → room ex → level.
pub fn read_level_no<R: ReadMemory>(reader: &R, path_ptr: u64) -> Result<u32> {
    let value = reader.read_chain(
        path::ROOM.address(path_ptr),
        &[
            room::ROOM_EX.offset as i64,
            room::LEVEL.offset as i64,
            room::LEVEL_NO.offset as i64,
        ],
        ValueKind::U32,
    )?;
    value
        .extract()
        .ok_or_else(|| Error::decode(path_ptr, "level number is not a u32"))
}

/// Decode the player unit at `pointer`. Level and experience come from
/// [`read_progress`] and are left at zero here.
pub fn read_local_player<R: ReadMemory>(reader: &R, pointer: u64) -> Result<LocalPlayer> {
    let record = reader.read_record(pointer, &unit::LAYOUT)?;

    let path_ptr = record.pointer(unit::PATH)?;
    let position = read_unit_position(reader, path_ptr)?;
    let level_no = read_level_no(reader, path_ptr)?;

    let act_ptr = record.pointer(unit::ACT)?;
    if act_ptr == 0 {
        return Err(Error::decode(pointer, "player has no act"));
    }
    let act_record = reader.read_record(act_ptr, &act::LAYOUT)?;
    let act_misc = act_record.pointer(act::ACT_MISC)?;
    let raw_difficulty = reader.read_field::<u16>(act_misc, act_misc::DIFFICULTY)?;
    let difficulty = Difficulty::from_u16(raw_difficulty).ok_or_else(|| {
        Error::decode(
            act_misc::DIFFICULTY.address(act_misc),
            format!("difficulty {}", raw_difficulty),
        )
    })?;

    Ok(LocalPlayer {
        unit_id: record.get(unit::UNIT_ID)?,
        name: read_player_name(reader, &record)?,
        position,
        level_no,
        difficulty,
        map_seed: act_record.get(act::MAP_SEED)?,
        seed_hashes: SeedHashes {
            init_1: reader.read_field(act_misc, act_misc::INIT_SEED_HASH)?,
            init_2: reader.read_field(act_misc, act_misc::INIT_SEED_HASH_2)?,
            end_1: reader.read_field(act_misc, act_misc::END_SEED_HASH)?,
        },
        progress: Progress::default(),
    })
}

/// Character level and experience from the player's stat list.
pub fn read_progress<R: ReadMemory>(reader: &R, pointer: u64) -> Result<Progress> {
    let stat_list = reader.read_field::<u64>(pointer, unit::STAT_LIST)?;
    let entries = StatBlock::read(reader, stat_list)?.base.read(reader)?;
    Ok(Progress {
        level: find_stat(&entries, stat_id::LEVEL).unwrap_or(0),
        experience: find_stat(&entries, stat_id::EXPERIENCE).unwrap_or(0),
    })
}

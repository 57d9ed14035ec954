use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::game::monsters;
use crate::game::position::{Position, read_unit_position};
use crate::game::stats::{Immunities, StatBlock, hit_points};
use crate::process::layout::{monster_data, unit};
use crate::process::{ReadMemory, Record};
use crate::walker::{StructuralWalker, UnitKind, Walk};

/// Bits of the monster data flag byte.
pub mod monster_flag {
    pub const SUPER_UNIQUE: u8 = 0x02;
    pub const CHAMPION: u8 = 0x04;
    pub const UNIQUE: u8 = 0x08;
    pub const MINION: u8 = 0x10;
}

/// Death animation modes.
const MODE_DEATH: u32 = 0;
const MODE_DEAD: u32 = 12;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Mob {
    pub unit_id: u32,
    pub txt_file_no: u32,
    pub unit_type: u32,
    pub mode: u32,
    pub position: Position,
    /// Super-unique id from the monster data block.
    pub unique_id: u16,
    pub flags: u8,
    pub is_boss: bool,
    /// Boss or super-unique name.
    pub title: Option<String>,
    pub is_player_minion: bool,
    pub town_npc: Option<String>,
    pub immunities: Immunities,
    pub hp: u32,
    pub max_hp: u32,
    pub is_hovered: bool,
    pub owner_id: u32,
}

impl Mob {
    pub fn is_dead(&self) -> bool {
        matches!(self.mode, MODE_DEATH | MODE_DEAD)
    }

    pub fn is_super_unique(&self) -> bool {
        self.flags & monster_flag::SUPER_UNIQUE != 0
    }

    pub fn is_unique(&self) -> bool {
        self.flags & monster_flag::UNIQUE != 0
    }

    pub fn is_champion(&self) -> bool {
        self.flags & monster_flag::CHAMPION != 0
    }

    pub fn is_minion(&self) -> bool {
        self.flags & monster_flag::MINION != 0
    }
}

/// Decode one monster unit. Hidden NPCs are rejected.
///
/// Minions skip the stat read; a hovered unit is only flagged when it is a
/// hostile monster.
pub fn decode_mob<R: ReadMemory>(
    reader: &R,
    record: &Record,
    hovered_unit_id: Option<u32>,
) -> Result<Option<Mob>> {
    let txt_file_no: u32 = record.get(unit::TXT_FILE_NO)?;
    if monsters::is_hidden_npc(txt_file_no) {
        return Ok(None);
    }

    let unit_id: u32 = record.get(unit::UNIT_ID)?;
    let unit_data = record.pointer(unit::UNIT_DATA)?;
    if unit_data == 0 {
        return Err(Error::decode(record.address(), "monster has no unit data"));
    }
    let data = reader.read_record(unit_data, &monster_data::LAYOUT)?;
    let unique_id: u16 = data.get(monster_data::UNIQUE_ID)?;
    let flags: u8 = data.get(monster_data::FLAGS)?;

    let position = read_unit_position(reader, record.pointer(unit::PATH)?)?;

    let stats = StatBlock::read(reader, record.pointer(unit::STAT_LIST)?)?;
    let is_player_minion = monsters::player_minion_name(txt_file_no).is_some()
        || stats.is_revived(reader).unwrap_or(false);
    let town_npc = monsters::town_npc_name(txt_file_no);

    let boss = monsters::boss_name(txt_file_no);
    let title = boss.or_else(|| {
        (flags & monster_flag::SUPER_UNIQUE != 0)
            .then(|| monsters::super_unique_name(unique_id))
            .flatten()
    });

    let mut mob = Mob {
        unit_id,
        txt_file_no,
        unit_type: record.get(unit::UNIT_TYPE)?,
        mode: record.get(unit::MODE)?,
        position,
        unique_id,
        flags,
        is_boss: boss.is_some(),
        title: title.map(str::to_string),
        is_player_minion,
        town_npc: town_npc.map(str::to_string),
        owner_id: data.get(monster_data::OWNER_ID)?,
        ..Mob::default()
    };

    if !is_player_minion {
        let entries = stats.base.read(reader)?;
        mob.immunities = Immunities::from_stats(&entries);
        (mob.hp, mob.max_hp) = hit_points(&entries);
        mob.is_hovered = town_npc.is_none() && hovered_unit_id == Some(unit_id);
    }

    Ok(Some(mob))
}

/// Every visible monster of the monster table.
pub fn read_mobs<R: ReadMemory>(
    walker: &StructuralWalker<'_, R>,
    reader: &R,
    unit_table: u64,
    hovered_unit_id: Option<u32>,
) -> Result<Walk<Mob>> {
    let table = walker.table_address(unit_table, UnitKind::Monster);
    walker.walk(table, |record| decode_mob(reader, record, hovered_unit_id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::fixture::{UnitSpec, monster_data_block, path_block, stat_list_block};
    use crate::game::stats::stat_id;
    use crate::process::{MockMemoryBuilder, MockMemoryReader, WriteMemory};

    const UNIT: usize = 0x000;
    const DATA: usize = 0x200;
    const PATH: usize = 0x240;
    const STATS: usize = 0x280;
    const ENTRIES: usize = 0x340;

    fn monster(
        txt_file_no: u32,
        flags: u8,
        unique_id: u16,
        stats: &[(u16, u32)],
    ) -> MockMemoryReader {
        let b = MockMemoryBuilder::new();
        let spec = UnitSpec {
            unit_type: 1,
            txt_file_no,
            unit_id: 900,
            mode: 1,
            unit_data: b.address(DATA),
            path: b.address(PATH),
            stat_list: b.address(STATS),
            ..UnitSpec::default()
        };
        let b = spec.write(b, UNIT);
        let b = monster_data_block(b, DATA, 0, unique_id, flags);
        let b = path_block(b, PATH, 5100, 5200);
        stat_list_block(b, STATS, ENTRIES, stats)
            .with_size(0xE00)
            .build()
    }

    fn decode(reader: &MockMemoryReader, hovered: Option<u32>) -> Result<Option<Mob>> {
        let record = reader.read_record(0x1000, &unit::LAYOUT)?;
        decode_mob(reader, &record, hovered)
    }

    #[test]
    fn test_decode_boss_with_immunities() {
        let reader = monster(
            156,
            0,
            0,
            &[
                (stat_id::POISON_RESIST, 100),
                (stat_id::HIT_POINTS, 1000 << 8),
                (stat_id::MAX_HIT_POINTS, 1200 << 8),
            ],
        );

        let mob = decode(&reader, Some(900)).unwrap().unwrap();
        assert_eq!(mob.unit_id, 900);
        assert!(mob.is_boss);
        assert_eq!(mob.title.as_deref(), Some("Andariel"));
        assert_eq!(mob.immunities.poison, 100);
        assert_eq!((mob.hp, mob.max_hp), (1000, 1200));
        assert_eq!(mob.position, Position::new(5100.0, 5200.0));
        assert!(mob.is_hovered);
    }

    #[test]
    fn test_hidden_npc_rejected() {
        let reader = monster(149, 0, 0, &[]);
        assert!(decode(&reader, None).unwrap().is_none());
    }

    #[test]
    fn test_super_unique_title() {
        let reader = monster(40, monster_flag::SUPER_UNIQUE, 440, &[]);
        let mob = decode(&reader, None).unwrap().unwrap();
        assert!(!mob.is_boss);
        assert!(mob.is_super_unique());
        assert_eq!(mob.title.as_deref(), Some("Pindleskin"));
    }

    #[test]
    fn test_minion_skips_stats_and_hover() {
        // an out-of-range stat count would fail the read if it were attempted
        let reader = monster(271, 0, 0, &[]);
        reader
            .write_u32(0x1000 + (STATS + 0x38) as u64, 100_000)
            .unwrap();

        let mob = decode(&reader, Some(900)).unwrap().unwrap();
        assert!(mob.is_player_minion);
        assert!(!mob.is_hovered);
        assert_eq!(mob.max_hp, 0);
    }

    #[test]
    fn test_town_npc_never_hovered() {
        let reader = monster(154, 0, 0, &[]);
        let mob = decode(&reader, Some(900)).unwrap().unwrap();
        assert_eq!(mob.town_npc.as_deref(), Some("Charsi"));
        assert!(!mob.is_hovered);
    }

    #[test]
    fn test_missing_unit_data_is_decode_error() {
        let reader = monster(40, 0, 0, &[]);
        reader.write_u64(0x1000 + 0x10, 0).unwrap();
        assert!(matches!(decode(&reader, None), Err(Error::Decode { .. })));
    }
}

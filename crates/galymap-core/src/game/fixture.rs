//! Builders for synthetic unit graphs used by the decoder tests.

use crate::process::MockMemoryBuilder;
use crate::process::layout::{item_data, monster_data, path, stat_list, unit};

#[derive(Debug, Clone, Copy, Default)]
pub struct UnitSpec {
    pub unit_type: u32,
    pub txt_file_no: u32,
    pub unit_id: u32,
    pub mode: u32,
    pub unit_data: u64,
    pub act: u64,
    pub path: u64,
    pub stat_list: u64,
    pub inventory: u64,
    pub next: u64,
    pub is_corpse: u8,
}

impl UnitSpec {
    pub fn write(&self, builder: MockMemoryBuilder, at: usize) -> MockMemoryBuilder {
        builder
            .write_u32(at + unit::UNIT_TYPE.offset, self.unit_type)
            .write_u32(at + unit::TXT_FILE_NO.offset, self.txt_file_no)
            .write_u32(at + unit::UNIT_ID.offset, self.unit_id)
            .write_u32(at + unit::MODE.offset, self.mode)
            .write_u64(at + unit::UNIT_DATA.offset, self.unit_data)
            .write_u64(at + unit::ACT.offset, self.act)
            .write_u64(at + unit::PATH.offset, self.path)
            .write_u64(at + unit::STAT_LIST.offset, self.stat_list)
            .write_u64(at + unit::INVENTORY.offset, self.inventory)
            .write_u64(at + unit::NEXT.offset, self.next)
            .write_u8(at + unit::IS_CORPSE.offset, self.is_corpse)
            .write_u8(at + unit::LAYOUT.size - 1, 0)
    }
}

/// Path block at `at` with whole-tile coordinates.
pub fn path_block(builder: MockMemoryBuilder, at: usize, x: u16, y: u16) -> MockMemoryBuilder {
    builder
        .write_u16(at + path::X.offset, x)
        .write_u16(at + path::Y.offset, y)
        .write_u16(at + path::ITEM_X.offset, x)
        .write_u16(at + path::ITEM_Y.offset, y)
        .write_u64(at + path::ROOM.offset, 0)
}

/// Stat list header at `at` whose base array lives at `entries_at`.
pub fn stat_list_block(
    builder: MockMemoryBuilder,
    at: usize,
    entries_at: usize,
    entries: &[(u16, u32)],
) -> MockMemoryBuilder {
    let entries_address = builder.address(entries_at);
    let mut builder = builder
        .write_u64(at + stat_list::STATS.offset, entries_address)
        .write_u32(at + stat_list::STAT_COUNT.offset, entries.len() as u32)
        .write_u32(at + stat_list::LAYOUT.size - 4, 0);
    for (i, (stat, value)) in entries.iter().enumerate() {
        let entry = entries_at + i * stat_list::ENTRY_SIZE;
        builder = builder
            .write_u16(entry + stat_list::ENTRY_STAT.offset, *stat)
            .write_u32(entry + stat_list::ENTRY_VALUE.offset, *value);
    }
    builder
}

pub fn monster_data_block(
    builder: MockMemoryBuilder,
    at: usize,
    owner_id: u32,
    unique_id: u16,
    flags: u8,
) -> MockMemoryBuilder {
    builder
        .write_u32(at + monster_data::OWNER_ID.offset, owner_id)
        .write_u16(at + monster_data::UNIQUE_ID.offset, unique_id)
        .write_u8(at + monster_data::FLAGS.offset, flags)
        .write_u8(at + monster_data::LAYOUT.size - 1, 0)
}

pub fn item_data_block(
    builder: MockMemoryBuilder,
    at: usize,
    quality: u32,
    flags: u32,
    unique_or_set_id: u32,
) -> MockMemoryBuilder {
    builder
        .write_u32(at + item_data::QUALITY.offset, quality)
        .write_u32(at + item_data::FLAGS.offset, flags)
        .write_u32(at + item_data::UNIQUE_OR_SET_ID.offset, unique_or_set_id)
        .write_u8(at + item_data::LAYOUT.size - 1, 0)
}

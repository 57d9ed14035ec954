//! Memory layouts for D2R data structures
//!
//! Field offsets are data, not code: every structure the decoders touch is
//! described here as a [`RecordLayout`] plus a set of [`Field`]s, so a game
//! patch that moves a field means editing one constant.
//!
//! # Unit Record Overview
//!
//! ```text
//! Offset   Field              Kind    Description
//! ──────────────────────────────────────────────────────
//! 0x000    Type               u32     0 player, 1 monster, 2 object, 3 missile, 4 item
//! 0x004    TxtFileNo          u32     Class id / monster id / item base id
//! 0x008    UnitId             u32     Unique per game
//! 0x00C    Mode               u32     Animation mode (item location for items)
//! 0x010    UnitData           ptr     Type-specific data block
//! 0x020    Act                ptr     Owning act
//! 0x038    Path               ptr     Position block
//! 0x088    StatListEx         ptr     Stat list
//! 0x090    Inventory          ptr     Inventory (null for most non-players)
//! 0x150    Next               ptr     Next unit in the same hash bucket
//! 0x1A6    IsCorpse           u8      Non-zero once dead
//! ```

use crate::error::{Error, Result};
use crate::process::value::{FromValue, StringEncoding, TypedValue, ValueKind};

/// One field of a remote structure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Field {
    pub name: &'static str,
    pub offset: usize,
    pub kind: ValueKind,
}

impl Field {
    pub const fn new(name: &'static str, offset: usize, kind: ValueKind) -> Self {
        Self { name, offset, kind }
    }

    pub const fn pointer(name: &'static str, offset: usize) -> Self {
        Self::new(name, offset, ValueKind::POINTER)
    }

    pub fn address(&self, base: u64) -> u64 {
        base.wrapping_add(self.offset as u64)
    }

    pub const fn end(&self) -> usize {
        self.offset + self.kind.size()
    }
}

/// Size and link field of a remote structure.
#[derive(Debug, PartialEq, Eq)]
pub struct RecordLayout {
    pub name: &'static str,
    pub size: usize,
    /// Pointer to the next record of a singly linked list, if the structure has one.
    pub next: Option<Field>,
}

/// A record copied out of remote memory in a single read.
///
/// Field access is bounds-checked against the layout's size and the field's
/// declared kind; reading past the record is a decode error, never a panic.
#[derive(Debug, Clone)]
pub struct Record {
    address: u64,
    layout: &'static RecordLayout,
    bytes: Vec<u8>,
}

impl Record {
    pub fn new(address: u64, layout: &'static RecordLayout, bytes: Vec<u8>) -> Result<Self> {
        if bytes.len() != layout.size {
            return Err(Error::decode(
                address,
                format!(
                    "{} record needs {} bytes, got {}",
                    layout.name,
                    layout.size,
                    bytes.len()
                ),
            ));
        }
        Ok(Self {
            address,
            layout,
            bytes,
        })
    }

    pub fn address(&self) -> u64 {
        self.address
    }

    pub fn layout(&self) -> &'static RecordLayout {
        self.layout
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    fn slice(&self, field: Field) -> Result<&[u8]> {
        if field.end() > self.layout.size {
            return Err(Error::decode(
                self.address,
                format!(
                    "field {} ({:#x}+{}) lies outside {} record of {} bytes",
                    field.name,
                    field.offset,
                    field.kind.size(),
                    self.layout.name,
                    self.layout.size
                ),
            ));
        }
        Ok(&self.bytes[field.offset..field.end()])
    }

    pub fn value(&self, field: Field) -> Result<TypedValue> {
        let bytes = self.slice(field)?;
        TypedValue::decode(field.kind, bytes)
            .map_err(|e| Error::decode(field.address(self.address), e.to_string()))
    }

    /// Read a fixed-size field as `T`. `T` must match the field's declared kind.
    pub fn get<T: FromValue>(&self, field: Field) -> Result<T> {
        if field.kind != T::KIND {
            return Err(Error::decode(
                self.address,
                format!("field {} is {}, not {}", field.name, field.kind, T::KIND),
            ));
        }
        let value = self.value(field)?;
        value.extract().ok_or_else(|| {
            Error::decode(self.address, format!("field {} kind mismatch", field.name))
        })
    }

    pub fn pointer(&self, field: Field) -> Result<u64> {
        self.get::<u64>(field)
    }

    pub fn string(&self, field: Field) -> Result<String> {
        match self.value(field)? {
            TypedValue::String(text) => Ok(text),
            other => Err(Error::decode(
                self.address,
                format!("field {} is {}, not a string", field.name, other.kind_name()),
            )),
        }
    }

    /// Link to the next record, or `None` if the layout is not a list node.
    pub fn next(&self) -> Result<Option<u64>> {
        self.layout.next.map(|field| self.pointer(field)).transpose()
    }
}

/// Unit records, shared by every unit kind in the hash tables
pub mod unit {
    use super::*;

    pub const UNIT_TYPE: Field = Field::new("unit_type", 0x00, ValueKind::U32);
    pub const TXT_FILE_NO: Field = Field::new("txt_file_no", 0x04, ValueKind::U32);
    pub const UNIT_ID: Field = Field::new("unit_id", 0x08, ValueKind::U32);
    /// Animation mode; for items this is the item location.
    pub const MODE: Field = Field::new("mode", 0x0C, ValueKind::U32);
    pub const UNIT_DATA: Field = Field::pointer("unit_data", 0x10);
    pub const ACT: Field = Field::pointer("act", 0x20);
    pub const PATH: Field = Field::pointer("path", 0x38);
    pub const STAT_LIST: Field = Field::pointer("stat_list", 0x88);
    pub const INVENTORY: Field = Field::pointer("inventory", 0x90);
    pub const NEXT: Field = Field::pointer("next", 0x150);
    pub const IS_CORPSE: Field = Field::new("is_corpse", 0x1A6, ValueKind::U8);

    pub static LAYOUT: RecordLayout = RecordLayout {
        name: "unit",
        size: 0x1A8,
        next: Some(NEXT),
    };
}

/// Position block referenced by `unit::PATH`
///
/// Positions are fixed point: the u16 whole part plus a u16 fraction of 1/65536.
/// Items store plain tile coordinates at 0x10/0x14 instead.
pub mod path {
    use super::*;

    pub const X_FRACTION: Field = Field::new("x_fraction", 0x00, ValueKind::U16);
    pub const X: Field = Field::new("x", 0x02, ValueKind::U16);
    pub const Y_FRACTION: Field = Field::new("y_fraction", 0x04, ValueKind::U16);
    pub const Y: Field = Field::new("y", 0x06, ValueKind::U16);
    pub const ITEM_X: Field = Field::new("item_x", 0x10, ValueKind::U16);
    pub const ITEM_Y: Field = Field::new("item_y", 0x14, ValueKind::U16);
    pub const ROOM: Field = Field::pointer("room", 0x20);

    pub static LAYOUT: RecordLayout = RecordLayout {
        name: "path",
        size: 0x28,
        next: None,
    };
}

/// Room and level links from a path to the current area number
pub mod room {
    use super::*;

    pub const ROOM_EX: Field = Field::pointer("room_ex", 0x18);
    pub const LEVEL: Field = Field::pointer("level", 0x90);
    pub const LEVEL_NO: Field = Field::new("level_no", 0x1F8, ValueKind::U32);
}

pub mod act {
    use super::*;

    pub const MAP_SEED: Field = Field::new("map_seed", 0x1C, ValueKind::U32);
    pub const ACT_MISC: Field = Field::pointer("act_misc", 0x78);

    pub static LAYOUT: RecordLayout = RecordLayout {
        name: "act",
        size: 0x80,
        next: None,
    };
}

pub mod act_misc {
    use super::*;

    pub const DIFFICULTY: Field = Field::new("difficulty", 0x830, ValueKind::U16);
    pub const INIT_SEED_HASH: Field = Field::new("init_seed_hash", 0x840, ValueKind::U32);
    pub const INIT_SEED_HASH_2: Field = Field::new("init_seed_hash_2", 0x844, ValueKind::U32);
    pub const END_SEED_HASH: Field = Field::new("end_seed_hash", 0x868, ValueKind::U32);
}

pub mod stat_list {
    use super::*;

    pub const STATS: Field = Field::pointer("stats", 0x30);
    pub const STAT_COUNT: Field = Field::new("stat_count", 0x38, ValueKind::U32);
    pub const EXTENDED_STATS: Field = Field::pointer("extended_stats", 0x88);
    pub const EXTENDED_STAT_COUNT: Field = Field::new("extended_stat_count", 0x90, ValueKind::U32);
    /// Offset of the state flags word; bit pattern 1 in the low five bits marks a revived unit.
    pub const STATE_FLAGS_OFFSET: u64 = 0xAC8 + 0x0C;

    pub static LAYOUT: RecordLayout = RecordLayout {
        name: "stat_list",
        size: 0xB4,
        next: None,
    };

    /// Entries in the stat arrays: `[layer u16][stat u16][value u32]`
    pub const ENTRY_SIZE: usize = 8;
    pub const ENTRY_STAT: Field = Field::new("stat", 0x02, ValueKind::U16);
    pub const ENTRY_VALUE: Field = Field::new("value", 0x04, ValueKind::U32);
    /// Upper bound on entries read from one array.
    pub const MAX_ENTRIES: u32 = 512;
}

pub mod monster_data {
    use super::*;

    pub const OWNER_ID: Field = Field::new("owner_id", 0x0C, ValueKind::U32);
    pub const UNIQUE_ID: Field = Field::new("unique_id", 0x18, ValueKind::U16);
    pub const FLAGS: Field = Field::new("flags", 0x1A, ValueKind::U8);

    pub static LAYOUT: RecordLayout = RecordLayout {
        name: "monster_data",
        size: 0x20,
        next: None,
    };
}

pub mod item_data {
    use super::*;

    pub const QUALITY: Field = Field::new("quality", 0x00, ValueKind::U32);
    pub const FLAGS: Field = Field::new("flags", 0x18, ValueKind::U32);
    pub const UNIQUE_OR_SET_ID: Field = Field::new("unique_or_set_id", 0x34, ValueKind::U32);

    pub static LAYOUT: RecordLayout = RecordLayout {
        name: "item_data",
        size: 0x90,
        next: None,
    };
}

/// Player unit data starts with the character name.
pub mod player_data {
    use super::*;

    pub const NAME: Field = Field::new(
        "name",
        0x00,
        ValueKind::String {
            max_len: 16,
            encoding: StringEncoding::Utf8,
        },
    );
}

pub mod inventory {
    use super::*;

    /// Reads 1 once the owning unit has left the game.
    pub const BASE_CHECK: Field = Field::new("base_check", 0x30, ValueKind::U16);
    /// Used instead of `BASE_CHECK` on expansion characters; reads 0 when stale.
    pub const EXPANSION_CHECK: Field = Field::new("expansion_check", 0x70, ValueKind::U16);
}

/// Block referenced by the expansion anchor
pub mod expansion {
    use super::*;

    pub const IS_EXPANSION: Field = Field::new("is_expansion", 0x5C, ValueKind::U16);
}

/// Party roster entries, a linked list headed at the roster anchor
pub mod roster {
    use super::*;

    pub const NAME: Field = Field::new(
        "name",
        0x00,
        ValueKind::String {
            max_len: 16,
            encoding: StringEncoding::Utf8,
        },
    );
    pub const UNIT_ID: Field = Field::new("unit_id", 0x48, ValueKind::U32);
    pub const PLAYER_LEVEL: Field = Field::new("player_level", 0x58, ValueKind::U16);
    pub const PARTY_ID: Field = Field::new("party_id", 0x5A, ValueKind::U16);
    pub const AREA: Field = Field::new("area", 0x5C, ValueKind::U32);
    pub const X: Field = Field::new("x", 0x60, ValueKind::U32);
    pub const Y: Field = Field::new("y", 0x64, ValueKind::U32);
    pub const NEXT: Field = Field::pointer("next", 0x148);

    pub static LAYOUT: RecordLayout = RecordLayout {
        name: "roster",
        size: 0x150,
        next: Some(NEXT),
    };
}

/// UI visibility flags, read from 0x0A bytes before the UI anchor
pub mod ui {
    use super::*;

    pub const ANCHOR_BACKOFF: u64 = 0x0A;

    pub const INVENTORY: Field = Field::new("inventory", 0x01, ValueKind::U8);
    pub const CHARACTER: Field = Field::new("character", 0x02, ValueKind::U8);
    pub const SKILL_SELECT: Field = Field::new("skill_select", 0x03, ValueKind::U8);
    pub const SKILL_TREE: Field = Field::new("skill_tree", 0x04, ValueKind::U8);
    pub const QUIT_MENU: Field = Field::new("quit_menu", 0x09, ValueKind::U8);
    pub const QUESTS: Field = Field::new("quests", 0x0E, ValueKind::U8);
    pub const WAYPOINT: Field = Field::new("waypoint", 0x13, ValueKind::U8);
    pub const PARTY: Field = Field::new("party", 0x15, ValueKind::U8);
    pub const STASH: Field = Field::new("stash", 0x18, ValueKind::U8);
    pub const MERCENARY: Field = Field::new("mercenary", 0x1E, ValueKind::U8);

    pub static LAYOUT: RecordLayout = RecordLayout {
        name: "ui",
        size: 0x20,
        next: None,
    };
}

pub mod hover {
    use super::*;

    pub const IS_HOVERED: Field = Field::new("is_hovered", 0x00, ValueKind::U8);
    pub const UNIT_TYPE: Field = Field::new("unit_type", 0x04, ValueKind::U32);
    pub const UNIT_ID: Field = Field::new("unit_id", 0x08, ValueKind::U32);

    pub static LAYOUT: RecordLayout = RecordLayout {
        name: "hover",
        size: 0x0C,
        next: None,
    };
}

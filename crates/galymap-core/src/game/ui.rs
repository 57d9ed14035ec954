use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::process::layout::{hover, ui};
use crate::process::{Field, ReadMemory, Record};

/// Visibility of the game's panels and menus.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UiFlags {
    pub inventory: bool,
    pub character: bool,
    pub skill_select: bool,
    pub skill_tree: bool,
    pub quit_menu: bool,
    pub quests: bool,
    pub waypoint: bool,
    pub party: bool,
    pub stash: bool,
    pub mercenary: bool,
}

impl UiFlags {
    fn decode(record: &Record) -> Result<Self> {
        let flag = |field: Field| -> Result<bool> { Ok(record.get::<u8>(field)? != 0) };
        Ok(Self {
            inventory: flag(ui::INVENTORY)?,
            character: flag(ui::CHARACTER)?,
            skill_select: flag(ui::SKILL_SELECT)?,
            skill_tree: flag(ui::SKILL_TREE)?,
            quit_menu: flag(ui::QUIT_MENU)?,
            quests: flag(ui::QUESTS)?,
            waypoint: flag(ui::WAYPOINT)?,
            party: flag(ui::PARTY)?,
            stash: flag(ui::STASH)?,
            mercenary: flag(ui::MERCENARY)?,
        })
    }

    /// A panel on the left half of the screen is open.
    pub fn left_panel(&self) -> bool {
        self.quests || self.character || self.mercenary || self.party || self.waypoint || self.stash
    }

    pub fn right_panel(&self) -> bool {
        self.skill_tree || self.inventory
    }

    /// Anything is covering the play area.
    pub fn menu_shown(&self) -> bool {
        self.left_panel() || self.right_panel() || self.quit_menu || self.skill_select
    }
}

/// The flags block starts a few bytes before the UI anchor.
pub fn read_ui<R: ReadMemory>(reader: &R, ui_anchor: u64) -> Result<UiFlags> {
    let address = reader
        .module_address(ui_anchor)
        .wrapping_sub(ui::ANCHOR_BACKOFF);
    let record = reader.read_record(address, &ui::LAYOUT)?;
    UiFlags::decode(&record)
}

/// Unit under the mouse cursor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Hover {
    pub unit_type: u32,
    pub unit_id: u32,
}

/// `None` when nothing is hovered.
pub fn read_hover<R: ReadMemory>(reader: &R, hover_anchor: u64) -> Result<Option<Hover>> {
    let record = reader.read_record(reader.module_address(hover_anchor), &hover::LAYOUT)?;
    if record.get::<u8>(hover::IS_HOVERED)? == 0 {
        return Ok(None);
    }
    Ok(Some(Hover {
        unit_type: record.get(hover::UNIT_TYPE)?,
        unit_id: record.get(hover::UNIT_ID)?,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::process::MockMemoryBuilder;

    #[test]
    fn test_read_ui_applies_backoff() {
        // anchor at 0x40, block at 0x36
        let reader = MockMemoryBuilder::new()
            .with_size(0x80)
            .write_u8(0x36 + 0x01, 1)
            .write_u8(0x36 + 0x18, 1)
            .build();

        let flags = read_ui(&reader, 0x40).unwrap();
        assert!(flags.inventory);
        assert!(flags.stash);
        assert!(flags.left_panel());
        assert!(flags.right_panel());
        assert!(flags.menu_shown());
    }

    #[test]
    fn test_quit_menu_alone_counts() {
        let reader = MockMemoryBuilder::new()
            .with_size(0x80)
            .write_u8(0x36 + 0x09, 1)
            .build();

        let flags = read_ui(&reader, 0x40).unwrap();
        assert!(!flags.left_panel());
        assert!(flags.menu_shown());
    }

    #[test]
    fn test_hover() {
        let reader = MockMemoryBuilder::new()
            .with_size(0x20)
            .write_u8(0x00, 1)
            .write_u32(0x04, 1)
            .write_u32(0x08, 4242)
            .build();
        assert_eq!(
            read_hover(&reader, 0).unwrap(),
            Some(Hover {
                unit_type: 1,
                unit_id: 4242
            })
        );

        let idle = MockMemoryBuilder::new().with_size(0x20).build();
        assert_eq!(read_hover(&idle, 0).unwrap(), None);
    }
}

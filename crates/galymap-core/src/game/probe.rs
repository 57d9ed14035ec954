use crate::error::Result;
use crate::game::position::read_unit_position;
use crate::process::ReadMemory;
use crate::process::layout::unit;
use crate::walker::{StructuralWalker, UnitKind};

/// Whether any player unit with an id and a placed position exists.
///
/// Cheap enough to poll while waiting in menus; the player oracle is only
/// worth starting once this turns true.
pub fn is_in_game<R: ReadMemory>(reader: &R, unit_table: u64) -> Result<bool> {
    let walker = StructuralWalker::units(reader);
    let table = walker.table_address(unit_table, UnitKind::Player);
    let found = walker.find_first(table, |record| {
        let unit_id: u32 = record.get(unit::UNIT_ID).ok()?;
        let position = read_unit_position(reader, record.pointer(unit::PATH).ok()?).ok()?;
        (unit_id != 0 && position.is_placed()).then_some(())
    })?;
    Ok(found.is_some())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::fixture::{UnitSpec, path_block};
    use crate::process::MockMemoryBuilder;

    const UNIT: usize = 0x800;
    const PATH: usize = 0xA00;

    fn world(unit_id: u32, x: u16) -> crate::process::MockMemoryReader {
        let b = MockMemoryBuilder::new();
        let (unit_addr, path_addr) = (b.address(UNIT), b.address(PATH));
        let b = b.write_u64(3 * 8, unit_addr);
        let b = UnitSpec {
            unit_id,
            path: path_addr,
            ..UnitSpec::default()
        }
        .write(b, UNIT);
        path_block(b, PATH, x, 100).build()
    }

    #[test]
    fn test_in_game() {
        assert!(is_in_game(&world(1, 5000), 0).unwrap());
    }

    #[test]
    fn test_menu_state() {
        assert!(!is_in_game(&world(0, 5000), 0).unwrap());
        assert!(!is_in_game(&world(1, 1), 0).unwrap());
    }

    #[test]
    fn test_empty_table() {
        let reader = MockMemoryBuilder::new().with_size(0x400).build();
        assert!(!is_in_game(&reader, 0).unwrap());
    }
}

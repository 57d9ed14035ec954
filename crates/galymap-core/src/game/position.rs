use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::process::ReadMemory;
use crate::process::layout::path;

/// World position in tiles.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Combine fixed-point halves: whole tiles plus a fraction of 1/65536.
    pub fn from_fixed(x: u16, x_fraction: u16, y: u16, y_fraction: u16) -> Self {
        Self {
            x: f64::from(x) + f64::from(x_fraction) / 65536.0,
            y: f64::from(y) + f64::from(y_fraction) / 65536.0,
        }
    }

    /// Both coordinates past the first tile; units at (0,0) or (1,1) are not placed yet.
    pub fn is_placed(&self) -> bool {
        self.x > 1.0 && self.y > 1.0
    }

    pub fn distance_to(&self, other: &Position) -> f64 {
        ((self.x - other.x).powi(2) + (self.y - other.y).powi(2)).sqrt()
    }
}

/// Fixed-point position of a mobile unit from its path block.
pub fn read_unit_position<R: ReadMemory>(reader: &R, path_ptr: u64) -> Result<Position> {
    if path_ptr == 0 {
        return Err(Error::decode(path_ptr, "unit has no path"));
    }
    let record = reader.read_record(path_ptr, &path::LAYOUT)?;
    Ok(Position::from_fixed(
        record.get(path::X)?,
        record.get(path::X_FRACTION)?,
        record.get(path::Y)?,
        record.get(path::Y_FRACTION)?,
    ))
}

/// Tile position of an item; items keep whole coordinates in their own slots.
pub fn read_item_position<R: ReadMemory>(reader: &R, path_ptr: u64) -> Result<Position> {
    if path_ptr == 0 {
        return Err(Error::decode(path_ptr, "item has no path"));
    }
    let record = reader.read_record(path_ptr, &path::LAYOUT)?;
    let x: u16 = record.get(path::ITEM_X)?;
    let y: u16 = record.get(path::ITEM_Y)?;
    Ok(Position::new(f64::from(x), f64::from(y)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::process::MockMemoryBuilder;

    #[test]
    fn test_fixed_point() {
        let pos = Position::from_fixed(5000, 32768, 4800, 16384);
        assert_eq!(pos.x, 5000.5);
        assert_eq!(pos.y, 4800.25);
    }

    #[test]
    fn test_is_placed() {
        assert!(!Position::new(1.0, 50.0).is_placed());
        assert!(Position::new(1.5, 50.0).is_placed());
    }

    #[test]
    fn test_read_unit_position() {
        let reader = MockMemoryBuilder::new()
            .write_u16(0x00, 0x8000)
            .write_u16(0x02, 5120)
            .write_u16(0x04, 0)
            .write_u16(0x06, 5050)
            .with_size(0x40)
            .build();

        let pos = read_unit_position(&reader, 0x1000).unwrap();
        assert_eq!(pos, Position::new(5120.5, 5050.0));
    }

    #[test]
    fn test_read_item_position() {
        let reader = MockMemoryBuilder::new()
            .write_u16(0x10, 77)
            .write_u16(0x14, 88)
            .with_size(0x40)
            .build();

        assert_eq!(
            read_item_position(&reader, 0x1000).unwrap(),
            Position::new(77.0, 88.0)
        );
    }

    #[test]
    fn test_null_path_is_decode_error() {
        let reader = MockMemoryBuilder::new().with_size(0x40).build();
        assert!(matches!(
            read_unit_position(&reader, 0),
            Err(Error::Decode { .. })
        ));
    }
}

//! Traversal of the game's unit hash tables.
//!
//! Every unit kind lives in a table of 128 chain heads. Each chain is a singly
//! linked list threaded through the records' `next` field. Chains end at a
//! null link, at a link back to the current record, or after a step cap,
//! whichever comes first, so corrupted memory can never hang a pass.

use std::ops::ControlFlow;

use tracing::{debug, trace};

use crate::error::Result;
use crate::process::layout::unit;
use crate::process::{ReadMemory, Record, RecordLayout};

/// Chain heads per unit table.
pub const BUCKET_COUNT: usize = 128;

/// Records visited per chain before it is cut short.
pub const DEFAULT_STEP_CAP: usize = 1024;

/// Unit kinds, in the order their tables follow each other in memory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display, strum::EnumIter)]
#[strum(serialize_all = "snake_case")]
pub enum UnitKind {
    Player = 0,
    Monster = 1,
    Object = 2,
    Missile = 3,
    Item = 4,
}

impl UnitKind {
    pub fn type_code(self) -> u32 {
        self as u32
    }

    /// Module-relative offset of this kind's table.
    pub fn table_offset(self, unit_table: u64) -> u64 {
        unit_table + (self as u64) * (BUCKET_COUNT as u64) * 8
    }
}

/// Counters for one walk, mainly for logging.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WalkStats {
    pub visited: usize,
    pub accepted: usize,
    pub rejected: usize,
    /// Records that could not be read or failed to decode.
    pub skipped: usize,
    /// Chains stopped by the step cap rather than by a terminator.
    pub truncated: usize,
}

#[derive(Debug, Clone)]
pub struct Walk<T> {
    pub items: Vec<T>,
    pub stats: WalkStats,
}

/// Generic walker over fixed-size linked records.
pub struct StructuralWalker<'a, R: ReadMemory> {
    reader: &'a R,
    layout: &'static RecordLayout,
    bucket_count: usize,
    step_cap: usize,
}

impl<'a, R: ReadMemory> StructuralWalker<'a, R> {
    /// Walker over unit records.
    pub fn units(reader: &'a R) -> Self {
        Self::new(reader, &unit::LAYOUT)
    }

    pub fn new(reader: &'a R, layout: &'static RecordLayout) -> Self {
        Self {
            reader,
            layout,
            bucket_count: BUCKET_COUNT,
            step_cap: DEFAULT_STEP_CAP,
        }
    }

    pub fn with_bucket_count(mut self, bucket_count: usize) -> Self {
        self.bucket_count = bucket_count;
        self
    }

    pub fn with_step_cap(mut self, step_cap: usize) -> Self {
        self.step_cap = step_cap.max(1);
        self
    }

    /// Absolute address of the first bucket of `kind`'s table.
    pub fn table_address(&self, unit_table: u64, kind: UnitKind) -> u64 {
        self.reader.module_address(kind.table_offset(unit_table))
    }

    /// Read all chain heads of a table in one round trip.
    ///
    /// This is an anchor-level read: failure aborts the pass.
    pub fn read_heads(&self, table: u64) -> Result<Vec<u64>> {
        let bytes = self.reader.read_bytes(table, self.bucket_count * 8)?;
        Ok(bytes
            .chunks_exact(8)
            .map(|chunk| {
                let mut raw = [0u8; 8];
                raw.copy_from_slice(chunk);
                u64::from_le_bytes(raw)
            })
            .collect())
    }

    /// Visit every record reachable from one chain head.
    ///
    /// Returning `ControlFlow::Break` from the visitor stops this chain.
    pub fn walk_chain<F>(&self, head: u64, stats: &mut WalkStats, mut visit: F)
    where
        F: FnMut(&Record) -> ControlFlow<()>,
    {
        let mut current = head;
        let mut steps = 0;

        while current != 0 {
            if steps >= self.step_cap {
                debug!(
                    "Chain from {:#x} exceeded {} steps, cutting it short",
                    head, self.step_cap
                );
                stats.truncated += 1;
                break;
            }
            steps += 1;
            stats.visited += 1;

            let record = match self.reader.read_record(current, self.layout) {
                Ok(record) => record,
                Err(e) => {
                    debug!("Skipping unreadable {} at {:#x}: {}", self.layout.name, current, e);
                    stats.skipped += 1;
                    break;
                }
            };

            if visit(&record).is_break() {
                break;
            }

            let next = match record.next() {
                Ok(Some(next)) => next,
                Ok(None) => break,
                Err(e) => {
                    debug!("Bad link in {} at {:#x}: {}", self.layout.name, current, e);
                    break;
                }
            };
            if next == current {
                trace!("Self-referencing link at {:#x}", current);
                break;
            }
            current = next;
        }
    }

    /// Decode every record of a table.
    ///
    /// `decode` returns `Ok(Some(_))` to accept, `Ok(None)` to reject, and an
    /// error to skip the record. Record errors never abort the pass.
    pub fn walk<T, F>(&self, table: u64, mut decode: F) -> Result<Walk<T>>
    where
        F: FnMut(&Record) -> Result<Option<T>>,
    {
        let heads = self.read_heads(table)?;
        let mut stats = WalkStats::default();
        let mut items = Vec::new();
        let mut failed = 0;

        for head in heads {
            self.walk_chain(head, &mut stats, |record| {
                match decode(record) {
                    Ok(Some(item)) => items.push(item),
                    Ok(None) => {}
                    Err(e) => {
                        debug!(
                            "Skipping {} at {:#x}: {}",
                            self.layout.name,
                            record.address(),
                            e
                        );
                        failed += 1;
                    }
                }
                ControlFlow::Continue(())
            });
        }

        stats.skipped += failed;
        stats.accepted = items.len();
        stats.rejected = stats.visited - stats.accepted - stats.skipped;
        Ok(Walk { items, stats })
    }

    /// First record of a table accepted by `probe`, scanning buckets in order.
    pub fn find_first<T, F>(&self, table: u64, mut probe: F) -> Result<Option<T>>
    where
        F: FnMut(&Record) -> Option<T>,
    {
        let heads = self.read_heads(table)?;
        let mut stats = WalkStats::default();
        let mut found = None;

        for head in heads {
            self.walk_chain(head, &mut stats, |record| match probe(record) {
                Some(item) => {
                    found = Some(item);
                    ControlFlow::Break(())
                }
                None => ControlFlow::Continue(()),
            });
            if found.is_some() {
                break;
            }
        }
        Ok(found)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::process::MockMemoryBuilder;

    const TABLE: usize = 0x0;
    const RECORDS: usize = 0x1000;

    fn record_offset(index: usize) -> usize {
        RECORDS + index * 0x200
    }

    #[test]
    fn test_table_offsets() {
        assert_eq!(UnitKind::Player.table_offset(0x100), 0x100);
        assert_eq!(UnitKind::Monster.table_offset(0x100), 0x100 + 0x400);
        assert_eq!(UnitKind::Item.table_offset(0x100), 0x100 + 4 * 0x400);
    }

    #[test]
    fn test_walk_collects_every_bucket() {
        let builder = MockMemoryBuilder::new().with_size(0x2000);
        let a = builder.address(record_offset(0));
        let b = builder.address(record_offset(1));
        let c = builder.address(record_offset(2));
        let reader = builder
            .write_u64(TABLE, a)
            .write_u64(TABLE + 5 * 8, c)
            .write_u32(record_offset(0) + 0x08, 1)
            .write_u64(record_offset(0) + 0x150, b)
            .write_u32(record_offset(1) + 0x08, 2)
            .write_u32(record_offset(2) + 0x08, 3)
            .build();

        let walker = StructuralWalker::units(&reader);
        let walk = walker
            .walk(0x1000, |record| record.get::<u32>(unit::UNIT_ID).map(Some))
            .unwrap();

        assert_eq!(walk.items, vec![1, 2, 3]);
        assert_eq!(walk.stats.visited, 3);
        assert_eq!(walk.stats.accepted, 3);
    }

    #[test]
    fn test_reject_and_skip_are_counted() {
        let builder = MockMemoryBuilder::new().with_size(0x2000);
        let a = builder.address(record_offset(0));
        let b = builder.address(record_offset(1));
        let reader = builder
            .write_u64(TABLE, a)
            .write_u64(record_offset(0) + 0x150, b)
            .write_u32(record_offset(0) + 0x08, 7)
            .write_u32(record_offset(1) + 0x08, 8)
            .build();

        let walker = StructuralWalker::units(&reader);
        let walk = walker
            .walk(0x1000, |record| {
                let id = record.get::<u32>(unit::UNIT_ID)?;
                if id == 7 {
                    Ok(None::<u32>)
                } else {
                    Err(Error::decode(record.address(), "bad discriminant"))
                }
            })
            .unwrap();

        assert!(walk.items.is_empty());
        assert_eq!(walk.stats.visited, 2);
        assert_eq!(walk.stats.rejected, 1);
        assert_eq!(walk.stats.skipped, 1);
    }

    #[test]
    fn test_unreadable_record_ends_only_its_chain() {
        let builder = MockMemoryBuilder::new().with_size(0x2000);
        let good = builder.address(record_offset(0));
        let reader = builder
            .write_u64(TABLE, 0xDEAD_0000)
            .write_u64(TABLE + 8, good)
            .write_u32(record_offset(0) + 0x08, 42)
            .build();

        let walk = StructuralWalker::units(&reader)
            .walk(0x1000, |record| record.get::<u32>(unit::UNIT_ID).map(Some))
            .unwrap();

        assert_eq!(walk.items, vec![42]);
        assert_eq!(walk.stats.skipped, 1);
    }

    #[test]
    fn test_unreadable_table_aborts() {
        let reader = MockMemoryBuilder::new().with_size(0x10).build();

        let result = StructuralWalker::units(&reader).walk(0x1000, |_| Ok(Some(())));
        assert!(matches!(result, Err(Error::Transport { .. })));
    }

    #[test]
    fn test_step_cap_bounds_long_cycles() {
        // a <-> b: neither link is a self-reference
        let builder = MockMemoryBuilder::new().with_size(0x2000);
        let a = builder.address(record_offset(0));
        let b = builder.address(record_offset(1));
        let reader = builder
            .write_u64(TABLE, a)
            .write_u64(record_offset(0) + 0x150, b)
            .write_u64(record_offset(1) + 0x150, a)
            .build();

        let walk = StructuralWalker::units(&reader)
            .with_step_cap(10)
            .walk(0x1000, |_| Ok(Some(())))
            .unwrap();

        assert_eq!(walk.items.len(), 10);
        assert_eq!(walk.stats.truncated, 1);
    }

    #[test]
    fn test_find_first_stops_early() {
        let builder = MockMemoryBuilder::new().with_size(0x2000);
        let a = builder.address(record_offset(0));
        let b = builder.address(record_offset(1));
        let reader = builder
            .write_u64(TABLE + 3 * 8, a)
            .write_u64(TABLE + 9 * 8, b)
            .write_u32(record_offset(0) + 0x08, 10)
            .write_u32(record_offset(1) + 0x08, 20)
            .build();

        let mut seen = Vec::new();
        let found = StructuralWalker::units(&reader)
            .find_first(0x1000, |record| {
                let id = record.get::<u32>(unit::UNIT_ID).ok()?;
                seen.push(id);
                (id >= 10).then_some(id)
            })
            .unwrap();

        assert_eq!(found, Some(10));
        assert_eq!(seen, vec![10]);
    }
}

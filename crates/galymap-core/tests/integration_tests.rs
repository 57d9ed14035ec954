//! Integration tests for galymap-core
//!
//! These tests verify that multiple modules work together correctly.
//! Decoder tests against synthetic unit graphs live in unit tests within the crate.

use galymap_core::process::layout::unit;
use galymap_core::process::{MockMemoryBuilder, ReadMemory, TypedValue, ValueKind};
use galymap_core::retry::{ExponentialBackoff, FixedDelay, NoRetry, RetryStrategy};
use galymap_core::walker::{StructuralWalker, UnitKind};

/// Bounded chain traversal
mod walker_tests {
    use super::*;

    const HEAD: usize = 0x0;
    const FIRST: usize = 0x100;
    const SECOND: usize = 0x300;
    const THIRD: usize = 0x500;

    fn unit_at(builder: MockMemoryBuilder, at: usize, unit_id: u32, next: u64) -> MockMemoryBuilder {
        builder
            .write_u32(at + unit::UNIT_ID.offset, unit_id)
            .write_u64(at + unit::NEXT.offset, next)
            .write_u8(at + unit::LAYOUT.size - 1, 0)
    }

    #[test]
    fn test_self_link_stops_after_second_record() {
        let b = MockMemoryBuilder::new();
        let (first, second, third) = (b.address(FIRST), b.address(SECOND), b.address(THIRD));
        let b = b.write_u64(HEAD, first);
        let b = unit_at(b, FIRST, 1, second);
        // second links to itself; third is never reached
        let b = unit_at(b, SECOND, 2, second);
        let reader = unit_at(b, THIRD, 3, 0).build();

        let walker = StructuralWalker::units(&reader).with_bucket_count(1);
        let walk = walker
            .walk(reader.module_address(HEAD as u64), |record| {
                record.get::<u32>(unit::UNIT_ID).map(Some)
            })
            .unwrap();

        assert_eq!(walk.items, vec![1, 2]);
        assert_eq!(walk.stats.visited, 2);
        assert_eq!(walk.stats.truncated, 0);
    }

    #[test]
    fn test_long_cycle_is_cut_by_step_cap() {
        let b = MockMemoryBuilder::new();
        let (first, second) = (b.address(FIRST), b.address(SECOND));
        let b = b.write_u64(HEAD, first);
        let b = unit_at(b, FIRST, 1, second);
        let reader = unit_at(b, SECOND, 2, first).build();

        let walker = StructuralWalker::units(&reader)
            .with_bucket_count(1)
            .with_step_cap(10);
        let walk = walker
            .walk(reader.module_address(HEAD as u64), |record| {
                record.get::<u32>(unit::UNIT_ID).map(Some)
            })
            .unwrap();

        assert_eq!(walk.items.len(), 10);
        assert_eq!(walk.stats.truncated, 1);
    }

    #[test]
    fn test_unreadable_record_skips_only_its_chain() {
        let b = MockMemoryBuilder::new();
        let first = b.address(FIRST);
        let b = b.write_u64(HEAD, 0xDEAD_0000).write_u64(HEAD + 8, first);
        let reader = unit_at(b, FIRST, 7, 0).build();

        let walker = StructuralWalker::units(&reader).with_bucket_count(2);
        let walk = walker
            .walk(reader.module_address(HEAD as u64), |record| {
                record.get::<u32>(unit::UNIT_ID).map(Some)
            })
            .unwrap();

        assert_eq!(walk.items, vec![7]);
        assert_eq!(walk.stats.skipped, 1);
    }

    #[test]
    fn test_unit_tables_are_consecutive() {
        assert_eq!(UnitKind::Player.table_offset(0x1000), 0x1000);
        assert_eq!(UnitKind::Monster.table_offset(0x1000), 0x1400);
        assert_eq!(UnitKind::Item.table_offset(0x1000), 0x1000 + 4 * 128 * 8);
    }
}

/// Pointer chains against direct reads
mod pointer_chain_tests {
    use super::*;

    fn reader() -> galymap_core::process::MockMemoryReader {
        let b = MockMemoryBuilder::new();
        let (second, target) = (b.address(0x100), b.address(0x200));
        b.write_u64(0x00, second)
            .write_u64(0x110, target - 0x8)
            .write_u32(0x200, 0xCAFE_F00D)
            .write_u32(0x20, 0x1234)
            .build()
    }

    #[test]
    fn test_empty_chain_is_direct_read() {
        let reader = reader();
        let base = reader.module_address(0x20);
        assert_eq!(reader.read_pointer_chain(base, &[]).unwrap(), base);
        assert_eq!(
            reader.read_chain(base, &[], ValueKind::U32).unwrap(),
            reader.read(base, ValueKind::U32).unwrap()
        );
    }

    #[test]
    fn test_two_hops_match_manual_reads() {
        let reader = reader();
        let base = reader.module_address(0);

        let manual = {
            let intermediate = reader.read_pointer(base).unwrap() + 0x10;
            reader.read_pointer(intermediate).unwrap() + 0x8
        };

        assert_eq!(reader.read_pointer_chain(base, &[0x10, 0x8]).unwrap(), manual);
        assert_eq!(
            reader.read_chain(base, &[0x10, 0x8], ValueKind::U32).unwrap(),
            TypedValue::U32(0xCAFE_F00D)
        );
    }

    #[test]
    fn test_null_hop_is_decode_error() {
        let reader = reader();
        let result = reader.read_pointer_chain(reader.module_address(0x40), &[0x0]);
        assert!(matches!(result, Err(galymap_core::Error::Decode { .. })));
    }

    #[test]
    fn test_closed_target_fails_fast() {
        let reader = reader();
        reader.close();
        let error = reader.read_u32(reader.module_address(0x20)).unwrap_err();
        assert!(error.is_record_level());
        assert!(!reader.is_alive());
    }
}

/// Snapshot publication seen from concurrent readers
mod snapshot_tests {
    use std::sync::Arc;
    use std::thread;

    use galymap_core::snapshot::{Snapshot, SnapshotStore};

    fn snapshot_with(mobs: usize) -> Snapshot {
        Snapshot {
            in_game: true,
            mobs: vec![Default::default(); mobs],
            ..Snapshot::default()
        }
    }

    #[test]
    fn test_held_generation_stays_consistent() {
        let store = Arc::new(SnapshotStore::new());
        store.publish(snapshot_with(1));
        let held = store.current();

        let writer = {
            let store = Arc::clone(&store);
            thread::spawn(move || store.publish(snapshot_with(2)))
        };
        let published = writer.join().unwrap();

        assert_eq!(held.generation, 1);
        assert_eq!(held.mobs.len(), 1);
        assert_eq!(published, 2);
        let next = store.current();
        assert_eq!(next.generation, 2);
        assert_eq!(next.mobs.len(), 2);
    }

    #[test]
    fn test_readers_never_see_a_mix() {
        // generation N always carries N mobs
        let store = Arc::new(SnapshotStore::new());

        let writer = {
            let store = Arc::clone(&store);
            thread::spawn(move || {
                for n in 1..=200 {
                    store.publish(snapshot_with(n));
                }
            })
        };
        let readers: Vec<_> = (0..4)
            .map(|_| {
                let store = Arc::clone(&store);
                thread::spawn(move || {
                    let mut last = 0;
                    for _ in 0..500 {
                        let snapshot = store.current();
                        assert_eq!(snapshot.mobs.len() as u64, snapshot.generation);
                        assert!(snapshot.generation >= last);
                        last = snapshot.generation;
                    }
                })
            })
            .collect();

        writer.join().unwrap();
        for reader in readers {
            reader.join().unwrap();
        }
        assert_eq!(store.generation(), 200);
    }
}

/// Retry strategy tests
mod retry_tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_exponential_backoff_delays() {
        let strategy = ExponentialBackoff::new();
        assert_eq!(strategy.max_attempts(), 5);
        assert_eq!(strategy.delay_for_attempt(0), Some(Duration::from_millis(100)));
        assert_eq!(strategy.delay_for_attempt(4), Some(Duration::from_millis(1600)));
        assert_eq!(strategy.delay_for_attempt(9), Some(Duration::from_millis(1600)));
    }

    #[test]
    fn test_execute_returns_last_error() {
        let strategy = FixedDelay::new(3, Duration::ZERO);
        let mut calls = 0;
        let result: Result<(), u32> = strategy.execute(|attempt| {
            calls += 1;
            Err(attempt)
        });
        assert_eq!(result, Err(2));
        assert_eq!(calls, 3);
    }

    #[test]
    fn test_execute_stops_on_success() {
        let strategy = FixedDelay::new(5, Duration::ZERO);
        let result: Result<u32, ()> =
            strategy.execute(|attempt| if attempt == 1 { Ok(attempt) } else { Err(()) });
        assert_eq!(result, Ok(1));
    }

    #[test]
    fn test_no_retry_single_attempt() {
        let mut calls = 0;
        let result: Result<(), ()> = NoRetry.execute(|_| {
            calls += 1;
            Err(())
        });
        assert!(result.is_err());
        assert_eq!(calls, 1);
    }
}

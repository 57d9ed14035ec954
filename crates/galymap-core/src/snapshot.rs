//! The published result of one poll tick.

use std::sync::{Arc, PoisonError, RwLock};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::game::{GroundItem, LocalPlayer, Mob, OtherPlayer, PartyMember, UiFlags};
use crate::walker::WalkStats;

/// One complete generation of decoded records.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    /// Assigned by [`SnapshotStore::publish`]; 0 means never published.
    pub generation: u64,
    pub captured_at: DateTime<Utc>,
    pub in_game: bool,
    pub player: Option<LocalPlayer>,
    pub mobs: Vec<Mob>,
    pub hovered_mob: Option<Mob>,
    pub items: Vec<GroundItem>,
    pub other_players: Vec<OtherPlayer>,
    pub party: Vec<PartyMember>,
    pub ui: UiFlags,
    #[serde(skip)]
    pub walk_stats: PassStats,
}

impl Snapshot {
    /// Empty "not in a game" snapshot.
    pub fn not_in_game() -> Self {
        Self {
            captured_at: Utc::now(),
            ..Self::default()
        }
    }
}

/// Walker counters of the passes that produced a snapshot.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PassStats {
    pub mobs: WalkStats,
    pub items: WalkStats,
    pub players: WalkStats,
}

/// Latest published snapshot, shared between the poller and any readers.
///
/// Readers get an `Arc` to a finished generation and keep it as long as they
/// like; the write lock is held only for the pointer swap.
#[derive(Debug, Default)]
pub struct SnapshotStore {
    current: RwLock<Arc<Snapshot>>,
}

impl SnapshotStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the visible snapshot and return its generation number.
    pub fn publish(&self, mut snapshot: Snapshot) -> u64 {
        let mut current = self.current.write().unwrap_or_else(PoisonError::into_inner);
        let generation = current.generation + 1;
        snapshot.generation = generation;
        *current = Arc::new(snapshot);
        generation
    }

    pub fn current(&self) -> Arc<Snapshot> {
        let current = self.current.read().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(&*current)
    }

    pub fn generation(&self) -> u64 {
        self.current().generation
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generations_increase() {
        let store = SnapshotStore::new();
        assert_eq!(store.generation(), 0);
        assert!(!store.current().in_game);

        assert_eq!(store.publish(Snapshot::not_in_game()), 1);
        let second = Snapshot {
            in_game: true,
            ..Snapshot::default()
        };
        assert_eq!(store.publish(second), 2);

        let current = store.current();
        assert_eq!(current.generation, 2);
        assert!(current.in_game);
    }

    #[test]
    fn test_reader_keeps_its_generation() {
        let store = SnapshotStore::new();
        store.publish(Snapshot::not_in_game());
        let held = store.current();

        store.publish(Snapshot {
            in_game: true,
            ..Snapshot::default()
        });

        assert_eq!(held.generation, 1);
        assert!(!held.in_game);
        assert_eq!(store.current().generation, 2);
    }
}

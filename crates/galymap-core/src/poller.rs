//! The periodic scan-decode-publish loop.
//!
//! Each tick locates the player through the oracle, runs the enabled walker
//! passes and publishes one snapshot. Record-level failures only shrink a
//! list; anchor-level failures abort the tick and keep the previous snapshot;
//! a target that stops answering ends the loop with `TargetLost`.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tracing::{debug, error, info, trace, warn};

use crate::config::Config;
use crate::error::{Error, Result};
use crate::game::{
    GroundItem, Hover, PartyMember, Progress, merge_party, read_hover, read_items,
    read_local_player, read_mobs, read_other_players, read_party, read_progress, read_ui,
};
use crate::offset::{AnchorTable, names};
use crate::oracle::{OracleAnchors, OracleState, PlayerOracle};
use crate::process::ReadMemory;
use crate::retry::{ExponentialBackoff, RetryStrategy};
use crate::shutdown::ShutdownSignal;
use crate::snapshot::{PassStats, Snapshot, SnapshotStore};
use crate::walker::{StructuralWalker, WalkStats};

/// Module-relative anchors the poller reads through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollerAnchors {
    pub unit_table: u64,
    pub ui: Option<u64>,
    pub expansion: Option<u64>,
    pub hover: Option<u64>,
    pub roster: Option<u64>,
}

impl PollerAnchors {
    /// Only the unit table is mandatory; a missing optional anchor disables its feature.
    pub fn from_table(table: &AnchorTable) -> Result<Self> {
        let anchors = Self {
            unit_table: table.require(names::UNIT_TABLE)?,
            ui: table.get(names::UI),
            expansion: table.get(names::EXPANSION),
            hover: table.get(names::HOVER),
            roster: table.get(names::ROSTER),
        };
        for (name, anchor) in [
            (names::UI, anchors.ui),
            (names::HOVER, anchors.hover),
            (names::ROSTER, anchors.roster),
        ] {
            if anchor.is_none() {
                warn!("Anchor '{}' missing, dependent feature disabled", name);
            }
        }
        Ok(anchors)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollOutcome {
    /// A new in-game snapshot was published.
    Published(u64),
    /// No player was found; an empty snapshot was published.
    NotInGame(u64),
    /// The tick was aborted and the previous snapshot stays visible.
    Retained,
}

/// Values refreshed less often than every tick.
#[derive(Debug, Default)]
struct Carry {
    progress: Progress,
    party: Vec<PartyMember>,
    items: Vec<GroundItem>,
    item_stats: WalkStats,
    hover: Option<Hover>,
}

pub struct Poller<'a, R: ReadMemory, S: RetryStrategy = ExponentialBackoff> {
    reader: &'a R,
    anchors: PollerAnchors,
    config: Config,
    oracle: PlayerOracle,
    store: Arc<SnapshotStore>,
    retry: S,
    tick: u64,
    carry: Carry,
}

impl<'a, R: ReadMemory> Poller<'a, R> {
    pub fn new(
        reader: &'a R,
        anchors: PollerAnchors,
        config: Config,
        store: Arc<SnapshotStore>,
    ) -> Self {
        let oracle = PlayerOracle::from_config(
            OracleAnchors {
                unit_table: anchors.unit_table,
                expansion: anchors.expansion,
            },
            &config.oracle,
        )
        .with_step_cap(config.walker.step_cap);
        let retry = ExponentialBackoff::with_max_attempts(config.polling.liveness_retries);

        Self {
            reader,
            anchors,
            config,
            oracle,
            store,
            retry,
            tick: 0,
            carry: Carry::default(),
        }
    }
}

impl<'a, R: ReadMemory, S: RetryStrategy> Poller<'a, R, S> {
    /// Replace the liveness retry strategy.
    pub fn with_retry<T: RetryStrategy>(self, retry: T) -> Poller<'a, R, T> {
        Poller {
            reader: self.reader,
            anchors: self.anchors,
            config: self.config,
            oracle: self.oracle,
            store: self.store,
            retry,
            tick: self.tick,
            carry: self.carry,
        }
    }

    pub fn oracle(&self) -> &PlayerOracle {
        &self.oracle
    }

    pub fn store(&self) -> &Arc<SnapshotStore> {
        &self.store
    }

    /// Ticks run so far.
    pub fn ticks(&self) -> u64 {
        self.tick
    }

    /// Poll until shutdown is requested or the target is lost.
    pub fn run(&mut self, shutdown: &ShutdownSignal) -> Result<()> {
        let interval = Duration::from_millis(self.config.polling.interval_ms);
        info!("Poller started ({}ms interval)", interval.as_millis());

        while !shutdown.is_shutdown() {
            match self.poll_once()? {
                PollOutcome::Published(generation) => trace!("Published generation {}", generation),
                PollOutcome::NotInGame(generation) => {
                    trace!("Not in game (generation {})", generation)
                }
                PollOutcome::Retained => debug!("Keeping previous snapshot"),
            }
            if shutdown.wait(interval) {
                break;
            }
        }

        info!("Poller stopped after {} ticks", self.tick);
        Ok(())
    }

    /// Run one tick. The only error returned is `TargetLost`.
    pub fn poll_once(&mut self) -> Result<PollOutcome> {
        let tick = self.tick;
        self.tick += 1;

        if !self.reader.is_alive() {
            return self.abort_tick(tick, Error::TargetLost);
        }

        let pointer = match self.oracle.locate(self.reader) {
            Ok(pointer) => pointer,
            Err(Error::PlayerNotFound) if self.oracle.state() == OracleState::Suspect => {
                // rescans next tick; keep showing the last good generation meanwhile
                return Ok(PollOutcome::Retained);
            }
            Err(Error::PlayerNotFound) => {
                self.carry = Carry::default();
                let generation = self.store.publish(Snapshot::not_in_game());
                return Ok(PollOutcome::NotInGame(generation));
            }
            Err(e) => return self.abort_tick(tick, e),
        };

        match self.capture(tick, pointer) {
            Ok(snapshot) => Ok(PollOutcome::Published(self.store.publish(snapshot))),
            Err(e) => self.abort_tick(tick, e),
        }
    }

    fn abort_tick(&self, tick: u64, cause: Error) -> Result<PollOutcome> {
        error!("Tick {} aborted: {}", tick, cause);
        if self.target_alive() {
            Ok(PollOutcome::Retained)
        } else {
            info!("Target stopped answering");
            Err(Error::TargetLost)
        }
    }

    fn target_alive(&self) -> bool {
        let reader = self.reader;
        let max = self.retry.max_attempts();
        self.retry
            .execute(|attempt| {
                if reader.is_alive() && reader.read_bytes(reader.base_address(), 4).is_ok() {
                    Ok(())
                } else {
                    debug!("Liveness check failed (attempt {}/{})", attempt + 1, max);
                    Err(())
                }
            })
            .is_ok()
    }

    fn capture(&mut self, tick: u64, pointer: u64) -> Result<Snapshot> {
        let reader = self.reader;
        let polling = &self.config.polling;
        let features = &self.config.features;
        let step_cap = self.config.walker.step_cap;
        let unit_table = self.anchors.unit_table;

        let mut player = read_local_player(reader, pointer)?;

        if every(tick, polling.stats_every) {
            match read_progress(reader, pointer) {
                Ok(progress) => self.carry.progress = progress,
                Err(e) => debug!("Player stats unreadable: {}", e),
            }
        }
        player.progress = self.carry.progress;

        if let Some(hover) = self.anchors.hover {
            match read_hover(reader, hover) {
                Ok(Some(current)) => self.carry.hover = Some(current),
                Ok(None) => {}
                Err(e) => debug!("Hover block unreadable: {}", e),
            }
        }
        let hovered_unit_id = self
            .carry
            .hover
            .filter(|hover| hover.unit_type != 0)
            .map(|hover| hover.unit_id);

        if features.party && every(tick, polling.party_every) {
            if let Some(roster) = self.anchors.roster {
                match read_party(reader, roster, step_cap) {
                    Ok(party) => self.carry.party = party,
                    Err(e) => warn!("Party roster unreadable: {}", e),
                }
            }
        }

        let walker = StructuralWalker::units(reader).with_step_cap(step_cap);
        let mut stats = PassStats::default();
        let mut snapshot = Snapshot {
            captured_at: Utc::now(),
            in_game: true,
            ..Snapshot::default()
        };

        if features.other_players {
            let walk = read_other_players(&walker, reader, unit_table, player.unit_id)?;
            stats.players = walk.stats;
            let mut others = walk.items;
            merge_party(&mut others, &self.carry.party, player.level_no, player.unit_id);
            snapshot.other_players = others;
        }

        if features.mobs {
            let walk = read_mobs(&walker, reader, unit_table, hovered_unit_id)?;
            stats.mobs = walk.stats;
            snapshot.hovered_mob = walk.items.iter().find(|mob| mob.is_hovered).cloned();
            snapshot.mobs = walk.items;
        }

        if features.items {
            if every(tick, polling.items_every) {
                let walk = read_items(&walker, reader, unit_table, &self.config.items)?;
                self.carry.items = walk.items;
                self.carry.item_stats = walk.stats;
            }
            snapshot.items = self.carry.items.clone();
            stats.items = self.carry.item_stats;
        }

        if features.ui {
            if let Some(ui) = self.anchors.ui {
                match read_ui(reader, ui) {
                    Ok(flags) => snapshot.ui = flags,
                    Err(e) => debug!("UI block unreadable: {}", e),
                }
            }
        }

        if features.party {
            snapshot.party = self.carry.party.clone();
        }

        debug!(
            "Tick {}: {} mobs, {} items, {} other players ({} records skipped)",
            tick,
            snapshot.mobs.len(),
            snapshot.items.len(),
            snapshot.other_players.len(),
            stats.mobs.skipped + stats.items.skipped + stats.players.skipped
        );

        snapshot.player = Some(player);
        snapshot.walk_stats = stats;
        Ok(snapshot)
    }
}

fn every(tick: u64, period: u32) -> bool {
    period <= 1 || tick % u64::from(period) == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cadence() {
        let hits: Vec<u64> = (0..13).filter(|&t| every(t, 6)).collect();
        assert_eq!(hits, vec![0, 6, 12]);
        assert!(every(5, 1));
        assert!(every(5, 0));
    }

    #[test]
    fn test_anchors_from_table() {
        use crate::offset::Anchor;

        let table = AnchorTable::from_entries([
            (
                names::UNIT_TABLE,
                Anchor {
                    offset: 0x1D00,
                    required: true,
                },
            ),
            (
                names::ROSTER,
                Anchor {
                    offset: 0x2000,
                    required: false,
                },
            ),
        ]);

        let anchors = PollerAnchors::from_table(&table).unwrap();
        assert_eq!(anchors.unit_table, 0x1D00);
        assert_eq!(anchors.roster, Some(0x2000));
        assert_eq!(anchors.ui, None);

        assert!(matches!(
            PollerAnchors::from_table(&AnchorTable::default()),
            Err(Error::MissingAnchor(_))
        ));
    }
}

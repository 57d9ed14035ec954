//! Locating the local player's unit and noticing when it goes stale.
//!
//! The game recycles unit slots, so a pointer that named the player on one
//! tick may name a half-initialised stranger on the next. The oracle caches
//! the pointer while cheap checks keep passing and falls back to a bounded
//! scan of the player table when they do not.

use tracing::{debug, info, warn};

use crate::config::OracleConfig;
use crate::error::{Error, Result};
use crate::process::ReadMemory;
use crate::process::layout::{act, expansion, inventory, path, unit};
use crate::walker::{BUCKET_COUNT, DEFAULT_STEP_CAP, StructuralWalker, UnitKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
pub enum OracleState {
    Unset,
    Candidate,
    Confirmed,
    Suspect,
    Rescanning,
    Failed,
}

/// Values read from a candidate player unit during a scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CandidateFields {
    pub inventory_marker: u16,
    /// Whether the expansion-specific marker was used instead of the base one.
    pub expansion: bool,
    pub map_seed: u32,
    pub x: u16,
    pub y: u16,
}

/// Plausibility checks that separate a live player unit from a stale slot.
pub trait PlayerPlausibility {
    fn inventory_is_live(&self, fields: &CandidateFields) -> bool;

    fn seed_is_plausible(&self, seed: u32) -> bool;

    fn position_is_plausible(&self, x: u16, y: u16) -> bool {
        x > 0 && y > 0
    }

    fn accepts(&self, fields: &CandidateFields) -> bool {
        self.inventory_is_live(fields)
            && self.position_is_plausible(fields.x, fields.y)
            && self.seed_is_plausible(fields.map_seed)
    }
}

/// Marker and seed thresholds taken from configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ThresholdPlausibility {
    /// Base marker value that means "stale".
    pub inventory_dead_marker: u16,
    /// Expansion marker value that means "stale".
    pub expansion_dead_marker: u16,
    /// Minimum number of decimal digits in a live map seed.
    pub min_seed_digits: u32,
}

impl Default for ThresholdPlausibility {
    fn default() -> Self {
        Self {
            inventory_dead_marker: 1,
            expansion_dead_marker: 0,
            min_seed_digits: 7,
        }
    }
}

impl From<&OracleConfig> for ThresholdPlausibility {
    fn from(config: &OracleConfig) -> Self {
        Self {
            inventory_dead_marker: config.inventory_dead_marker,
            expansion_dead_marker: config.expansion_dead_marker,
            min_seed_digits: config.min_seed_digits,
        }
    }
}

impl PlayerPlausibility for ThresholdPlausibility {
    fn inventory_is_live(&self, fields: &CandidateFields) -> bool {
        if fields.expansion {
            fields.inventory_marker != self.expansion_dead_marker
        } else {
            fields.inventory_marker != self.inventory_dead_marker
        }
    }

    fn seed_is_plausible(&self, seed: u32) -> bool {
        seed.checked_ilog10().map_or(0, |log| log + 1) >= self.min_seed_digits
    }
}

/// Anchors the oracle reads through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OracleAnchors {
    pub unit_table: u64,
    /// Block whose flag says whether the character is an expansion one.
    pub expansion: Option<u64>,
}

pub struct PlayerOracle<P: PlayerPlausibility = ThresholdPlausibility> {
    state: OracleState,
    cached: Option<u64>,
    anchors: OracleAnchors,
    checks: P,
    max_attempts: usize,
    step_cap: usize,
    rescans: u64,
}

impl PlayerOracle<ThresholdPlausibility> {
    pub fn from_config(anchors: OracleAnchors, config: &OracleConfig) -> Self {
        Self::new(anchors, ThresholdPlausibility::from(config))
            .with_max_attempts(config.max_attempts)
    }
}

impl<P: PlayerPlausibility> PlayerOracle<P> {
    pub fn new(anchors: OracleAnchors, checks: P) -> Self {
        Self {
            state: OracleState::Unset,
            cached: None,
            anchors,
            checks,
            max_attempts: BUCKET_COUNT,
            step_cap: DEFAULT_STEP_CAP,
            rescans: 0,
        }
    }

    pub fn with_max_attempts(mut self, max_attempts: usize) -> Self {
        self.max_attempts = max_attempts.max(1);
        self
    }

    pub fn with_step_cap(mut self, step_cap: usize) -> Self {
        self.step_cap = step_cap.max(1);
        self
    }

    pub fn state(&self) -> OracleState {
        self.state
    }

    pub fn cached_pointer(&self) -> Option<u64> {
        self.cached
    }

    /// Number of bounded scans run so far.
    pub fn rescans(&self) -> u64 {
        self.rescans
    }

    pub fn needs_scan(&self) -> bool {
        !matches!(self.state, OracleState::Confirmed)
    }

    /// Forget the cached pointer, e.g. after the player left the game.
    pub fn reset(&mut self) {
        self.transition(OracleState::Unset);
        self.cached = None;
    }

    /// Address of the local player's unit for this tick.
    ///
    /// A confirmed pointer is re-validated; if that fails the oracle turns
    /// suspect and reports `PlayerNotFound` for this tick without rescanning.
    /// The next call rescans.
    pub fn locate<R: ReadMemory>(&mut self, reader: &R) -> Result<u64> {
        if self.state == OracleState::Confirmed {
            let pointer = self.cached.unwrap_or_default();
            if validate_player_pointer(reader, pointer) {
                return Ok(pointer);
            }
            warn!("Cached player pointer {:#x} failed validation", pointer);
            self.transition(OracleState::Suspect);
            self.cached = None;
            return Err(Error::PlayerNotFound);
        }

        if matches!(self.state, OracleState::Suspect | OracleState::Failed) {
            self.transition(OracleState::Rescanning);
        }

        self.rescans += 1;
        match self.scan(reader) {
            Some(pointer) => {
                self.transition(OracleState::Candidate);
                self.cached = Some(pointer);
                self.transition(OracleState::Confirmed);
                Ok(pointer)
            }
            None => {
                self.transition(OracleState::Failed);
                Err(Error::PlayerNotFound)
            }
        }
    }

    fn transition(&mut self, next: OracleState) {
        if self.state == next {
            return;
        }
        if is_retry_cycle(self.state, next) {
            debug!("Player oracle: {} -> {}", self.state, next);
        } else {
            info!("Player oracle: {} -> {}", self.state, next);
        }
        self.state = next;
    }

    /// Bounded scan of the player table's slots for a live player unit.
    fn scan<R: ReadMemory>(&self, reader: &R) -> Option<u64> {
        let is_expansion = self.anchors.expansion.is_some_and(|offset| {
            reader
                .read_pointer(reader.module_address(offset))
                .and_then(|block| reader.read_field::<u16>(block, expansion::IS_EXPANSION))
                .map(|flag| flag != 0)
                .unwrap_or(false)
        });

        let walker = StructuralWalker::units(reader)
            .with_bucket_count(self.max_attempts.min(BUCKET_COUNT))
            .with_step_cap(self.step_cap);
        let table = walker.table_address(self.anchors.unit_table, UnitKind::Player);

        match walker.find_first(table, |record| {
            let fields = read_candidate(reader, record, is_expansion).ok()?;
            if self.checks.accepts(&fields) {
                debug!(
                    "Player candidate {:#x} accepted (seed {}, {}x{})",
                    record.address(),
                    fields.map_seed,
                    fields.x,
                    fields.y
                );
                Some(record.address())
            } else {
                None
            }
        }) {
            Ok(found) => found,
            Err(e) => {
                debug!("Player table unreadable: {}", e);
                None
            }
        }
    }
}

fn read_candidate<R: ReadMemory>(
    reader: &R,
    record: &crate::process::Record,
    is_expansion: bool,
) -> Result<CandidateFields> {
    let inventory_ptr = record.pointer(unit::INVENTORY)?;
    if inventory_ptr == 0 {
        return Err(Error::decode(record.address(), "no inventory"));
    }
    let marker_field = if is_expansion {
        inventory::EXPANSION_CHECK
    } else {
        inventory::BASE_CHECK
    };
    let inventory_marker = reader.read_field::<u16>(inventory_ptr, marker_field)?;

    let act_ptr = record.pointer(unit::ACT)?;
    let map_seed = reader.read_field::<u32>(act_ptr, act::MAP_SEED)?;
    let path_ptr = record.pointer(unit::PATH)?;
    let x = reader.read_field::<u16>(path_ptr, path::X)?;
    let y = reader.read_field::<u16>(path_ptr, path::Y)?;

    Ok(CandidateFields {
        inventory_marker,
        expansion: is_expansion,
        map_seed,
        x,
        y,
    })
}

/// Cheap re-validation of a cached player pointer.
///
/// act → seed (nonzero) → path → x/y (both nonzero).
pub fn validate_player_pointer<R: ReadMemory>(reader: &R, pointer: u64) -> bool {
    let check = || -> Result<bool> {
        if pointer == 0 {
            return Ok(false);
        }
        let act_ptr = reader.read_field::<u64>(pointer, unit::ACT)?;
        if act_ptr == 0 || reader.read_field::<u32>(act_ptr, act::MAP_SEED)? == 0 {
            return Ok(false);
        }
        let path_ptr = reader.read_field::<u64>(pointer, unit::PATH)?;
        if path_ptr == 0 {
            return Ok(false);
        }
        let x = reader.read_field::<u16>(path_ptr, path::X)?;
        let y = reader.read_field::<u16>(path_ptr, path::Y)?;
        Ok(x != 0 && y != 0)
    };

    match check() {
        Ok(valid) => valid,
        Err(e) => {
            debug!("Player pointer {:#x} unreadable: {}", pointer, e);
            false
        }
    }
}

/// Menus bounce between these two every tick.
fn is_retry_cycle(from: OracleState, to: OracleState) -> bool {
    matches!(
        (from, to),
        (OracleState::Failed, OracleState::Rescanning)
            | (OracleState::Rescanning, OracleState::Failed)
    )
}

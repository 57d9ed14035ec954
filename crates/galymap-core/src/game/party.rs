use std::ops::ControlFlow;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::Result;
use crate::game::position::Position;
use crate::process::layout::roster;
use crate::process::{ReadMemory, Record};
use crate::walker::{StructuralWalker, WalkStats};

/// One entry of the party roster. Every player in the game has one, partied or not.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PartyMember {
    pub name: String,
    pub unit_id: u32,
    /// Level (area) number the member is in.
    pub area: u32,
    pub player_level: u16,
    pub party_id: u16,
    pub position: Position,
}

impl PartyMember {
    fn decode(record: &Record) -> Result<Self> {
        let x: u32 = record.get(roster::X)?;
        let y: u32 = record.get(roster::Y)?;
        Ok(Self {
            name: record.string(roster::NAME)?,
            unit_id: record.get(roster::UNIT_ID)?,
            area: record.get(roster::AREA)?,
            player_level: record.get(roster::PLAYER_LEVEL)?,
            party_id: record.get(roster::PARTY_ID)?,
            position: Position::new(f64::from(x), f64::from(y)),
        })
    }
}

/// Walk the roster list headed at the roster anchor.
///
/// The head read is anchor-level. An entry that fails to decode is skipped and
/// the walk follows its `next` link.
pub fn read_party<R: ReadMemory>(
    reader: &R,
    roster_anchor: u64,
    step_cap: usize,
) -> Result<Vec<PartyMember>> {
    let head = reader.read_pointer(reader.module_address(roster_anchor))?;
    let walker = StructuralWalker::new(reader, &roster::LAYOUT).with_step_cap(step_cap);

    let mut members = Vec::new();
    let mut stats = WalkStats::default();
    walker.walk_chain(head, &mut stats, |record| match PartyMember::decode(record) {
        Ok(member) => {
            members.push(member);
            ControlFlow::Continue(())
        }
        Err(e) => {
            debug!("Skipping roster entry at {:#x}: {}", record.address(), e);
            ControlFlow::Continue(())
        }
    });
    Ok(members)
}

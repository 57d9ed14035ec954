//! Domain decoders: turn unit records into snapshot values.
//!
//! - `player` - the local player's unit, level and experience
//! - `mobs`, `items`, `players` - bucket-chain passes over the unit tables
//! - `party`, `ui` - roster list and UI blocks behind optional anchors
//! - `probe` - quick in-game check

// Synthetic unit graphs for tests (always available for integration tests)
#[doc(hidden)]
pub mod fixture;
mod items;
mod mobs;
pub mod monsters;
mod party;
mod player;
mod players;
mod position;
mod probe;
pub mod stats;
mod ui;

pub use items::{GroundItem, ItemFlags, ItemQuality, decode_item, read_items};
pub use mobs::{Mob, decode_mob, monster_flag, read_mobs};
pub use party::{PartyMember, read_party};
pub use player::{
    Difficulty, LocalPlayer, Progress, SeedHashes, read_level_no, read_local_player, read_progress,
};
pub use players::{OtherPlayer, decode_other_player, merge_party, read_other_players};
pub use position::{Position, read_item_position, read_unit_position};
pub use probe::is_in_game;
pub use stats::{Immunities, StatArray, StatBlock, StatEntry};
pub use ui::{Hover, UiFlags, read_hover, read_ui};

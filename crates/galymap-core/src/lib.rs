//! # galymap-core
//!
//! Core library for reading live game state out of the D2R client.
//!
//! This crate provides:
//! - Remote process memory access with typed reads and a mock address space
//! - Anchor discovery via signature scanning of the module image
//! - Bounded walks over the game's unit hash tables
//! - Player pointer validation with rescans on drift
//! - Decoders for players, mobs, items, party and UI state
//! - A poller that publishes consistent snapshots to any number of readers

pub mod config;
pub mod error;
pub mod game;
pub mod offset;
pub mod oracle;
pub mod poller;
pub mod process;
pub mod retry;
pub mod shutdown;
pub mod snapshot;
pub mod walker;

// Re-export from config module
pub use config::{Config, FeatureToggles, ItemAlertConfig, OracleConfig, PollingConfig};

// Re-export from error module
pub use error::{Error, Result};

// Re-export from game module
pub use game::{
    Difficulty, GroundItem, LocalPlayer, Mob, OtherPlayer, PartyMember, Position, UiFlags,
    is_in_game,
};

// Re-export from offset module
pub use offset::{
    AnchorResolution, AnchorTable, SignatureSet, SignatureSpec, builtin_signatures, load_anchors,
    load_signatures, save_anchors, save_signatures,
};

// Re-export from oracle module
pub use oracle::{OracleState, PlayerOracle, PlayerPlausibility};

// Re-export from poller module
pub use poller::{PollOutcome, Poller, PollerAnchors};

// Re-export from process module
pub use process::{
    ModuleImage, ProcessHandle, ProcessInfo, ProcessProvider, ReadMemory, RemoteAccessor,
    SystemProcessProvider, TypedValue, ValueKind, WriteMemory,
};

// Re-export from retry module
pub use retry::{ExponentialBackoff, FixedDelay, NoRetry, RetryStrategy};

// Re-export from shutdown module
pub use shutdown::ShutdownSignal;

// Re-export from snapshot module
pub use snapshot::{Snapshot, SnapshotStore};

// Re-export from walker module
pub use walker::{StructuralWalker, UnitKind, WalkStats};

//! Configuration and tuning constants.
//!
//! - `Config` - user settings loaded from TOML
//! - Polling, retry and scan constants used as defaults

mod settings;

pub use settings::*;

/// Poll loop cadence.
pub mod polling {
    /// Interval between ticks (ms).
    pub const POLL_INTERVAL_MS: u64 = 100;

    /// The party roster changes rarely; refresh it every third tick.
    pub const PARTY_EVERY: u32 = 3;

    /// Level and experience are refreshed every sixth tick.
    pub const STATS_EVERY: u32 = 6;

    /// Ground items are refreshed every third tick.
    pub const ITEMS_EVERY: u32 = 3;
}

/// Liveness retry configuration.
///
/// Exponential backoff: 100ms → 200ms → 400ms → 800ms → 1600ms = total ~3.1s max.
pub mod retry {
    /// Maximum number of liveness checks after an anchor-level failure.
    pub const MAX_LIVENESS_RETRIES: u32 = 5;

    /// Delay (in ms) before each retry attempt.
    pub const RETRY_DELAYS_MS: [u64; 5] = [100, 200, 400, 800, 1600];
}

/// Signature and table scanning bounds.
pub mod scan {
    /// Module image chunk size (1MB).
    pub const IMAGE_CHUNK_SIZE: usize = 1024 * 1024;

    /// Player table slots tried per oracle rescan.
    pub const ORACLE_MAX_ATTEMPTS: usize = 128;

    /// Records visited per bucket chain.
    pub const CHAIN_STEP_CAP: usize = 1024;
}

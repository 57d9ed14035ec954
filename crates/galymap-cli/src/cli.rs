//! CLI argument definitions for galymap.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use galymap_core::ValueKind;
use galymap_core::process::PROCESS_NAME;

#[derive(Parser)]
#[command(name = "galymap")]
#[command(about = "Live game state reader for Diablo II: Resurrected", version)]
pub struct Args {
    /// Path to config file
    #[arg(short, long, global = true, default_value = "galymap.toml")]
    pub config: PathBuf,

    /// Load signatures from a JSON file instead of the built-in set
    #[arg(long, global = true, value_name = "FILE")]
    pub signatures: Option<String>,

    /// Load anchors from file (skip signature scanning)
    #[arg(long, global = true, value_name = "FILE")]
    pub anchors_file: Option<String>,

    /// Process ID (skip automatic detection)
    #[arg(long, global = true)]
    pub pid: Option<u32>,

    /// Executable name used for automatic detection
    #[arg(long, global = true, env = "GALYMAP_EXE", default_value = PROCESS_NAME)]
    pub exe: String,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Poll the game and print every new snapshot (default)
    Watch {
        /// Print snapshots as JSON lines
        #[arg(long)]
        json: bool,
        /// Poll interval in milliseconds (overrides the config file)
        #[arg(long, value_name = "MS")]
        interval: Option<u64>,
        /// Take a single snapshot and exit
        #[arg(long)]
        once: bool,
    },
    /// Resolve anchors by scanning the module image
    Anchors {
        /// Save the resolved anchors to this file
        #[arg(short, long)]
        output: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Check whether a game is in progress
    Probe,
    /// Read a typed value from memory
    Read {
        /// Address to read (hex, e.g., 0x7FF6A1C2D3E0)
        address: String,
        /// Value kind (u8..u64, i8..i64, f32, f64, ptr, bytes:N, utf8:N, utf16le:N, latin1:N)
        #[arg(long, short, default_value = "u32", value_parser = ValueKind::parse)]
        kind: ValueKind,
        /// Treat the address as an offset from the module base
        #[arg(long)]
        module: bool,
        /// Pointer chain offsets applied before the read (e.g., 0x18,0x90,-0x8)
        #[arg(long, value_delimiter = ',', allow_hyphen_values = true)]
        chain: Vec<String>,
    },
    /// Write the built-in signature table as JSON
    Signatures {
        /// Output file path (defaults to stdout)
        #[arg(short, long)]
        output: Option<String>,
    },
    /// Write the default configuration as TOML
    InitConfig {
        /// Output file path
        #[arg(short, long, default_value = "galymap.toml")]
        output: PathBuf,
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
    /// Show process, anchor and player status
    Status {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

//! CLI argument parsing tests.
//!
//! These tests verify that command-line arguments are parsed correctly
//! without actually executing the commands (which would require the game process).

use std::path::PathBuf;

use clap::Parser;
use galymap_core::ValueKind;
use galymap_core::process::StringEncoding;

// Re-create Args structure for testing since it's not publicly exported
#[derive(Parser)]
#[command(name = "galymap")]
struct Args {
    #[arg(short, long, global = true, default_value = "galymap.toml")]
    config: PathBuf,

    #[arg(long, global = true, value_name = "FILE")]
    signatures: Option<String>,

    #[arg(long, global = true, value_name = "FILE")]
    anchors_file: Option<String>,

    #[arg(long, global = true)]
    pid: Option<u32>,

    #[arg(long, global = true, default_value = "D2R.exe")]
    exe: String,

    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(clap::Subcommand)]
enum Command {
    Watch {
        #[arg(long)]
        json: bool,
        #[arg(long, value_name = "MS")]
        interval: Option<u64>,
        #[arg(long)]
        once: bool,
    },
    Anchors {
        #[arg(short, long)]
        output: Option<String>,
        #[arg(long)]
        json: bool,
    },
    Probe,
    Read {
        address: String,
        #[arg(long, short, default_value = "u32", value_parser = ValueKind::parse)]
        kind: ValueKind,
        #[arg(long)]
        module: bool,
        #[arg(long, value_delimiter = ',', allow_hyphen_values = true)]
        chain: Vec<String>,
    },
    Signatures {
        #[arg(short, long)]
        output: Option<String>,
    },
    InitConfig {
        #[arg(short, long, default_value = "galymap.toml")]
        output: PathBuf,
        #[arg(long)]
        force: bool,
    },
    Status {
        #[arg(long)]
        json: bool,
    },
}

#[test]
fn test_parse_no_args() {
    let args = Args::try_parse_from(["galymap"]).unwrap();
    assert!(args.command.is_none());
    assert_eq!(args.config, PathBuf::from("galymap.toml"));
    assert!(args.pid.is_none());
    assert!(!args.verbose);
}

#[test]
fn test_parse_watch_defaults() {
    let args = Args::try_parse_from(["galymap", "watch"]).unwrap();
    match args.command {
        Some(Command::Watch {
            json,
            interval,
            once,
        }) => {
            assert!(!json);
            assert!(interval.is_none());
            assert!(!once);
        }
        _ => panic!("Expected Watch command"),
    }
}

#[test]
fn test_parse_watch_with_options() {
    let args =
        Args::try_parse_from(["galymap", "watch", "--json", "--interval", "250", "--once"])
            .unwrap();
    match args.command {
        Some(Command::Watch {
            json,
            interval,
            once,
        }) => {
            assert!(json);
            assert_eq!(interval, Some(250));
            assert!(once);
        }
        _ => panic!("Expected Watch command"),
    }
}

#[test]
fn test_global_options_after_subcommand() {
    let args = Args::try_parse_from([
        "galymap",
        "status",
        "--pid",
        "4242",
        "--anchors-file",
        "anchors.txt",
        "-v",
    ])
    .unwrap();
    assert_eq!(args.pid, Some(4242));
    assert_eq!(args.anchors_file.as_deref(), Some("anchors.txt"));
    assert!(args.verbose);
    assert!(matches!(args.command, Some(Command::Status { json: false })));
}

#[test]
fn test_parse_anchors_with_output() {
    let args = Args::try_parse_from(["galymap", "anchors", "-o", "anchors.txt", "--json"]).unwrap();
    match args.command {
        Some(Command::Anchors { output, json }) => {
            assert_eq!(output.as_deref(), Some("anchors.txt"));
            assert!(json);
        }
        _ => panic!("Expected Anchors command"),
    }
}

#[test]
fn test_parse_probe() {
    let args = Args::try_parse_from(["galymap", "--exe", "Game.exe", "probe"]).unwrap();
    assert_eq!(args.exe, "Game.exe");
    assert!(matches!(args.command, Some(Command::Probe)));
}

#[test]
fn test_parse_read_defaults() {
    let args = Args::try_parse_from(["galymap", "read", "0x1000"]).unwrap();
    match args.command {
        Some(Command::Read {
            address,
            kind,
            module,
            chain,
        }) => {
            assert_eq!(address, "0x1000");
            assert_eq!(kind, ValueKind::U32);
            assert!(!module);
            assert!(chain.is_empty());
        }
        _ => panic!("Expected Read command"),
    }
}

#[test]
fn test_parse_read_chain_with_negative_offset() {
    let args = Args::try_parse_from([
        "galymap",
        "read",
        "0x1D44C58",
        "--module",
        "--chain",
        "0x18,0x90,-0x8",
        "--kind",
        "utf8:16",
    ])
    .unwrap();
    match args.command {
        Some(Command::Read {
            kind,
            module,
            chain,
            ..
        }) => {
            assert!(module);
            assert_eq!(chain, vec!["0x18", "0x90", "-0x8"]);
            assert_eq!(
                kind,
                ValueKind::String {
                    max_len: 16,
                    encoding: StringEncoding::Utf8
                }
            );
        }
        _ => panic!("Expected Read command"),
    }
}

#[test]
fn test_parse_read_rejects_unknown_kind() {
    let result = Args::try_parse_from(["galymap", "read", "0x1000", "--kind", "u24"]);
    assert!(result.is_err());
}

#[test]
fn test_parse_init_config() {
    let args = Args::try_parse_from(["galymap", "init-config", "--force"]).unwrap();
    match args.command {
        Some(Command::InitConfig { output, force }) => {
            assert_eq!(output, PathBuf::from("galymap.toml"));
            assert!(force);
        }
        _ => panic!("Expected InitConfig command"),
    }
}

#[test]
fn test_parse_signatures_with_source() {
    let args =
        Args::try_parse_from(["galymap", "--signatures", "sigs.json", "signatures"]).unwrap();
    assert_eq!(args.signatures.as_deref(), Some("sigs.json"));
    assert!(matches!(
        args.command,
        Some(Command::Signatures { output: None })
    ));
}

#[test]
fn test_parse_invalid_pid() {
    let result = Args::try_parse_from(["galymap", "--pid", "not-a-number"]);
    assert!(result.is_err());
}

#[test]
fn test_parse_unknown_command() {
    let result = Args::try_parse_from(["galymap", "find-offsets"]);
    assert!(result.is_err());
}

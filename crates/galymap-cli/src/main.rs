mod cli;
mod cli_utils;
mod commands;
mod display;

use anyhow::Result;
use clap::Parser;
use cli::{Args, Command};
use cli_utils::{TargetArgs, load_config};
use commands::watch::WatchOptions;
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    let args = Args::parse();

    // RUST_LOG wins over --verbose
    let default_filter = if args.verbose {
        "galymap=debug,galymap_core=debug"
    } else {
        "galymap=info,galymap_core=info"
    };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let target = TargetArgs {
        pid: args.pid,
        exe: &args.exe,
        signatures: args.signatures.as_deref(),
        anchors_file: args.anchors_file.as_deref(),
    };

    match args.command {
        None => commands::watch::run(
            &target,
            load_config(&args.config),
            WatchOptions {
                json: false,
                interval_ms: None,
                once: false,
            },
        ),
        Some(Command::Watch {
            json,
            interval,
            once,
        }) => commands::watch::run(
            &target,
            load_config(&args.config),
            WatchOptions {
                json,
                interval_ms: interval,
                once,
            },
        ),
        Some(Command::Anchors { output, json }) => {
            commands::anchors::run(&target, output.as_deref(), json)
        }
        Some(Command::Probe) => {
            if !commands::probe::run(&target)? {
                std::process::exit(1);
            }
            Ok(())
        }
        Some(Command::Read {
            address,
            kind,
            module,
            chain,
        }) => commands::read::run(&target, &address, kind, module, &chain),
        Some(Command::Signatures { output }) => {
            commands::signatures::run(target.signatures, output.as_deref())
        }
        Some(Command::InitConfig { output, force }) => commands::init_config::run(&output, force),
        Some(Command::Status { json }) => {
            commands::status::run(&target, load_config(&args.config), json)
        }
    }
}

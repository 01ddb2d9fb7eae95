//! Muster -- a player roster and upgrade activation engine.
//!
//! This binary reads commands from stdin and writes responses to stdout.
//!
//! Usage:
//!   muster [--config FILE]
//!
//! Options:
//!   --config FILE   JSON engine configuration (default: built-in defaults)

use std::env;
use std::io::{self, BufRead};
use std::path::Path;
use std::process::ExitCode;

use log::{error, info, warn};

use muster::config::{load_config, EngineConfig};
use muster::engine::Engine;
use muster::protocol::parser::{parse_command, Command};

fn parse_args() -> Result<EngineConfig, String> {
    let args: Vec<String> = env::args().collect();
    let mut config = EngineConfig::default();

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--config" => {
                i += 1;
                let path = args.get(i).ok_or("--config requires a path")?;
                config = load_config(Path::new(path)).map_err(|e| e.to_string())?;
            }
            other => return Err(format!("unknown argument: {}", other)),
        }
        i += 1;
    }

    Ok(config)
}

/// Runs the main protocol loop, reading commands from stdin
/// and writing responses to stdout.
fn main() -> ExitCode {
    env_logger::init();

    let config = match parse_args() {
        Ok(c) => c,
        Err(e) => {
            error!("{}", e);
            eprintln!("{}", e);
            return ExitCode::FAILURE;
        }
    };

    match run(Engine::new(config)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("output error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(mut engine: Engine) -> io::Result<()> {
    let stdin = io::stdin();
    let stdout = io::stdout();
    let mut out = io::BufWriter::new(stdout.lock());

    for line in stdin.lock().lines() {
        let line = match line {
            Ok(l) => l,
            Err(_) => break,
        };

        let cmd = match parse_command(&line) {
            Some(c) => c,
            None => continue,
        };

        match cmd {
            Command::Muster => engine.handle_muster(&mut out)?,
            Command::IsReady => engine.handle_isready(&mut out)?,
            Command::SetOption { name, value } => {
                engine.set_option(&name, value.as_deref());
            }
            Command::ClearSides => engine.clear_sides(),
            Command::Sides => engine.handle_sides(&mut out)?,
            Command::Side { line } => {
                if let Err(e) = engine.add_side(&line) {
                    warn!("side: {}", e);
                }
            }
            Command::LoadSides { path } => {
                if let Err(e) = engine.load_sides(Path::new(&path)) {
                    warn!("loadsides: {}", e);
                }
            }
            Command::NewGame => engine.handle_newgame(&mut out)?,
            Command::Players => engine.handle_players(&mut out)?,
            Command::Relationship { a, b } => engine.handle_relationship(&a, &b, &mut out)?,
            Command::Mask { source, filter } => engine.handle_mask(source, filter, &mut out)?,
            Command::Snapshot => engine.handle_snapshot(&mut out)?,
            Command::Restore { raw } => engine.handle_restore(&raw, &mut out)?,
            Command::LoadUpgrades { path } => engine.handle_loadupgrades(Path::new(&path), &mut out)?,
            Command::Spawn {
                owner,
                object,
                modules,
            } => engine.handle_spawn(&owner, &object, &modules, &mut out)?,
            Command::Grant { player, upgrade } => engine.handle_grant(&player, &upgrade, &mut out)?,
            Command::Revoke { player, upgrade } => engine.handle_revoke(&player, &upgrade, &mut out)?,
            Command::Quit => {
                info!("quit");
                break;
            }
        }
    }

    Ok(())
}

//! Command parser.
//!
//! Parses incoming protocol lines into structured `Command` variants that
//! the main loop dispatches on.

use log::warn;

use crate::roster::RelationshipFilter;

/// A parsed client-to-engine command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Protocol handshake.
    Muster,

    /// Synchronization ping; engine must reply `readyok`.
    IsReady,

    /// Set an engine option: `setoption name <id> [value <x>]`.
    SetOption { name: String, value: Option<String> },

    /// Drop all pending side descriptors.
    ClearSides,

    /// List the pending side descriptors.
    Sides,

    /// Append one side descriptor in side-line notation.
    Side { line: String },

    /// Replace the pending sides with a JSON sides file.
    LoadSides { path: String },

    /// Rebuild the roster from the pending sides.
    NewGame,

    /// List the active players.
    Players,

    /// Query how player `a` regards player `b` (`-` is neutral).
    Relationship { a: String, b: String },

    /// Build a relationship mask: `mask <index> <self|enemies|allies|neutral>...`.
    Mask { source: usize, filter: RelationshipFilter },

    /// Emit a roster snapshot.
    Snapshot,

    /// Restore a roster snapshot.
    Restore { raw: String },

    /// Register upgrade module templates from a JSON file.
    LoadUpgrades { path: String },

    /// Create an object owned by a player: `spawn <player> <object> <module>...`.
    Spawn { owner: String, object: String, modules: Vec<String> },

    /// Give a player an upgrade and re-evaluate its objects.
    Grant { player: String, upgrade: String },

    /// Take an upgrade from a player and reset dependent modules.
    Revoke { player: String, upgrade: String },

    /// Terminate the engine process.
    Quit,
}

/// Parses a single line of input into a `Command`.
///
/// Returns `None` for empty lines or unrecognized commands. Malformed
/// arguments for known commands also return `None` after logging.
pub fn parse_command(line: &str) -> Option<Command> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return None;
    }

    let tokens: Vec<&str> = trimmed.split_whitespace().collect();
    if tokens.is_empty() {
        return None;
    }

    match tokens[0] {
        "muster" => Some(Command::Muster),
        "isready" => Some(Command::IsReady),
        "quit" => Some(Command::Quit),
        "newgame" => Some(Command::NewGame),
        "players" => Some(Command::Players),
        "snapshot" => Some(Command::Snapshot),
        "clearsides" => Some(Command::ClearSides),
        "sides" => Some(Command::Sides),

        "setoption" => parse_setoption(&tokens),
        "side" => rest_of_line(trimmed, "side").map(|line| Command::Side { line }),
        "restore" => rest_of_line(trimmed, "restore").map(|raw| Command::Restore { raw }),
        "loadsides" => single_arg(&tokens).map(|path| Command::LoadSides { path }),
        "loadupgrades" => single_arg(&tokens).map(|path| Command::LoadUpgrades { path }),
        "relationship" => parse_relationship(&tokens),
        "mask" => parse_mask(&tokens),
        "spawn" => parse_spawn(&tokens),
        "grant" => parse_player_upgrade(&tokens)
            .map(|(player, upgrade)| Command::Grant { player, upgrade }),
        "revoke" => parse_player_upgrade(&tokens)
            .map(|(player, upgrade)| Command::Revoke { player, upgrade }),

        other => {
            warn!("unknown command: {}", other);
            None
        }
    }
}

/// Parses `setoption name <id> [value <x>]`.
fn parse_setoption(tokens: &[&str]) -> Option<Command> {
    if tokens.len() < 3 || tokens[1] != "name" {
        warn!("malformed setoption: expected 'setoption name <id> [value <x>]'");
        return None;
    }

    let value_idx = tokens.iter().position(|&t| t == "value");

    let (name, value) = match value_idx {
        Some(vi) => {
            let name_parts = &tokens[2..vi];
            let value_parts = &tokens[vi + 1..];
            if name_parts.is_empty() {
                warn!("malformed setoption: empty name");
                return None;
            }
            let value = if value_parts.is_empty() {
                None
            } else {
                Some(value_parts.join(" "))
            };
            (name_parts.join(" "), value)
        }
        None => (tokens[2..].join(" "), None),
    };

    Some(Command::SetOption { name, value })
}

/// Captures everything after the keyword, which may contain spaces.
fn rest_of_line(line: &str, keyword: &str) -> Option<String> {
    let rest = line.strip_prefix(keyword).unwrap_or("").trim();
    if rest.is_empty() {
        warn!("malformed {}: missing argument", keyword);
        return None;
    }
    Some(rest.to_string())
}

fn single_arg(tokens: &[&str]) -> Option<String> {
    if tokens.len() != 2 {
        warn!("malformed {}: expected exactly one argument", tokens[0]);
        return None;
    }
    Some(tokens[1].to_string())
}

/// Parses `relationship <a> <b>`.
fn parse_relationship(tokens: &[&str]) -> Option<Command> {
    if tokens.len() != 3 {
        warn!("malformed relationship: expected 'relationship <a> <b>'");
        return None;
    }
    Some(Command::Relationship {
        a: tokens[1].to_string(),
        b: tokens[2].to_string(),
    })
}

/// Parses `mask <index> <filter>...`. No filter tokens means an empty filter.
fn parse_mask(tokens: &[&str]) -> Option<Command> {
    if tokens.len() < 2 {
        warn!("malformed mask: expected 'mask <index> [filter...]'");
        return None;
    }
    let source = match tokens[1].parse::<usize>() {
        Ok(v) => v,
        Err(_) => {
            warn!("invalid player index: '{}'", tokens[1]);
            return None;
        }
    };
    let mut filter = RelationshipFilter::empty();
    for t in &tokens[2..] {
        match RelationshipFilter::from_token(t) {
            Some(f) => filter |= f,
            None => {
                warn!("unknown relationship filter: '{}'", t);
                return None;
            }
        }
    }
    Some(Command::Mask { source, filter })
}

/// Parses `spawn <player> <object> <module>...`.
fn parse_spawn(tokens: &[&str]) -> Option<Command> {
    if tokens.len() < 3 {
        warn!("malformed spawn: expected 'spawn <player> <object> <module>...'");
        return None;
    }
    Some(Command::Spawn {
        owner: tokens[1].to_string(),
        object: tokens[2].to_string(),
        modules: tokens[3..].iter().map(|s| s.to_string()).collect(),
    })
}

fn parse_player_upgrade(tokens: &[&str]) -> Option<(String, String)> {
    if tokens.len() != 3 {
        warn!("malformed {}: expected '{} <player> <upgrade>'", tokens[0], tokens[0]);
        return None;
    }
    Some((tokens[1].to_string(), tokens[2].to_string()))
}

//! Side-line notation.
//!
//! A compact single-line form of a side descriptor, used by the `side`
//! command:
//!
//! `playerName=Red;playerIsHuman=true;playerEnemies=Blue Green;slot=0`
//!
//! Entries are separated by `;` and split on the first `=`. `true`/`false`
//! become booleans, integers become `Int`, and everything else is kept as a
//! string, so relationship lists may contain spaces. Three keys are reserved for the non-dictionary
//! parts of a side: `slot` (lobby slot index), `teams` (extra team names),
//! and `build` (build-list template names).

use crate::roster::{BuildInfo, BuildList, Dict, DictValue, SideInfo, SideParseError};

const SLOT_KEY: &str = "slot";
const TEAMS_KEY: &str = "teams";
const BUILD_KEY: &str = "build";

/// Parses a side line into a `SideInfo`.
pub fn parse_side_line(s: &str) -> Result<SideInfo, SideParseError> {
    let mut dict = Dict::default();
    let mut side = SideInfo::default();

    for entry in s.split(';') {
        let entry = entry.trim();
        if entry.is_empty() {
            continue;
        }
        let (key, value) = entry
            .split_once('=')
            .ok_or_else(|| SideParseError::MissingEquals(entry.to_string()))?;
        let key = key.trim();
        let value = value.trim();
        if key.is_empty() {
            return Err(SideParseError::EmptyKey(entry.to_string()));
        }

        match key {
            SLOT_KEY => {
                let slot = value
                    .parse::<usize>()
                    .map_err(|_| SideParseError::InvalidSlot(value.to_string()))?;
                side.slot_index = Some(slot);
            }
            TEAMS_KEY => {
                side.teams = value.split_whitespace().map(str::to_string).collect();
            }
            BUILD_KEY => {
                let entries = value
                    .split_whitespace()
                    .map(|name| BuildInfo {
                        template_name: name.to_string(),
                        position: [0.0; 3],
                        angle: 0.0,
                        initially_built: false,
                    })
                    .collect();
                side.build_list = Some(BuildList { entries });
            }
            _ => {
                let v = match value {
                    "true" => DictValue::Bool(true),
                    "false" => DictValue::Bool(false),
                    other => match other.parse::<i64>() {
                        Ok(i) => DictValue::Int(i),
                        Err(_) => DictValue::String(other.to_string()),
                    },
                };
                dict.set(key, v);
            }
        }
    }

    side.dict = dict;
    Ok(side)
}

/// Encodes a side as a side line. Build-list positions are not represented.
pub fn encode_side_line(side: &SideInfo) -> String {
    let mut entries: Vec<String> = side
        .dict
        .iter()
        .map(|(k, v)| match v {
            DictValue::Bool(b) => format!("{}={}", k, b),
            DictValue::Int(i) => format!("{}={}", k, i),
            DictValue::String(s) => format!("{}={}", k, s),
        })
        .collect();

    if let Some(slot) = side.slot_index {
        entries.push(format!("{}={}", SLOT_KEY, slot));
    }
    if !side.teams.is_empty() {
        entries.push(format!("{}={}", TEAMS_KEY, side.teams.join(" ")));
    }
    if let Some(build) = &side.build_list {
        let names: Vec<&str> = build.entries.iter().map(|b| b.template_name.as_str()).collect();
        entries.push(format!("{}={}", BUILD_KEY, names.join(" ")));
    }

    entries.join(";")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::roster::keys;

    #[test]
    fn parse_full_line() {
        let side = parse_side_line(
            "playerName=Red;playerIsHuman=true;playerEnemies=Blue Green;slot=2;teams=RedA RedB;build=HQ Barracks",
        )
        .unwrap();
        assert_eq!(side.player_name(), "Red");
        assert_eq!(side.dict.get_bool(keys::PLAYER_IS_HUMAN), Some(true));
        assert_eq!(side.dict.get_string(keys::PLAYER_ENEMIES), "Blue Green");
        assert_eq!(side.slot_index, Some(2));
        assert_eq!(side.teams, vec!["RedA", "RedB"]);
        assert_eq!(side.build_list.as_ref().unwrap().len(), 2);
    }

    #[test]
    fn parse_neutral_line() {
        let side = parse_side_line("playerName=").unwrap();
        assert_eq!(side.player_name(), "");
    }

    #[test]
    fn parse_errors() {
        assert!(matches!(
            parse_side_line("playerName"),
            Err(SideParseError::MissingEquals(_))
        ));
        assert!(matches!(parse_side_line("=Red"), Err(SideParseError::EmptyKey(_))));
        assert!(matches!(
            parse_side_line("playerName=Red;slot=first"),
            Err(SideParseError::InvalidSlot(_))
        ));
    }

    #[test]
    fn integer_values_survive_encoding() {
        let side = parse_side_line("playerName=Red;playerIsHuman=1;playerRank=-3").unwrap();
        assert_eq!(side.dict.get(keys::PLAYER_IS_HUMAN), Some(&DictValue::Int(1)));
        assert_eq!(side.dict.get_bool(keys::PLAYER_IS_HUMAN), Some(true));

        let again = parse_side_line(&encode_side_line(&side)).unwrap();
        assert_eq!(again, side);
        assert_eq!(again.dict.get_bool(keys::PLAYER_IS_HUMAN), Some(true));
        assert_eq!(again.dict.get_int("playerRank"), Some(-3));
    }

    #[test]
    fn encode_is_stable() {
        let line = "playerAllies=Gold;playerIsHuman=false;playerName=Red;slot=1;teams=RedA;build=HQ";
        let side = parse_side_line(line).unwrap();
        assert_eq!(encode_side_line(&side), line);
    }
}

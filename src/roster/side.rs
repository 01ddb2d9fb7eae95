//! Side descriptors: the declarative per-faction data a roster is built from.
//!
//! Each side carries a key/value dictionary using the well-known keys in
//! [`keys`], an optional build list, and the lobby slot it came from. Side
//! files are JSON; single sides can also be written as a compact line (see
//! `protocol::side_line`).

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

/// Well-known dictionary keys.
pub mod keys {
    pub const PLAYER_NAME: &str = "playerName";
    pub const PLAYER_DISPLAY_NAME: &str = "playerDisplayName";
    pub const PLAYER_FACTION: &str = "playerFaction";
    pub const PLAYER_IS_HUMAN: &str = "playerIsHuman";
    pub const PLAYER_ENEMIES: &str = "playerEnemies";
    pub const PLAYER_ALLIES: &str = "playerAllies";
    pub const MULTIPLAYER_IS_LOCAL: &str = "multiplayerIsLocal";
}

/// Number of lobby slots a map can declare.
pub const MAX_SLOTS: usize = 8;

/// Errors that can occur while loading side data.
#[derive(Debug, thiserror::Error)]
pub enum SideParseError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse sides JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("entry without '=': '{0}'")]
    MissingEquals(String),

    #[error("empty key in entry '{0}'")]
    EmptyKey(String),

    #[error("invalid slot index: '{0}'")]
    InvalidSlot(String),
}

/// A dictionary value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DictValue {
    Bool(bool),
    Int(i64),
    String(String),
}

/// A side's key/value dictionary.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Dict {
    entries: BTreeMap<String, DictValue>,
}

impl Dict {
    pub fn set(&mut self, key: &str, value: DictValue) {
        self.entries.insert(key.to_string(), value);
    }

    pub fn get(&self, key: &str) -> Option<&DictValue> {
        self.entries.get(key)
    }

    /// Returns the string at `key`, or "" if missing or not a string.
    pub fn get_string(&self, key: &str) -> &str {
        match self.entries.get(key) {
            Some(DictValue::String(s)) => s,
            _ => "",
        }
    }

    /// Returns the boolean at `key`. Integers count as true when non-zero.
    pub fn get_bool(&self, key: &str) -> Option<bool> {
        match self.entries.get(key)? {
            DictValue::Bool(b) => Some(*b),
            DictValue::Int(i) => Some(*i != 0),
            DictValue::String(_) => None,
        }
    }

    pub fn get_int(&self, key: &str) -> Option<i64> {
        match self.entries.get(key)? {
            DictValue::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &DictValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }
}

/// One structure a player is expected to build.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BuildInfo {
    pub template_name: String,
    #[serde(default)]
    pub position: [f32; 3],
    #[serde(default)]
    pub angle: f32,
    #[serde(default)]
    pub initially_built: bool,
}

/// A player's ordered build list.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BuildList {
    pub entries: Vec<BuildInfo>,
}

impl BuildList {
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }
}

/// Declarative configuration for one faction.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SideInfo {
    pub dict: Dict,
    #[serde(default)]
    pub build_list: Option<BuildList>,
    #[serde(default)]
    pub slot_index: Option<usize>,
    /// Additional named teams owned by this side's player.
    #[serde(default)]
    pub teams: Vec<String>,
}

impl SideInfo {
    pub fn new(dict: Dict) -> Self {
        SideInfo {
            dict,
            ..SideInfo::default()
        }
    }

    /// The side's player name; empty for the neutral side.
    pub fn player_name(&self) -> &str {
        self.dict.get_string(keys::PLAYER_NAME)
    }

    /// Moves the build list out of the side, leaving it empty.
    pub fn release_build_list(&mut self) -> BuildList {
        self.build_list.take().unwrap_or_default()
    }
}

/// The ordered set of sides for a map.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SidesList {
    pub sides: Vec<SideInfo>,
}

impl SidesList {
    pub fn new() -> Self {
        SidesList::default()
    }

    pub fn push(&mut self, side: SideInfo) {
        self.sides.push(side);
    }

    pub fn len(&self) -> usize {
        self.sides.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sides.is_empty()
    }

    pub fn clear(&mut self) {
        self.sides.clear();
    }

    /// Number of lobby slots implied by conventional side names.
    ///
    /// Counts the host slot plus each consecutive `player1`, `player2`, ...
    /// name present, stopping at the first gap. Returns 0 when no `player<N>`
    /// names exist at all.
    pub fn suggested_slot_player_count(&self) -> usize {
        let mut count = 1;
        for i in 1..MAX_SLOTS {
            let target = format!("player{}", i);
            if self.sides.iter().any(|s| s.player_name() == target) {
                count += 1;
            } else {
                break;
            }
        }
        if count == 1 {
            0
        } else {
            count
        }
    }
}

/// Parses a sides file from a JSON string.
pub fn load_sides_from_str(json: &str) -> Result<SidesList, SideParseError> {
    Ok(serde_json::from_str(json)?)
}

/// Loads a sides file from disk.
pub fn load_sides(path: &Path) -> Result<SidesList, SideParseError> {
    let data = fs::read_to_string(path).map_err(|source| SideParseError::Io {
        path: path.display().to_string(),
        source,
    })?;
    load_sides_from_str(&data)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn named(name: &str) -> SideInfo {
        let mut dict = Dict::default();
        dict.set(keys::PLAYER_NAME, DictValue::String(name.into()));
        SideInfo::new(dict)
    }

    #[test]
    fn dict_accessors() {
        let mut d = Dict::default();
        d.set(keys::PLAYER_NAME, DictValue::String("Boss".into()));
        d.set(keys::PLAYER_IS_HUMAN, DictValue::Int(1));
        assert_eq!(d.get_string(keys::PLAYER_NAME), "Boss");
        assert_eq!(d.get_string(keys::PLAYER_ALLIES), "");
        assert_eq!(d.get_bool(keys::PLAYER_IS_HUMAN), Some(true));
        assert_eq!(d.get_bool(keys::MULTIPLAYER_IS_LOCAL), None);
        assert_eq!(d.get_bool(keys::PLAYER_NAME), None);
    }

    #[test]
    fn release_build_list_moves_out() {
        let mut side = named("Boss");
        side.build_list = Some(BuildList {
            entries: vec![BuildInfo {
                template_name: "Barracks".into(),
                position: [0.0; 3],
                angle: 0.0,
                initially_built: true,
            }],
        });
        assert_eq!(side.release_build_list().len(), 1);
        assert!(side.build_list.is_none());
        assert!(side.release_build_list().is_empty());
    }

    #[test]
    fn slot_count_from_names() {
        let mut sides = SidesList::new();
        sides.push(named(""));
        sides.push(named("ThePlayer"));
        assert_eq!(sides.suggested_slot_player_count(), 0);

        sides.push(named("player1"));
        sides.push(named("player2"));
        sides.push(named("player4"));
        assert_eq!(sides.suggested_slot_player_count(), 3);
    }

    #[test]
    fn load_from_json() {
        let json = r#"{
            "sides": [
                { "dict": { "playerName": "" } },
                {
                    "dict": { "playerName": "ThePlayer", "playerIsHuman": true, "playerEnemies": "Enemy" },
                    "build_list": [ { "template_name": "CommandCenter" } ],
                    "slot_index": 0
                }
            ]
        }"#;
        let sides = load_sides_from_str(json).unwrap();
        assert_eq!(sides.len(), 2);
        assert_eq!(sides.sides[1].player_name(), "ThePlayer");
        assert_eq!(sides.sides[1].dict.get_bool(keys::PLAYER_IS_HUMAN), Some(true));
        assert_eq!(sides.sides[1].build_list.as_ref().unwrap().len(), 1);
        assert_eq!(sides.sides[1].slot_index, Some(0));
    }

    #[test]
    fn load_from_bad_json() {
        assert!(matches!(load_sides_from_str("{"), Err(SideParseError::Json(_))));
    }
}

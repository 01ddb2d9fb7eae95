//! Player identity, relationships, and per-player state.
//!
//! Players live in a fixed arena owned by `PlayerList` and are reinitialized
//! in place between games; they are never destroyed and recreated, so teams
//! and objects may hold a `PlayerIndex` across games without dangling.

use std::collections::BTreeMap;
use std::fmt;

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

use super::side::{keys, BuildList, Dict};
use super::team::TeamId;
use crate::upgrade::UpgradeMask;

/// The number of player slots allocated for every game.
pub const MAX_PLAYER_COUNT: usize = 16;

/// A player's slot in the roster arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlayerIndex(u8);

impl PlayerIndex {
    /// The neutral player always occupies slot 0.
    pub const NEUTRAL: PlayerIndex = PlayerIndex(0);

    /// Returns the index for slot `i`, or None outside `MAX_PLAYER_COUNT`.
    pub fn new(i: usize) -> Option<Self> {
        if i < MAX_PLAYER_COUNT {
            Some(PlayerIndex(i as u8))
        } else {
            None
        }
    }

    pub const fn index(self) -> usize {
        self.0 as usize
    }

    /// The single-player mask for this slot.
    pub const fn mask(self) -> PlayerMask {
        PlayerMask(1 << self.0)
    }
}

impl fmt::Display for PlayerIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A set of players, one bit per roster slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlayerMask(u32);

impl PlayerMask {
    pub const EMPTY: PlayerMask = PlayerMask(0);

    pub const fn from_bits(bits: u32) -> Self {
        PlayerMask(bits)
    }

    pub const fn bits(self) -> u32 {
        self.0
    }

    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub const fn contains(self, index: PlayerIndex) -> bool {
        self.0 & index.mask().0 != 0
    }

    /// True if the two masks share a player.
    pub const fn intersects(self, other: PlayerMask) -> bool {
        self.0 & other.0 != 0
    }

    pub fn insert(&mut self, index: PlayerIndex) {
        self.0 |= index.mask().0;
    }

    pub fn remove(&mut self, index: PlayerIndex) {
        self.0 &= !index.mask().0;
    }

    pub const fn count(self) -> u32 {
        self.0.count_ones()
    }
}

impl fmt::Display for PlayerMask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#06x}", self.0)
    }
}

/// Who controls a player.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PlayerType {
    Human,
    Computer,
    Neutral,
}

impl PlayerType {
    /// Returns the lowercase protocol name.
    pub const fn name(self) -> &'static str {
        match self {
            PlayerType::Human => "human",
            PlayerType::Computer => "computer",
            PlayerType::Neutral => "neutral",
        }
    }

    /// Parses a player type from its lowercase protocol name.
    pub fn from_name(s: &str) -> Option<PlayerType> {
        match s {
            "human" => Some(PlayerType::Human),
            "computer" => Some(PlayerType::Computer),
            "neutral" => Some(PlayerType::Neutral),
            _ => None,
        }
    }
}

/// How one player regards another player's team.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Relationship {
    Enemies,
    Allies,
    Neutral,
}

impl Relationship {
    /// Returns the lowercase protocol name.
    pub const fn name(self) -> &'static str {
        match self {
            Relationship::Enemies => "enemies",
            Relationship::Allies => "allies",
            Relationship::Neutral => "neutral",
        }
    }

    /// Parses a relationship from its lowercase protocol name.
    pub fn from_name(s: &str) -> Option<Relationship> {
        match s {
            "enemies" => Some(Relationship::Enemies),
            "allies" => Some(Relationship::Allies),
            "neutral" => Some(Relationship::Neutral),
            _ => None,
        }
    }
}

bitflags! {
    /// Which relationships a player-mask query accepts.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct RelationshipFilter: u32 {
        const SAME_PLAYER = 0x1;
        const ENEMIES     = 0x2;
        const ALLIES      = 0x4;
        const NEUTRAL     = 0x8;
    }
}

impl RelationshipFilter {
    /// Parses a single protocol filter token.
    pub fn from_token(s: &str) -> Option<RelationshipFilter> {
        match s {
            "self" => Some(RelationshipFilter::SAME_PLAYER),
            "enemies" => Some(RelationshipFilter::ENEMIES),
            "allies" => Some(RelationshipFilter::ALLIES),
            "neutral" => Some(RelationshipFilter::NEUTRAL),
            _ => None,
        }
    }

    /// Returns the filter bit that admits `relationship`.
    pub const fn admitting(relationship: Relationship) -> RelationshipFilter {
        match relationship {
            Relationship::Enemies => RelationshipFilter::ENEMIES,
            Relationship::Allies => RelationshipFilter::ALLIES,
            Relationship::Neutral => RelationshipFilter::NEUTRAL,
        }
    }
}

/// The identity key of a player name. The neutral player has the empty key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NameKey(String);

impl NameKey {
    pub fn new(name: &str) -> Self {
        NameKey(name.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for NameKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            f.write_str("-")
        } else {
            f.write_str(&self.0)
        }
    }
}

/// Computer-player brain. Holds team references, so it must be torn down
/// before the team factory is cleared.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlayerAi {
    pub managed_teams: Vec<TeamId>,
}

/// Per-player record carried by a roster snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerSnapshot {
    pub name_key: NameKey,
    pub player_type: PlayerType,
    pub default_team: Option<TeamId>,
    pub relationships: Vec<(TeamId, Relationship)>,
    pub upgrades: UpgradeMask,
}

/// A participant in the game.
#[derive(Debug, Clone)]
pub struct Player {
    index: PlayerIndex,
    name_key: NameKey,
    display_name: String,
    faction: String,
    player_type: PlayerType,
    slot_index: Option<usize>,
    relationships: BTreeMap<TeamId, Relationship>,
    default_team: Option<TeamId>,
    build_list: BuildList,
    ai: Option<PlayerAi>,
    is_local: bool,
    upgrades: UpgradeMask,
}

impl Player {
    pub(crate) fn new(index: PlayerIndex) -> Self {
        let mut player = Player {
            index,
            name_key: NameKey::default(),
            display_name: String::new(),
            faction: String::new(),
            player_type: PlayerType::Neutral,
            slot_index: None,
            relationships: BTreeMap::new(),
            default_team: None,
            build_list: BuildList::default(),
            ai: None,
            is_local: false,
            upgrades: UpgradeMask::EMPTY,
        };
        player.init(None);
        player
    }

    /// Reinitializes the player in place. `None` produces a neutral player.
    pub(crate) fn init(&mut self, dict: Option<&Dict>) {
        self.relationships.clear();
        self.default_team = None;
        self.build_list = BuildList::default();
        self.ai = None;
        self.is_local = false;
        self.upgrades = UpgradeMask::EMPTY;
        self.slot_index = None;

        match dict {
            None => {
                self.name_key = NameKey::default();
                self.display_name.clear();
                self.faction.clear();
                self.player_type = PlayerType::Neutral;
            }
            Some(d) => {
                let name = d.get_string(keys::PLAYER_NAME);
                self.name_key = NameKey::new(name);
                self.display_name = match d.get_string(keys::PLAYER_DISPLAY_NAME) {
                    "" => name.to_string(),
                    display => display.to_string(),
                };
                self.faction = d.get_string(keys::PLAYER_FACTION).to_string();
                let human = d.get_bool(keys::PLAYER_IS_HUMAN).unwrap_or(false);
                let player_type = if human { PlayerType::Human } else { PlayerType::Computer };
                self.set_player_type(player_type, false);
            }
        }
    }

    pub fn index(&self) -> PlayerIndex {
        self.index
    }

    pub fn mask(&self) -> PlayerMask {
        self.index.mask()
    }

    pub fn name_key(&self) -> &NameKey {
        &self.name_key
    }

    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    pub fn faction(&self) -> &str {
        &self.faction
    }

    pub fn player_type(&self) -> PlayerType {
        self.player_type
    }

    pub fn is_neutral(&self) -> bool {
        self.index == PlayerIndex::NEUTRAL
    }

    pub fn slot_index(&self) -> Option<usize> {
        self.slot_index
    }

    pub fn default_team(&self) -> Option<TeamId> {
        self.default_team
    }

    pub fn build_list(&self) -> &BuildList {
        &self.build_list
    }

    pub fn ai(&self) -> Option<&PlayerAi> {
        self.ai.as_ref()
    }

    pub fn is_local(&self) -> bool {
        self.is_local
    }

    /// Upgrades this player has completed.
    pub fn completed_upgrades(&self) -> UpgradeMask {
        self.upgrades
    }

    /// Changes control type. Computer players get an AI unless `keep_ai` is
    /// false and the new type is human.
    pub(crate) fn set_player_type(&mut self, player_type: PlayerType, keep_ai: bool) {
        self.player_type = player_type;
        match player_type {
            PlayerType::Computer => {
                if self.ai.is_none() {
                    self.ai = Some(PlayerAi::default());
                }
            }
            PlayerType::Human | PlayerType::Neutral => {
                if !keep_ai {
                    self.ai = None;
                }
            }
        }
    }

    pub(crate) fn set_slot_index(&mut self, slot: Option<usize>) {
        self.slot_index = slot;
    }

    pub(crate) fn set_default_team(&mut self, team: Option<TeamId>) {
        self.default_team = team;
        if let (Some(ai), Some(team)) = (self.ai.as_mut(), team) {
            if !ai.managed_teams.contains(&team) {
                ai.managed_teams.push(team);
            }
        }
    }

    pub(crate) fn set_build_list(&mut self, build_list: BuildList) {
        self.build_list = build_list;
    }

    pub(crate) fn delete_player_ai(&mut self) {
        self.ai = None;
    }

    pub(crate) fn becoming_local_player(&mut self, yes: bool) {
        self.is_local = yes;
    }

    /// Records how this player regards `team`.
    pub fn set_team_relationship(&mut self, team: TeamId, relationship: Relationship) {
        self.relationships.insert(team, relationship);
    }

    /// How this player regards `team`. Teams with no entry are neutral.
    pub fn relationship(&self, team: Option<TeamId>) -> Relationship {
        team.and_then(|t| self.relationships.get(&t).copied())
            .unwrap_or(Relationship::Neutral)
    }

    /// Drops any entry for `team`. Returns true if one existed.
    pub fn remove_team_relationship(&mut self, team: TeamId) -> bool {
        if let Some(ai) = self.ai.as_mut() {
            ai.managed_teams.retain(|&t| t != team);
        }
        if self.default_team == Some(team) {
            self.default_team = None;
        }
        self.relationships.remove(&team).is_some()
    }

    pub fn add_upgrades(&mut self, upgrades: UpgradeMask) {
        self.upgrades.set(upgrades);
    }

    pub fn remove_upgrades(&mut self, upgrades: UpgradeMask) {
        self.upgrades.clear(upgrades);
    }

    pub fn snapshot(&self) -> PlayerSnapshot {
        PlayerSnapshot {
            name_key: self.name_key.clone(),
            player_type: self.player_type,
            default_team: self.default_team,
            relationships: self.relationships.iter().map(|(&t, &r)| (t, r)).collect(),
            upgrades: self.upgrades,
        }
    }

    pub(crate) fn restore(&mut self, snapshot: &PlayerSnapshot) {
        self.name_key = snapshot.name_key.clone();
        self.set_player_type(snapshot.player_type, false);
        self.default_team = snapshot.default_team;
        self.relationships = snapshot.relationships.iter().copied().collect();
        self.upgrades = snapshot.upgrades;
    }
}

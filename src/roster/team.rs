//! Team factory collaborator.
//!
//! Teams are owned by a factory outside the roster. The roster drives the
//! factory through the `TeamFactory` trait at well-defined points of a game
//! rebuild and never stores anything but `TeamId` handles.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::list::PlayerList;
use super::player::{NameKey, PlayerIndex};
use super::side::SidesList;

/// Handle to a team owned by a `TeamFactory`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TeamId(u32);

impl TeamId {
    pub const fn new(id: u32) -> Self {
        TeamId(id)
    }

    pub const fn get(self) -> u32 {
        self.0
    }
}

impl fmt::Display for TeamId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Name of the default team for a player. The neutral player's is `team`.
pub fn default_team_name(name_key: &NameKey) -> String {
    format!("team{}", name_key.as_str())
}

/// Creates, looks up, and clears teams on behalf of the roster.
pub trait TeamFactory {
    /// Destroys every team.
    fn clear(&mut self);

    /// Creates the default team for every active player plus any extra teams
    /// listed by the sides. Must run after all players exist.
    fn init_from_sides(&mut self, sides: &SidesList, players: &PlayerList);

    fn find_team(&self, name: &str) -> Option<TeamId>;

    fn team_owner(&self, team: TeamId) -> Option<PlayerIndex>;
}

/// A team record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Team {
    pub id: TeamId,
    pub name: String,
    pub owner: PlayerIndex,
}

/// Vector-backed `TeamFactory`.
#[derive(Debug, Clone, Default)]
pub struct TeamTable {
    teams: Vec<Team>,
    next_id: u32,
}

impl TeamTable {
    pub fn new() -> Self {
        TeamTable::default()
    }

    pub fn teams(&self) -> &[Team] {
        &self.teams
    }

    pub fn get(&self, id: TeamId) -> Option<&Team> {
        self.teams.iter().find(|t| t.id == id)
    }

    /// Creates a team, or returns the existing one with the same name.
    pub fn create_team(&mut self, name: &str, owner: PlayerIndex) -> TeamId {
        if let Some(id) = self.find_team(name) {
            return id;
        }
        let id = TeamId(self.next_id);
        self.next_id += 1;
        self.teams.push(Team {
            id,
            name: name.to_string(),
            owner,
        });
        id
    }

    /// Removes a team by name. The caller must purge roster references first
    /// (see `PlayerList::team_about_to_be_deleted`).
    pub fn delete_team(&mut self, name: &str) -> Option<Team> {
        let pos = self.teams.iter().position(|t| t.name == name)?;
        Some(self.teams.remove(pos))
    }
}

impl TeamFactory for TeamTable {
    fn clear(&mut self) {
        self.teams.clear();
        self.next_id = 0;
    }

    fn init_from_sides(&mut self, sides: &SidesList, players: &PlayerList) {
        for player in players.players() {
            self.create_team(&default_team_name(player.name_key()), player.index());
        }
        for side in &sides.sides {
            let owner = match players.find_by_name_key(&NameKey::new(side.player_name())) {
                Some(p) => p.index(),
                None => continue,
            };
            for name in &side.teams {
                self.create_team(name, owner);
            }
        }
    }

    fn find_team(&self, name: &str) -> Option<TeamId> {
        self.teams.iter().find(|t| t.name == name).map(|t| t.id)
    }

    fn team_owner(&self, team: TeamId) -> Option<PlayerIndex> {
        self.get(team).map(|t| t.owner)
    }
}

//! The authoritative set of in-game players.
//!
//! `PlayerList` allocates every player slot once and reinitializes them in
//! place for each new game. Slot 0 is always the neutral player, and exactly
//! one player is local at any time (neutral until a game assigns someone
//! else).

use log::{debug, error, warn};

use super::player::{
    NameKey, Player, PlayerIndex, PlayerMask, PlayerType, Relationship, RelationshipFilter,
    MAX_PLAYER_COUNT,
};
use super::side::{keys, SidesList};
use super::team::{default_team_name, TeamFactory, TeamId};
use crate::config::EngineConfig;

/// Name conventions for the primary human slot of a campaign map, tried in order.
const CAMPAIGN_PRIMARY_NAMES: [&str; 3] = ["ThePlayer", "Player", "player0"];

/// Highest `player<N>` suffix considered for additional campaign humans.
const CAMPAIGN_MAX_EXTRA_SLOT: usize = 7;

/// Errors raised by roster operations.
#[derive(Debug, thiserror::Error)]
pub enum RosterError {
    #[error("{requested} players requested but the roster holds at most {capacity}")]
    CapacityExceeded { requested: usize, capacity: usize },

    #[error("no player at index {0}")]
    UnknownPlayerIndex(usize),

    #[error("no player matches mask {0}")]
    NoPlayerForMask(PlayerMask),

    #[error("unknown player '{0}'")]
    UnknownPlayerName(String),
}

/// Owns every player slot and the local-player designation.
#[derive(Debug, Clone)]
pub struct PlayerList {
    players: Box<[Player]>,
    player_count: usize,
    local: PlayerIndex,
    human_refs: Vec<PlayerIndex>,
}

impl Default for PlayerList {
    fn default() -> Self {
        PlayerList::new()
    }
}

impl PlayerList {
    /// Allocates all `MAX_PLAYER_COUNT` slots with only neutral active.
    pub fn new() -> Self {
        let players: Box<[Player]> = (0..MAX_PLAYER_COUNT)
            .filter_map(PlayerIndex::new)
            .map(Player::new)
            .collect();
        let mut list = PlayerList {
            players,
            player_count: 1,
            local: PlayerIndex::NEUTRAL,
            human_refs: Vec::new(),
        };
        list.init();
        list
    }

    fn init(&mut self) {
        self.player_count = 1;
        self.human_refs.clear();
        for p in self.players.iter_mut() {
            p.init(None);
        }
        self.local = PlayerIndex::NEUTRAL;
        self.players[0].becoming_local_player(true);
    }

    /// Clears all per-game state.
    ///
    /// Player AIs hold team references, so they are torn down before the team
    /// factory is cleared.
    pub fn reset(&mut self, teams: &mut dyn TeamFactory) {
        for p in self.players.iter_mut() {
            p.delete_player_ai();
        }
        teams.clear();
        self.init();
    }

    /// Rebuilds the roster from `sides` for a new game.
    ///
    /// Each named side gets the next slot and hands over its build list.
    /// Teams are created only once every player exists, and relationships
    /// are resolved last. Self is always allied and neutral is always
    /// neutral, whatever the side data says.
    pub fn new_game(
        &mut self,
        sides: &mut SidesList,
        teams: &mut dyn TeamFactory,
        config: &EngineConfig,
    ) -> Result<(), RosterError> {
        let named = sides.sides.iter().filter(|s| !s.player_name().is_empty()).count();
        if named + 1 > MAX_PLAYER_COUNT {
            return Err(RosterError::CapacityExceeded {
                requested: named + 1,
                capacity: MAX_PLAYER_COUNT,
            });
        }

        self.reset(teams);

        let mut local_set = false;
        let mut flagged_local = false;
        let mut assigned = Vec::with_capacity(sides.len());
        for side in sides.sides.iter_mut() {
            let name = side.player_name().to_string();
            if name.is_empty() {
                assigned.push(PlayerIndex::NEUTRAL);
                continue;
            }
            if self.find_by_name(&name).is_some() {
                warn!("duplicate side name '{}'; lookups resolve to the first", name);
            }

            let slot = self.player_count;
            self.player_count += 1;
            let index = self.players[slot].index();
            assigned.push(index);

            let explicit_local = side.dict.get_bool(keys::MULTIPLAYER_IS_LOCAL).unwrap_or(false);
            let human = side.dict.get_bool(keys::PLAYER_IS_HUMAN).unwrap_or(false);

            let player = &mut self.players[slot];
            player.init(Some(&side.dict));
            player.set_slot_index(side.slot_index);
            player.set_build_list(side.release_build_list());

            if explicit_local {
                debug!("player {} is multiplayer local", name);
                if flagged_local {
                    warn!("more than one side is flagged local; '{}' takes over", name);
                }
                self.set_local_player(Some(index));
                local_set = true;
                flagged_local = true;
            } else if !local_set && !config.network_active && !config.campaign_force && human {
                debug!("player {} is the first human, making it local", name);
                self.set_local_player(Some(index));
                local_set = true;
            }
        }

        if config.campaign_force {
            self.human_refs = self.campaign_human_players(config.skirmish_session);
        }

        if !local_set {
            warn!("map has no human player; picking first non-neutral player for control");
            let fallback = self.players().find(|p| !p.is_neutral()).map(|p| p.index());
            match fallback {
                Some(index) => {
                    self.players[index.index()].set_player_type(PlayerType::Human, false);
                    self.set_local_player(Some(index));
                }
                None => warn!("roster has no non-neutral player; neutral stays local"),
            }
        }

        teams.init_from_sides(sides, self);
        self.assign_default_teams(teams);

        for (side, &src) in sides.sides.iter().zip(&assigned) {
            let name = self.player(src).name_key().clone();
            for (list_key, relationship) in [
                (keys::PLAYER_ENEMIES, Relationship::Enemies),
                (keys::PLAYER_ALLIES, Relationship::Allies),
            ] {
                for token in side.dict.get_string(list_key).split_whitespace() {
                    match self.find_by_name(token).map(|p| p.index()) {
                        Some(other) => self.set_player_relationship(src, other, relationship),
                        None => warn!("unknown {} '{}' for player '{}'", relationship.name(), token, name),
                    }
                }
            }
        }

        let active: Vec<PlayerIndex> = self.players().map(|p| p.index()).collect();
        for src in active {
            self.set_player_relationship(src, src, Relationship::Allies);
            if src != PlayerIndex::NEUTRAL {
                self.set_player_relationship(src, PlayerIndex::NEUTRAL, Relationship::Neutral);
            }
        }

        Ok(())
    }

    fn assign_default_teams(&mut self, teams: &dyn TeamFactory) {
        for p in self.players[..self.player_count].iter_mut() {
            let team = teams.find_team(&default_team_name(p.name_key()));
            if team.is_none() {
                warn!("no default team for player '{}'", p.name_key());
            }
            p.set_default_team(team);
        }
    }

    /// Sets how `src` regards `other`'s default team.
    pub fn set_player_relationship(
        &mut self,
        src: PlayerIndex,
        other: PlayerIndex,
        relationship: Relationship,
    ) {
        match self.players[other.index()].default_team() {
            Some(team) => self.players[src.index()].set_team_relationship(team, relationship),
            None => warn!(
                "cannot relate player {} to player {}: no default team",
                src, other
            ),
        }
    }

    /// How `src` regards `other`.
    pub fn relationship(&self, src: PlayerIndex, other: PlayerIndex) -> Relationship {
        self.player(src).relationship(self.player(other).default_team())
    }

    /// Returns the player in slot `i`, active or not. None outside capacity.
    pub fn nth_player(&self, i: usize) -> Option<&Player> {
        self.players.get(i)
    }

    pub fn nth_player_mut(&mut self, i: usize) -> Option<&mut Player> {
        self.players.get_mut(i)
    }

    pub fn player(&self, index: PlayerIndex) -> &Player {
        &self.players[index.index()]
    }

    pub fn player_mut(&mut self, index: PlayerIndex) -> &mut Player {
        &mut self.players[index.index()]
    }

    /// Iterates the active players, neutral first.
    pub fn players(&self) -> impl Iterator<Item = &Player> {
        self.players[..self.player_count].iter()
    }

    pub fn player_count(&self) -> usize {
        self.player_count
    }

    pub fn neutral_player(&self) -> &Player {
        &self.players[0]
    }

    pub fn local_player(&self) -> &Player {
        &self.players[self.local.index()]
    }

    /// Human slots resolved in campaign-force mode; empty otherwise.
    pub fn human_player_refs(&self) -> &[PlayerIndex] {
        &self.human_refs
    }

    /// Linear scan over active players.
    pub fn find_by_name_key(&self, key: &NameKey) -> Option<&Player> {
        self.players().find(|p| p.name_key() == key)
    }

    pub fn find_by_name(&self, name: &str) -> Option<&Player> {
        self.players().find(|p| p.name_key().as_str() == name)
    }

    /// Makes `player` local. `None` is a caller bug and is replaced by neutral.
    pub fn set_local_player(&mut self, player: Option<PlayerIndex>) {
        let player = match player {
            Some(p) => p,
            None => {
                error!("local player may not be unset; substituting neutral");
                PlayerIndex::NEUTRAL
            }
        };
        if player != self.local {
            self.players[self.local.index()].becoming_local_player(false);
            self.local = player;
            self.players[player.index()].becoming_local_player(true);
        }
    }

    /// Finds the player whose mask equals `mask` exactly.
    pub fn player_from_mask(&self, mask: PlayerMask) -> Result<&Player, RosterError> {
        self.players.iter().find(|p| p.mask() == mask).ok_or_else(|| {
            error!("player does not exist for mask {}", mask);
            RosterError::NoPlayerForMask(mask)
        })
    }

    /// Iterates each player contained in `mask`, lowest slot first.
    pub fn players_in_mask(&self, mask: PlayerMask) -> PlayersInMask<'_> {
        PlayersInMask {
            list: self,
            remaining: mask,
        }
    }

    /// Builds the mask of players that `src` regards with one of the
    /// relationships admitted by `allowed`.
    pub fn get_players_with_relationship(
        &self,
        src: usize,
        allowed: RelationshipFilter,
    ) -> Result<PlayerMask, RosterError> {
        let mut result = PlayerMask::EMPTY;
        if allowed.is_empty() {
            return Ok(result);
        }

        let source = self.nth_player(src).ok_or_else(|| {
            error!("relationship mask requested for missing source player {}", src);
            RosterError::UnknownPlayerIndex(src)
        })?;

        if allowed.contains(RelationshipFilter::SAME_PLAYER) {
            result.insert(source.index());
        }

        for player in self.players() {
            if player.index() == source.index() {
                continue;
            }
            let relationship = source.relationship(player.default_team());
            if allowed.contains(RelationshipFilter::admitting(relationship)) {
                result.insert(player.index());
            }
        }

        Ok(result)
    }

    /// Resolves an owner name to a team, falling back to neutral's default
    /// team when nothing matches.
    pub fn validate_team(&self, owner: &str, teams: &dyn TeamFactory) -> Option<TeamId> {
        match teams.find_team(owner) {
            Some(team) => Some(team),
            None => {
                error!("no team or player named '{}' could be found", owner);
                self.neutral_player().default_team()
            }
        }
    }

    /// Purges `team` from every player before the factory deletes it.
    pub fn team_about_to_be_deleted(&mut self, team: TeamId) {
        for p in self.players.iter_mut() {
            p.remove_team_relationship(team);
        }
    }

    /// Resolves the human slots of a campaign map played as skirmish.
    ///
    /// From a lobby, the primary human is the first of `ThePlayer`, `Player`,
    /// `player0` that exists, followed by `player1`, `player2`, ... up to the
    /// first missing name. On a shell map, the first human-typed player.
    pub fn campaign_human_players(&self, from_skirmish: bool) -> Vec<PlayerIndex> {
        let mut refs = Vec::new();
        if from_skirmish {
            if let Some(p) = CAMPAIGN_PRIMARY_NAMES
                .iter()
                .find_map(|name| self.find_by_name(name))
            {
                refs.push(p.index());
            }
            for i in 1..=CAMPAIGN_MAX_EXTRA_SLOT {
                match self.find_by_name(&format!("player{}", i)) {
                    Some(p) => refs.push(p.index()),
                    None => break,
                }
            }
        } else if let Some(p) = self
            .players
            .iter()
            .find(|p| p.player_type() == PlayerType::Human)
        {
            refs.push(p.index());
        }
        refs
    }

    pub(crate) fn players_mut(&mut self) -> &mut [Player] {
        &mut self.players
    }
}

/// Iterator over the players of a mask. See `PlayerList::players_in_mask`.
pub struct PlayersInMask<'a> {
    list: &'a PlayerList,
    remaining: PlayerMask,
}

impl<'a> Iterator for PlayersInMask<'a> {
    type Item = &'a Player;

    fn next(&mut self) -> Option<&'a Player> {
        if self.remaining.is_empty() {
            return None;
        }
        let list = self.list;
        let remaining = self.remaining;
        match list.players.iter().find(|p| remaining.contains(p.index())) {
            Some(p) => {
                self.remaining.remove(p.index());
                Some(p)
            }
            None => {
                error!("no players found for remaining mask {}", self.remaining);
                self.remaining = PlayerMask::EMPTY;
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::roster::side::{BuildInfo, BuildList, Dict, DictValue, SideInfo};
    use crate::roster::team::TeamTable;

    fn side(name: &str, human: bool, enemies: &str, allies: &str) -> SideInfo {
        let mut dict = Dict::default();
        dict.set(keys::PLAYER_NAME, DictValue::String(name.into()));
        dict.set(keys::PLAYER_IS_HUMAN, DictValue::Bool(human));
        dict.set(keys::PLAYER_ENEMIES, DictValue::String(enemies.into()));
        dict.set(keys::PLAYER_ALLIES, DictValue::String(allies.into()));
        SideInfo::new(dict)
    }

    fn skirmish_sides() -> SidesList {
        let mut sides = SidesList::new();
        sides.push(side("", false, "", ""));
        sides.push(side("ThePlayer", true, "Enemy", "Friend"));
        sides.push(side("Enemy", false, "ThePlayer Friend", ""));
        sides.push(side("Friend", false, "Enemy", "ThePlayer"));
        sides
    }

    fn build(sides: &mut SidesList, config: &EngineConfig) -> (PlayerList, TeamTable) {
        let mut list = PlayerList::new();
        let mut teams = TeamTable::new();
        list.new_game(sides, &mut teams, config).unwrap();
        (list, teams)
    }

    fn idx(list: &PlayerList, name: &str) -> PlayerIndex {
        list.find_by_name(name).unwrap().index()
    }

    #[test]
    fn new_list_has_only_neutral_local() {
        let list = PlayerList::new();
        assert_eq!(list.player_count(), 1);
        assert!(list.neutral_player().is_neutral());
        assert!(list.local_player().is_neutral());
        assert_eq!(list.players().filter(|p| p.is_local()).count(), 1);
    }

    #[test]
    fn new_game_assigns_slots_in_side_order() {
        let (list, _) = build(&mut skirmish_sides(), &EngineConfig::default());
        assert_eq!(list.player_count(), 4);
        let names: Vec<String> = list.players().map(|p| p.name_key().to_string()).collect();
        assert_eq!(names, vec!["-", "ThePlayer", "Enemy", "Friend"]);
    }

    #[test]
    fn first_human_becomes_local() {
        let (list, _) = build(&mut skirmish_sides(), &EngineConfig::default());
        assert_eq!(list.local_player().name_key().as_str(), "ThePlayer");
        assert_eq!(list.players().filter(|p| p.is_local()).count(), 1);
    }

    #[test]
    fn explicit_local_flag_wins_over_human() {
        let mut sides = skirmish_sides();
        sides.sides[3]
            .dict
            .set(keys::MULTIPLAYER_IS_LOCAL, DictValue::Bool(true));
        let (list, _) = build(&mut sides, &EngineConfig::default());
        assert_eq!(list.local_player().name_key().as_str(), "Friend");
        assert_eq!(list.players().filter(|p| p.is_local()).count(), 1);
    }

    #[test]
    fn network_session_skips_human_fallback() {
        let config = EngineConfig {
            network_active: true,
            ..EngineConfig::default()
        };
        let (list, _) = build(&mut skirmish_sides(), &config);
        // Falls through to the first non-neutral player.
        assert_eq!(list.local_player().name_key().as_str(), "ThePlayer");
    }

    #[test]
    fn no_human_forces_first_non_neutral() {
        let mut sides = SidesList::new();
        sides.push(side("", false, "", ""));
        sides.push(side("AI1", false, "", ""));
        sides.push(side("AI2", false, "", ""));
        let (list, _) = build(&mut sides, &EngineConfig::default());
        let local = list.local_player();
        assert_eq!(local.name_key().as_str(), "AI1");
        assert_eq!(local.player_type(), PlayerType::Human);
        assert!(local.ai().is_none());
    }

    #[test]
    fn only_neutral_keeps_neutral_local() {
        let mut sides = SidesList::new();
        sides.push(side("", false, "", ""));
        let (list, _) = build(&mut sides, &EngineConfig::default());
        assert_eq!(list.player_count(), 1);
        assert!(list.local_player().is_neutral());
    }

    #[test]
    fn relationships_resolved_from_tokens() {
        let (list, _) = build(&mut skirmish_sides(), &EngineConfig::default());
        let me = idx(&list, "ThePlayer");
        let enemy = idx(&list, "Enemy");
        let friend = idx(&list, "Friend");
        assert_eq!(list.relationship(me, enemy), Relationship::Enemies);
        assert_eq!(list.relationship(me, friend), Relationship::Allies);
        assert_eq!(list.relationship(enemy, friend), Relationship::Enemies);
        assert_eq!(list.relationship(friend, me), Relationship::Allies);
    }

    #[test]
    fn self_and_neutral_relationships_override_side_data() {
        let mut sides = SidesList::new();
        sides.push(side("", false, "", ""));
        // Names itself as an enemy and lists neutral's empty name nowhere;
        // also declares an ally relationship to "" which cannot be tokenized.
        sides.push(side("Loner", true, "Loner", ""));
        let (list, _) = build(&mut sides, &EngineConfig::default());
        let loner = idx(&list, "Loner");
        assert_eq!(list.relationship(loner, loner), Relationship::Allies);
        assert_eq!(list.relationship(loner, PlayerIndex::NEUTRAL), Relationship::Neutral);
        assert_eq!(
            list.relationship(PlayerIndex::NEUTRAL, PlayerIndex::NEUTRAL),
            Relationship::Allies
        );
    }

    #[test]
    fn unknown_relationship_names_are_skipped() {
        let mut sides = SidesList::new();
        sides.push(side("", false, "", ""));
        sides.push(side("A", true, "Ghost B", "Phantom"));
        sides.push(side("B", false, "", ""));
        let (list, _) = build(&mut sides, &EngineConfig::default());
        assert_eq!(list.relationship(idx(&list, "A"), idx(&list, "B")), Relationship::Enemies);
    }

    #[test]
    fn neutral_side_relationships_apply_to_neutral() {
        let mut sides = SidesList::new();
        sides.push(side("", false, "Raider", ""));
        sides.push(side("Raider", true, "", ""));
        let (list, _) = build(&mut sides, &EngineConfig::default());
        assert_eq!(
            list.relationship(PlayerIndex::NEUTRAL, idx(&list, "Raider")),
            Relationship::Enemies
        );
    }

    #[test]
    fn duplicate_side_names_each_ally_themselves() {
        let mut sides = SidesList::new();
        sides.push(side("", false, "", ""));
        sides.push(side("Red", true, "Blue", ""));
        sides.push(side("Red", false, "Blue", ""));
        sides.push(side("Blue", false, "Red", ""));
        let (list, _) = build(&mut sides, &EngineConfig::default());
        assert_eq!(list.player_count(), 4);

        let second = PlayerIndex::new(2).unwrap();
        assert_eq!(list.player(second).name_key().as_str(), "Red");
        assert_eq!(list.relationship(second, second), Relationship::Allies);
        assert_eq!(list.relationship(second, PlayerIndex::NEUTRAL), Relationship::Neutral);
        assert_eq!(list.relationship(second, idx(&list, "Blue")), Relationship::Enemies);
    }

    #[test]
    fn neutral_allies_itself_without_a_neutral_side() {
        let mut sides = SidesList::new();
        sides.push(side("Solo", true, "", ""));
        let (list, _) = build(&mut sides, &EngineConfig::default());
        let solo = idx(&list, "Solo");
        assert_eq!(
            list.relationship(PlayerIndex::NEUTRAL, PlayerIndex::NEUTRAL),
            Relationship::Allies
        );
        assert_eq!(list.relationship(solo, solo), Relationship::Allies);
        assert_eq!(list.relationship(solo, PlayerIndex::NEUTRAL), Relationship::Neutral);
    }

    #[test]
    fn flagged_local_replaces_first_human_fallback() {
        let mut sides = SidesList::new();
        sides.push(side("", false, "", ""));
        sides.push(side("Host", true, "", ""));
        sides.push(side("Guest", true, "", ""));
        sides.sides[2]
            .dict
            .set(keys::MULTIPLAYER_IS_LOCAL, DictValue::Bool(true));
        let (list, _) = build(&mut sides, &EngineConfig::default());
        assert_eq!(list.local_player().name_key().as_str(), "Guest");
        assert!(!list.find_by_name("Host").unwrap().is_local());
        assert_eq!(list.players().filter(|p| p.is_local()).count(), 1);
    }

    #[test]
    fn build_list_is_moved_to_player() {
        let mut sides = skirmish_sides();
        sides.sides[1].build_list = Some(BuildList {
            entries: vec![BuildInfo {
                template_name: "CommandCenter".into(),
                position: [1.0, 2.0, 0.0],
                angle: 0.0,
                initially_built: true,
            }],
        });
        let (list, _) = build(&mut sides, &EngineConfig::default());
        assert_eq!(list.find_by_name("ThePlayer").unwrap().build_list().len(), 1);
        assert!(sides.sides[1].build_list.is_none());
    }

    #[test]
    fn slot_index_is_carried() {
        let mut sides = skirmish_sides();
        sides.sides[2].slot_index = Some(5);
        let (list, _) = build(&mut sides, &EngineConfig::default());
        assert_eq!(list.find_by_name("Enemy").unwrap().slot_index(), Some(5));
    }

    #[test]
    fn capacity_exceeded_is_rejected() {
        let mut sides = SidesList::new();
        sides.push(side("", false, "", ""));
        for i in 0..MAX_PLAYER_COUNT {
            sides.push(side(&format!("p{}", i), false, "", ""));
        }
        let mut list = PlayerList::new();
        let mut teams = TeamTable::new();
        let err = list
            .new_game(&mut sides, &mut teams, &EngineConfig::default())
            .unwrap_err();
        assert!(matches!(err, RosterError::CapacityExceeded { .. }));
        assert_eq!(list.player_count(), 1);
    }

    #[test]
    fn full_roster_fits() {
        let mut sides = SidesList::new();
        sides.push(side("", false, "", ""));
        for i in 0..MAX_PLAYER_COUNT - 1 {
            sides.push(side(&format!("p{}", i), i == 0, "", ""));
        }
        let (list, _) = build(&mut sides, &EngineConfig::default());
        assert_eq!(list.player_count(), MAX_PLAYER_COUNT);
    }

    #[test]
    fn rebuild_reinitializes_in_place() {
        let mut list = PlayerList::new();
        let mut teams = TeamTable::new();
        let config = EngineConfig::default();
        list.new_game(&mut skirmish_sides(), &mut teams, &config).unwrap();

        let mut smaller = SidesList::new();
        smaller.push(side("", false, "", ""));
        smaller.push(side("Solo", true, "", ""));
        list.new_game(&mut smaller, &mut teams, &config).unwrap();

        assert_eq!(list.player_count(), 2);
        assert!(list.find_by_name("Enemy").is_none());
        assert_eq!(list.nth_player(2).unwrap().player_type(), PlayerType::Neutral);
        assert!(list.nth_player(2).unwrap().default_team().is_none());
        assert_eq!(teams.teams().len(), 2);
    }

    #[test]
    fn nth_player_bounds() {
        let list = PlayerList::new();
        assert!(list.nth_player(0).is_some());
        assert!(list.nth_player(MAX_PLAYER_COUNT - 1).is_some());
        assert!(list.nth_player(MAX_PLAYER_COUNT).is_none());
    }

    #[test]
    fn find_by_name_key_misses() {
        let (list, _) = build(&mut skirmish_sides(), &EngineConfig::default());
        assert!(list.find_by_name_key(&NameKey::new("Nobody")).is_none());
        assert!(list.find_by_name_key(&NameKey::default()).unwrap().is_neutral());
    }

    #[test]
    fn players_with_relationship_masks() {
        let (list, _) = build(&mut skirmish_sides(), &EngineConfig::default());
        let me = idx(&list, "ThePlayer");
        let enemy = idx(&list, "Enemy");
        let friend = idx(&list, "Friend");

        let enemies = list
            .get_players_with_relationship(me.index(), RelationshipFilter::ENEMIES)
            .unwrap();
        assert_eq!(enemies, enemy.mask());

        let allies_and_self = list
            .get_players_with_relationship(
                me.index(),
                RelationshipFilter::ALLIES | RelationshipFilter::SAME_PLAYER,
            )
            .unwrap();
        assert!(allies_and_self.contains(me));
        assert!(allies_and_self.contains(friend));
        assert_eq!(allies_and_self.count(), 2);

        let neutral = list
            .get_players_with_relationship(me.index(), RelationshipFilter::NEUTRAL)
            .unwrap();
        assert_eq!(neutral, PlayerIndex::NEUTRAL.mask());

        let none = list
            .get_players_with_relationship(me.index(), RelationshipFilter::empty())
            .unwrap();
        assert!(none.is_empty());
    }

    #[test]
    fn players_with_relationship_bad_source() {
        let list = PlayerList::new();
        assert!(matches!(
            list.get_players_with_relationship(MAX_PLAYER_COUNT, RelationshipFilter::ALLIES),
            Err(RosterError::UnknownPlayerIndex(_))
        ));
    }

    #[test]
    fn set_local_none_substitutes_neutral() {
        let (mut list, _) = build(&mut skirmish_sides(), &EngineConfig::default());
        list.set_local_player(None);
        assert!(list.local_player().is_neutral());
        assert_eq!(list.players().filter(|p| p.is_local()).count(), 1);
    }

    #[test]
    fn mask_lookups() {
        let (list, _) = build(&mut skirmish_sides(), &EngineConfig::default());
        let enemy = idx(&list, "Enemy");
        assert_eq!(list.player_from_mask(enemy.mask()).unwrap().index(), enemy);
        assert!(list.player_from_mask(PlayerMask::from_bits(0b11)).is_err());

        let mut mask = PlayerMask::EMPTY;
        mask.insert(enemy);
        mask.insert(PlayerIndex::NEUTRAL);
        let found: Vec<PlayerIndex> = list.players_in_mask(mask).map(|p| p.index()).collect();
        assert_eq!(found, vec![PlayerIndex::NEUTRAL, enemy]);

        let beyond = PlayerMask::from_bits(1 << 20);
        assert_eq!(list.players_in_mask(beyond).count(), 0);
    }

    #[test]
    fn validate_team_falls_back_to_neutral() {
        let (list, teams) = build(&mut skirmish_sides(), &EngineConfig::default());
        let own = list.validate_team("teamEnemy", &teams);
        assert_eq!(own, list.find_by_name("Enemy").unwrap().default_team());
        let fallback = list.validate_team("teamNobody", &teams);
        assert_eq!(fallback, list.neutral_player().default_team());
        assert!(fallback.is_some());
    }

    #[test]
    fn team_deletion_purges_relationships() {
        let (mut list, mut teams) = build(&mut skirmish_sides(), &EngineConfig::default());
        let me = idx(&list, "ThePlayer");
        let enemy = idx(&list, "Enemy");
        let team = list.player(enemy).default_team().unwrap();

        list.team_about_to_be_deleted(team);
        teams.delete_team("teamEnemy");

        assert!(list.player(enemy).default_team().is_none());
        assert_eq!(list.player(me).relationship(Some(team)), Relationship::Neutral);
    }

    #[test]
    fn extra_side_teams_are_created() {
        let mut sides = skirmish_sides();
        sides.sides[2].teams = vec!["EnemyRaiders".into()];
        let (list, teams) = build(&mut sides, &EngineConfig::default());
        let raiders = teams.find_team("EnemyRaiders").unwrap();
        assert_eq!(teams.team_owner(raiders), Some(idx(&list, "Enemy")));
    }

    #[test]
    fn computer_players_get_ai_with_default_team() {
        let (list, _) = build(&mut skirmish_sides(), &EngineConfig::default());
        let enemy = list.find_by_name("Enemy").unwrap();
        let ai = enemy.ai().unwrap();
        assert_eq!(ai.managed_teams, vec![enemy.default_team().unwrap()]);
        assert!(list.find_by_name("ThePlayer").unwrap().ai().is_none());
    }

    #[test]
    fn campaign_force_resolves_human_slots() {
        let mut sides = SidesList::new();
        sides.push(side("", false, "", ""));
        sides.push(side("ThePlayer", false, "", ""));
        sides.push(side("player1", false, "", ""));
        sides.push(side("player2", false, "", ""));
        sides.push(side("player4", false, "", ""));
        let config = EngineConfig {
            campaign_force: true,
            ..EngineConfig::default()
        };
        let (list, _) = build(&mut sides, &config);
        let refs: Vec<String> = list
            .human_player_refs()
            .iter()
            .map(|&i| list.player(i).name_key().to_string())
            .collect();
        assert_eq!(refs, vec!["ThePlayer", "player1", "player2"]);
    }

    #[test]
    fn campaign_force_ignores_human_flag_for_local() {
        let mut sides = SidesList::new();
        sides.push(side("", false, "", ""));
        sides.push(side("AI", false, "", ""));
        sides.push(side("Human", true, "", ""));
        let config = EngineConfig {
            campaign_force: true,
            ..EngineConfig::default()
        };
        let (list, _) = build(&mut sides, &config);
        assert_eq!(list.local_player().name_key().as_str(), "AI");
    }

    #[test]
    fn campaign_shell_map_picks_first_human() {
        let mut sides = SidesList::new();
        sides.push(side("", false, "", ""));
        sides.push(side("AI", false, "", ""));
        sides.push(side("Human", true, "", ""));
        let (list, _) = build(&mut sides, &EngineConfig::default());
        assert_eq!(list.campaign_human_players(false), vec![idx(&list, "Human")]);
    }
}

//! Engine state management.
//!
//! Holds the pending side descriptors, the roster and its team factory, the
//! upgrade registry, and the upgrade-bearing objects spawned during a game.
//! Each `handle_*` method writes its protocol response to `out`; domain
//! failures are reported as `error <message>` lines and never end the session.

use std::io::Write;
use std::path::Path;

use log::{error, info, warn};
use serde::{Deserialize, Serialize};

use crate::config::EngineConfig;
use crate::protocol::side_line::{encode_side_line, parse_side_line};
use crate::roster::{
    load_sides, PlayerIndex, PlayerList, RelationshipFilter, RosterError, RosterSnapshot,
    SideParseError, SidesList, SnapshotError, TeamFactory, TeamTable,
};
use crate::upgrade::{
    load_templates_from_str, UpgradeCenter, UpgradeError, UpgradeHost, UpgradeModule,
    UpgradeModuleTemplate, UpgradeMuxSnapshot,
};

/// Failures reported back over the protocol.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error(transparent)]
    Roster(#[from] RosterError),

    #[error(transparent)]
    Snapshot(#[from] SnapshotError),

    #[error(transparent)]
    Sides(#[from] SideParseError),

    #[error(transparent)]
    Upgrade(#[from] UpgradeError),

    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("unknown upgrade module template '{0}'")]
    UnknownTemplate(String),

    #[error("snapshot carries {found} objects, game has {expected}")]
    ObjectCountMismatch { found: usize, expected: usize },

    #[error("snapshot object '{found}' does not match live object '{expected}'")]
    ObjectMismatch { found: String, expected: String },

    #[error("snapshot encoding error: {0}")]
    Encoding(#[from] serde_json::Error),
}

/// Module states of one spawned object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectSnapshot {
    pub name: String,
    pub modules: Vec<UpgradeMuxSnapshot>,
}

/// Everything a `snapshot` command captures: the roster plus the upgrade
/// state of every spawned object, in spawn order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameSnapshot {
    pub roster: RosterSnapshot,
    pub objects: Vec<ObjectSnapshot>,
}

/// Encodes a game snapshot as a single-line JSON record.
pub fn encode_snapshot(snapshot: &GameSnapshot) -> Result<String, EngineError> {
    Ok(serde_json::to_string(snapshot)?)
}

/// Decodes a snapshot produced by `encode_snapshot`.
pub fn decode_snapshot(s: &str) -> Result<GameSnapshot, EngineError> {
    Ok(serde_json::from_str(s)?)
}

/// Holds the mutable state of the engine between commands.
pub struct Engine {
    pub config: EngineConfig,
    pub sides: SidesList,
    pub roster: PlayerList,
    pub teams: TeamTable,
    pub upgrades: UpgradeCenter,
    templates: Vec<UpgradeModuleTemplate>,
    objects: Vec<UpgradeHost>,
}

impl Default for Engine {
    fn default() -> Self {
        Engine::new(EngineConfig::default())
    }
}

impl Engine {
    pub fn new(config: EngineConfig) -> Self {
        Engine {
            config,
            sides: SidesList::new(),
            roster: PlayerList::new(),
            teams: TeamTable::new(),
            upgrades: UpgradeCenter::new(),
            templates: Vec::new(),
            objects: Vec::new(),
        }
    }

    pub fn objects(&self) -> &[UpgradeHost] {
        &self.objects
    }

    /// Handles the handshake: writes id, options, protocol_version, and musterok.
    pub fn handle_muster<W: Write>(&self, out: &mut W) -> std::io::Result<()> {
        writeln!(out, "id name muster")?;
        writeln!(out, "id author muster")?;
        writeln!(
            out,
            "option name NetworkActive type check default {}",
            self.config.network_active
        )?;
        writeln!(
            out,
            "option name CampaignForce type check default {}",
            self.config.campaign_force
        )?;
        writeln!(
            out,
            "option name SkirmishSession type check default {}",
            self.config.skirmish_session
        )?;
        writeln!(out, "protocol_version 1")?;
        writeln!(out, "musterok")?;
        out.flush()
    }

    /// Handles the `isready` command.
    pub fn handle_isready<W: Write>(&self, out: &mut W) -> std::io::Result<()> {
        writeln!(out, "readyok")?;
        out.flush()
    }

    /// Sets an engine option. Unknown options and bad values are logged.
    pub fn set_option(&mut self, name: &str, value: Option<&str>) {
        if let Err(e) = self.config.set_option(name, value) {
            warn!("setoption: {}", e);
        }
    }

    pub fn clear_sides(&mut self) {
        self.sides.clear();
    }

    /// Appends a side given in side-line notation.
    pub fn add_side(&mut self, line: &str) -> Result<(), EngineError> {
        let side = parse_side_line(line)?;
        self.sides.push(side);
        Ok(())
    }

    /// Replaces the pending sides with the contents of a JSON sides file.
    pub fn load_sides(&mut self, path: &Path) -> Result<(), EngineError> {
        self.sides = load_sides(path)?;
        Ok(())
    }

    /// Registers upgrade module templates from a JSON file.
    pub fn load_upgrades(&mut self, path: &Path) -> Result<usize, EngineError> {
        let data = std::fs::read_to_string(path).map_err(|source| EngineError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let templates = load_templates_from_str(&data)?;
        let count = templates.len();
        for t in templates {
            self.templates.retain(|existing| existing.name != t.name);
            self.templates.push(t);
        }
        Ok(count)
    }

    pub fn handle_loadupgrades<W: Write>(&mut self, path: &Path, out: &mut W) -> std::io::Result<()> {
        match self.load_upgrades(path) {
            Ok(count) => writeln!(out, "loadupgradesok {}", count)?,
            Err(e) => report(out, &e)?,
        }
        out.flush()
    }

    /// Rebuilds the roster from the pending sides. Objects from the previous
    /// game are discarded.
    pub fn handle_newgame<W: Write>(&mut self, out: &mut W) -> std::io::Result<()> {
        self.objects.clear();
        match self.roster.new_game(&mut self.sides, &mut self.teams, &self.config) {
            Ok(()) => {
                let local = self.roster.local_player();
                info!(
                    "new game with {} players, local is '{}'",
                    self.roster.player_count(),
                    local.name_key()
                );
                writeln!(
                    out,
                    "newgame players {} local {}",
                    self.roster.player_count(),
                    local.name_key()
                )?;
            }
            Err(e) => report(out, &e.into())?,
        }
        out.flush()
    }

    /// Lists every active player, one per line.
    pub fn handle_players<W: Write>(&self, out: &mut W) -> std::io::Result<()> {
        for p in self.roster.players() {
            let team = p
                .default_team()
                .map(|t| t.to_string())
                .unwrap_or_else(|| "-".to_string());
            write!(
                out,
                "player {} {} {} mask {} team {}",
                p.index(),
                p.name_key(),
                p.player_type().name(),
                p.mask(),
                team
            )?;
            if p.is_local() {
                write!(out, " local")?;
            }
            writeln!(out)?;
        }
        writeln!(out, "playersok")?;
        out.flush()
    }

    /// Reports how player `a` regards player `b`.
    pub fn handle_relationship<W: Write>(&self, a: &str, b: &str, out: &mut W) -> std::io::Result<()> {
        let result = self
            .resolve_player(a)
            .and_then(|a| self.resolve_player(b).map(|b| (a, b)));
        match result {
            Ok((a, b)) => writeln!(out, "relationship {}", self.roster.relationship(a, b).name())?,
            Err(e) => report(out, &e)?,
        }
        out.flush()
    }

    /// Reports the mask of players matching `filter` relative to `source`.
    pub fn handle_mask<W: Write>(
        &self,
        source: usize,
        filter: RelationshipFilter,
        out: &mut W,
    ) -> std::io::Result<()> {
        match self.roster.get_players_with_relationship(source, filter) {
            Ok(mask) => writeln!(out, "mask {}", mask)?,
            Err(e) => report(out, &e.into())?,
        }
        out.flush()
    }

    pub fn snapshot(&self) -> GameSnapshot {
        GameSnapshot {
            roster: self.roster.snapshot(),
            objects: self
                .objects
                .iter()
                .map(|h| ObjectSnapshot {
                    name: h.name().to_string(),
                    modules: h.snapshot_modules(),
                })
                .collect(),
        }
    }

    /// Restores roster and object state. Every part is validated before
    /// anything is applied.
    pub fn restore(&mut self, snapshot: &GameSnapshot) -> Result<(), EngineError> {
        if snapshot.objects.len() != self.objects.len() {
            error!(
                "snapshot carries {} objects, game has {}",
                snapshot.objects.len(),
                self.objects.len()
            );
            return Err(EngineError::ObjectCountMismatch {
                found: snapshot.objects.len(),
                expected: self.objects.len(),
            });
        }
        for (host, record) in self.objects.iter().zip(&snapshot.objects) {
            if host.name() != record.name {
                return Err(EngineError::ObjectMismatch {
                    found: record.name.clone(),
                    expected: host.name().to_string(),
                });
            }
            host.check_modules(&record.modules)?;
        }

        self.roster.restore(&snapshot.roster)?;
        for (host, record) in self.objects.iter_mut().zip(&snapshot.objects) {
            host.restore_modules(&record.modules)?;
        }
        Ok(())
    }

    pub fn handle_snapshot<W: Write>(&self, out: &mut W) -> std::io::Result<()> {
        match encode_snapshot(&self.snapshot()) {
            Ok(s) => writeln!(out, "snapshot {}", s)?,
            Err(e) => report(out, &e)?,
        }
        out.flush()
    }

    pub fn handle_restore<W: Write>(&mut self, raw: &str, out: &mut W) -> std::io::Result<()> {
        let result = decode_snapshot(raw).and_then(|snap| self.restore(&snap));
        match result {
            Ok(()) => writeln!(out, "restoreok")?,
            Err(e) => report(out, &e)?,
        }
        out.flush()
    }

    /// Lists the pending sides in side-line notation.
    pub fn handle_sides<W: Write>(&self, out: &mut W) -> std::io::Result<()> {
        for side in &self.sides.sides {
            writeln!(out, "side {}", encode_side_line(side))?;
        }
        writeln!(out, "sidesok")?;
        out.flush()
    }

    /// Creates an object owned by `owner` carrying the named modules, then
    /// evaluates it against the owner's upgrades.
    pub fn handle_spawn<W: Write>(
        &mut self,
        owner: &str,
        object: &str,
        modules: &[String],
        out: &mut W,
    ) -> std::io::Result<()> {
        match self.spawn(owner, object, modules) {
            Ok(fired) => {
                for module in fired {
                    writeln!(out, "activated {} {}", object, module)?;
                }
                writeln!(out, "spawnok {}", object)?;
            }
            Err(e) => report(out, &e)?,
        }
        out.flush()
    }

    fn spawn(&mut self, owner: &str, object: &str, modules: &[String]) -> Result<Vec<String>, EngineError> {
        let owner = self.resolve_player(owner)?;
        let mut host = UpgradeHost::new(object, owner);
        for name in modules {
            let template = self
                .templates
                .iter()
                .find(|t| &t.name == name)
                .ok_or_else(|| EngineError::UnknownTemplate(name.clone()))?;
            let module = UpgradeModule::from_template(template, &mut self.upgrades)?;
            host.add_module(name, Box::new(module));
        }
        let fired = host.update_upgrade_modules(self.roster.player(owner).completed_upgrades());
        self.objects.push(host);
        Ok(fired)
    }

    /// Gives `player` an upgrade and re-evaluates every object it owns.
    pub fn handle_grant<W: Write>(&mut self, player: &str, upgrade: &str, out: &mut W) -> std::io::Result<()> {
        match self.grant(player, upgrade) {
            Ok(fired) => {
                for (object, module) in fired {
                    writeln!(out, "activated {} {}", object, module)?;
                }
                writeln!(out, "grantok")?;
            }
            Err(e) => report(out, &e)?,
        }
        out.flush()
    }

    fn grant(&mut self, player: &str, upgrade: &str) -> Result<Vec<(String, String)>, EngineError> {
        let index = self.resolve_player(player)?;
        let bit = self.upgrades.intern(upgrade)?;
        self.roster.player_mut(index).add_upgrades(bit);
        let held = self.roster.player(index).completed_upgrades();

        let mut fired = Vec::new();
        for host in self.objects.iter_mut().filter(|h| h.owner() == index) {
            for module in host.update_upgrade_modules(held) {
                fired.push((host.name().to_string(), module));
            }
        }
        Ok(fired)
    }

    /// Takes an upgrade from `player` and resets dependent modules.
    pub fn handle_revoke<W: Write>(&mut self, player: &str, upgrade: &str, out: &mut W) -> std::io::Result<()> {
        match self.revoke(player, upgrade) {
            Ok(reset) => {
                for (object, module) in reset {
                    writeln!(out, "reset {} {}", object, module)?;
                }
                writeln!(out, "revokeok")?;
            }
            Err(e) => report(out, &e)?,
        }
        out.flush()
    }

    fn revoke(&mut self, player: &str, upgrade: &str) -> Result<Vec<(String, String)>, EngineError> {
        let index = self.resolve_player(player)?;
        let bit = self
            .upgrades
            .mask_of(upgrade)
            .ok_or_else(|| UpgradeError::UnknownUpgrade(upgrade.to_string()))?;
        self.roster.player_mut(index).remove_upgrades(bit);

        let mut reset = Vec::new();
        for host in self.objects.iter_mut().filter(|h| h.owner() == index) {
            for module in host.reset_modules(bit) {
                reset.push((host.name().to_string(), module));
            }
        }
        Ok(reset)
    }

    /// Resolves a protocol player name; `-` is the neutral player.
    fn resolve_player(&self, name: &str) -> Result<PlayerIndex, EngineError> {
        let name = if name == "-" { "" } else { name };
        self.roster
            .find_by_name(name)
            .map(|p| p.index())
            .ok_or_else(|| RosterError::UnknownPlayerName(name.to_string()).into())
    }

    /// Looks up a team by owner or team name, falling back to neutral's.
    pub fn validate_team(&self, owner: &str) -> Option<crate::roster::TeamId> {
        self.roster.validate_team(owner, &self.teams as &dyn TeamFactory)
    }
}

fn report<W: Write>(out: &mut W, e: &EngineError) -> std::io::Result<()> {
    warn!("{}", e);
    writeln!(out, "error {}", e)
}

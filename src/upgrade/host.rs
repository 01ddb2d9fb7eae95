//! Upgrade-bearing objects.
//!
//! A host owns a set of `Upgradable` modules plus its own completed upgrade
//! mask. Whenever its upgrade set (or its owner's) changes, every module is
//! re-evaluated against the union of both masks.

use std::collections::BTreeSet;

use log::debug;

use super::mask::UpgradeMask;
use super::mux::{UpgradeContext, UpgradeMuxSnapshot, Upgradable};
use super::UpgradeError;
use crate::roster::PlayerIndex;

struct HostedModule {
    name: String,
    module: Box<dyn Upgradable>,
}

pub struct UpgradeHost {
    name: String,
    owner: PlayerIndex,
    upgrades: UpgradeMask,
    modules: Vec<HostedModule>,
    statuses: BTreeSet<String>,
    fx_log: Vec<String>,
}

impl UpgradeHost {
    pub fn new(name: &str, owner: PlayerIndex) -> Self {
        UpgradeHost {
            name: name.to_string(),
            owner,
            upgrades: UpgradeMask::EMPTY,
            modules: Vec::new(),
            statuses: BTreeSet::new(),
            fx_log: Vec::new(),
        }
    }

    pub fn add_module(&mut self, name: &str, module: Box<dyn Upgradable>) {
        self.modules.push(HostedModule {
            name: name.to_string(),
            module,
        });
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn owner(&self) -> PlayerIndex {
        self.owner
    }

    /// Upgrades held by the object itself.
    pub fn completed_upgrades(&self) -> UpgradeMask {
        self.upgrades
    }

    pub fn has_status(&self, status: &str) -> bool {
        self.statuses.contains(status)
    }

    pub fn statuses(&self) -> impl Iterator<Item = &str> {
        self.statuses.iter().map(String::as_str)
    }

    pub fn fx_log(&self) -> &[String] {
        &self.fx_log
    }

    /// Names and executed state of each module, in insertion order.
    pub fn module_states(&self) -> impl Iterator<Item = (&str, bool)> {
        self.modules
            .iter()
            .map(|m| (m.name.as_str(), m.module.is_already_upgraded()))
    }

    /// Attempts every module against `player_upgrades | object upgrades`.
    /// Returns the names of the modules that fired.
    pub fn update_upgrade_modules(&mut self, player_upgrades: UpgradeMask) -> Vec<String> {
        let key = player_upgrades | self.upgrades;
        let mut ctx = UpgradeContext::default();
        let mut fired = Vec::new();
        for hosted in self.modules.iter_mut() {
            if hosted.module.attempt_upgrade(key, &mut ctx) {
                debug!("{}: module {} activated", self.name, hosted.name);
                fired.push(hosted.name.clone());
            }
        }
        self.apply(ctx);
        fired
    }

    /// Adds object-level upgrades and re-evaluates modules.
    pub fn give_upgrade(&mut self, upgrades: UpgradeMask, player_upgrades: UpgradeMask) -> Vec<String> {
        self.upgrades.set(upgrades);
        self.update_upgrade_modules(player_upgrades)
    }

    /// Strips object-level upgrades and resets modules keyed on them.
    /// Returns the names of the modules that were reset.
    pub fn remove_upgrade(&mut self, upgrades: UpgradeMask) -> Vec<String> {
        self.upgrades.clear(upgrades);
        self.reset_modules(upgrades)
    }

    /// Resets every executed module whose activation set touches `upgrades`.
    pub fn reset_modules(&mut self, upgrades: UpgradeMask) -> Vec<String> {
        let mut reset = Vec::new();
        for hosted in self.modules.iter_mut() {
            if hosted.module.reset_upgrade(upgrades) {
                debug!("{}: module {} reset", self.name, hosted.name);
                reset.push(hosted.name.clone());
            }
        }
        reset
    }

    fn apply(&mut self, ctx: UpgradeContext) {
        self.fx_log.extend(ctx.fx);
        self.statuses.extend(ctx.granted);
        let removed = self.upgrades & ctx.removals;
        if removed.any() {
            self.remove_upgrade(removed);
        }
    }

    pub fn snapshot_modules(&self) -> Vec<UpgradeMuxSnapshot> {
        self.modules
            .iter()
            .map(|m| m.module.upgrade_mux().snapshot())
            .collect()
    }

    /// Checks that `snapshots` fit this host without applying them.
    pub fn check_modules(&self, snapshots: &[UpgradeMuxSnapshot]) -> Result<(), UpgradeError> {
        if snapshots.len() != self.modules.len() {
            return Err(UpgradeError::ModuleCountMismatch {
                found: snapshots.len(),
                expected: self.modules.len(),
            });
        }
        snapshots.iter().try_for_each(UpgradeMuxSnapshot::check_version)
    }

    /// Restores every module's mux state. Nothing changes on error.
    pub fn restore_modules(&mut self, snapshots: &[UpgradeMuxSnapshot]) -> Result<(), UpgradeError> {
        self.check_modules(snapshots)?;
        for (hosted, snap) in self.modules.iter_mut().zip(snapshots) {
            hosted.module.upgrade_mux_mut().restore(snap)?;
        }
        Ok(())
    }
}

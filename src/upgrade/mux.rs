//! Upgrade activation mux and the `Upgradable` capability.
//!
//! A mux decides, from the upgrade mask its owner currently holds, whether
//! a one-shot upgrade effect should fire. Activation can require all of the
//! trigger upgrades or any one of them; holding any conflicting upgrade
//! blocks it. Once fired, the mux stays executed until reset.

use log::warn;
use serde::{Deserialize, Serialize};

use super::mask::UpgradeMask;
use super::UpgradeError;

/// Current mux snapshot version.
pub const UPGRADE_MUX_SNAPSHOT_VERSION: u8 = 1;

/// Persisted mux state. Masks come from template data and are not saved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpgradeMuxSnapshot {
    pub version: u8,
    pub executed: bool,
}

impl UpgradeMuxSnapshot {
    /// Fails unless this build can read the snapshot's version.
    pub fn check_version(&self) -> Result<(), UpgradeError> {
        if self.version == 0 || self.version > UPGRADE_MUX_SNAPSHOT_VERSION {
            return Err(UpgradeError::UnsupportedVersion {
                found: self.version,
                current: UPGRADE_MUX_SNAPSHOT_VERSION,
            });
        }
        Ok(())
    }
}

/// Activation state for one upgrade-bearing capability.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UpgradeMux {
    activation: UpgradeMask,
    conflicting: UpgradeMask,
    removes: UpgradeMask,
    requires_all: bool,
    executed: bool,
    upgrading: bool,
}

impl UpgradeMux {
    pub fn new(activation: UpgradeMask, conflicting: UpgradeMask, requires_all: bool) -> Self {
        UpgradeMux {
            activation,
            conflicting,
            requires_all,
            ..UpgradeMux::default()
        }
    }

    /// Sets the upgrades to strip from the owner when this one fires.
    pub fn with_removals(mut self, removes: UpgradeMask) -> Self {
        self.removes = removes;
        self
    }

    /// Returns `(activation, conflicting)`.
    pub fn activation_masks(&self) -> (UpgradeMask, UpgradeMask) {
        (self.activation, self.conflicting)
    }

    pub fn removal_mask(&self) -> UpgradeMask {
        self.removes
    }

    pub fn requires_all_activation_upgrades(&self) -> bool {
        self.requires_all
    }

    pub fn is_already_upgraded(&self) -> bool {
        self.executed
    }

    /// True while the upgrade's side effects are running.
    pub fn is_upgrading(&self) -> bool {
        self.upgrading
    }

    fn triggers_met(&self, key: UpgradeMask) -> bool {
        if self.requires_all {
            key.test_for_all(self.activation)
        } else {
            key.test_for_any(self.activation)
        }
    }

    /// Whether `key` should fire this upgrade now.
    ///
    /// Never true once executed or while firing. An upgrade with no triggers
    /// never fires on its own.
    pub fn would_upgrade(&self, key: UpgradeMask) -> bool {
        if self.executed || self.upgrading {
            return false;
        }
        if !self.activation.any() || !key.any() {
            return false;
        }
        if key.test_for_any(self.conflicting) {
            return false;
        }
        self.triggers_met(key)
    }

    /// Whether `key` currently qualifies, ignoring executed state.
    ///
    /// Conflicts only count when `key` is non-empty, and an upgrade with no
    /// triggers qualifies whenever it is not blocked.
    pub fn test_upgrade_conditions(&self, key: UpgradeMask) -> bool {
        if key.any() && key.test_for_any(self.conflicting) {
            return false;
        }
        if !self.activation.any() {
            return true;
        }
        self.triggers_met(key)
    }

    /// Returns an executed mux to inactive, provided `key` still touches the
    /// activation set.
    pub fn reset_upgrade(&mut self, key: UpgradeMask) -> bool {
        if self.executed && key.test_for_any(self.activation) {
            self.executed = false;
            return true;
        }
        false
    }

    /// Enters the firing state. False if already executed or firing.
    pub(crate) fn begin_upgrade(&mut self) -> bool {
        if self.executed || self.upgrading {
            return false;
        }
        self.upgrading = true;
        true
    }

    pub(crate) fn finish_upgrade(&mut self) {
        self.upgrading = false;
        self.executed = true;
    }

    pub fn snapshot(&self) -> UpgradeMuxSnapshot {
        UpgradeMuxSnapshot {
            version: UPGRADE_MUX_SNAPSHOT_VERSION,
            executed: self.executed,
        }
    }

    pub fn restore(&mut self, snapshot: &UpgradeMuxSnapshot) -> Result<(), UpgradeError> {
        snapshot.check_version()?;
        self.executed = snapshot.executed;
        self.upgrading = false;
        Ok(())
    }
}

/// Side effects requested by upgrades while they fire.
///
/// The host applies them after every module has been evaluated.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UpgradeContext {
    /// Upgrades to strip from the owner.
    pub removals: UpgradeMask,
    /// Statuses granted by upgrade implementations.
    pub granted: Vec<String>,
    /// Presentation cues to play.
    pub fx: Vec<String>,
}

impl UpgradeContext {
    pub fn request_removal(&mut self, upgrades: UpgradeMask) {
        self.removals.set(upgrades);
    }

    pub fn grant(&mut self, status: &str) {
        self.granted.push(status.to_string());
    }

    pub fn play_fx(&mut self, fx: &str) {
        self.fx.push(fx.to_string());
    }
}

/// A capability that fires a one-shot upgrade effect.
///
/// Implementors expose their `UpgradeMux` and the upgrade implementation;
/// evaluation and the firing sequence are provided.
pub trait Upgradable {
    fn upgrade_mux(&self) -> &UpgradeMux;

    fn upgrade_mux_mut(&mut self) -> &mut UpgradeMux;

    /// The upgrade's own effect.
    fn upgrade_implementation(&mut self, ctx: &mut UpgradeContext);

    fn perform_upgrade_fx(&mut self, _ctx: &mut UpgradeContext) {}

    /// Removes mutually exclusive upgrades. Runs before the implementation.
    fn process_upgrade_removal(&mut self, ctx: &mut UpgradeContext) {
        let removes = self.upgrade_mux().removal_mask();
        if removes.any() {
            ctx.request_removal(removes);
        }
    }

    fn is_already_upgraded(&self) -> bool {
        self.upgrade_mux().is_already_upgraded()
    }

    fn would_upgrade(&self, key: UpgradeMask) -> bool {
        self.upgrade_mux().would_upgrade(key)
    }

    fn test_upgrade_conditions(&self, key: UpgradeMask) -> bool {
        self.upgrade_mux().test_upgrade_conditions(key)
    }

    /// Fires the upgrade if `key` satisfies the mux. Returns true if it fired.
    fn attempt_upgrade(&mut self, key: UpgradeMask, ctx: &mut UpgradeContext) -> bool {
        if !self.would_upgrade(key) {
            return false;
        }
        self.give_self_upgrade(ctx)
    }

    /// Runs FX, removals, then the implementation, and only then marks the
    /// mux executed. The implementation therefore still sees
    /// `is_already_upgraded() == false`. Nested attempts on the same mux
    /// while this runs are refused.
    fn give_self_upgrade(&mut self, ctx: &mut UpgradeContext) -> bool {
        if !self.upgrade_mux_mut().begin_upgrade() {
            warn!("upgrade already executed or firing; refusing nested activation");
            return false;
        }
        self.perform_upgrade_fx(ctx);
        self.process_upgrade_removal(ctx);
        self.upgrade_implementation(ctx);
        self.upgrade_mux_mut().finish_upgrade();
        true
    }

    fn reset_upgrade(&mut self, key: UpgradeMask) -> bool {
        self.upgrade_mux_mut().reset_upgrade(key)
    }

    /// Re-runs the implementation of an already executed upgrade.
    fn force_refresh_upgrade(&mut self, ctx: &mut UpgradeContext) {
        if self.is_already_upgraded() {
            self.upgrade_implementation(ctx);
        }
    }
}

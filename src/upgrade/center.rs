//! Upgrade name registry.
//!
//! Templates refer to upgrades by name; the center assigns each distinct
//! name one bit of `UpgradeMask` in registration order.

use super::mask::{UpgradeMask, UPGRADE_MAX_COUNT};
use super::UpgradeError;

#[derive(Debug, Clone, Default)]
pub struct UpgradeCenter {
    names: Vec<String>,
}

impl UpgradeCenter {
    pub fn new() -> Self {
        UpgradeCenter::default()
    }

    /// Returns the bit for `name`, registering it if needed.
    pub fn intern(&mut self, name: &str) -> Result<UpgradeMask, UpgradeError> {
        if let Some(mask) = self.mask_of(name) {
            return Ok(mask);
        }
        let mask = UpgradeMask::bit(self.names.len()).ok_or(UpgradeError::TooManyUpgrades {
            max: UPGRADE_MAX_COUNT,
        })?;
        self.names.push(name.to_string());
        Ok(mask)
    }

    /// Returns the bit for an already registered `name`.
    pub fn mask_of(&self, name: &str) -> Option<UpgradeMask> {
        let pos = self.names.iter().position(|n| n == name)?;
        UpgradeMask::bit(pos)
    }

    /// Interns every name and returns the union of their bits.
    pub fn intern_all(&mut self, names: &[String]) -> Result<UpgradeMask, UpgradeError> {
        let mut mask = UpgradeMask::EMPTY;
        for name in names {
            mask.set(self.intern(name)?);
        }
        Ok(mask)
    }

    /// Looks up every name; unregistered names are an error.
    pub fn lookup_all(&self, names: &[String]) -> Result<UpgradeMask, UpgradeError> {
        let mut mask = UpgradeMask::EMPTY;
        for name in names {
            let bit = self
                .mask_of(name)
                .ok_or_else(|| UpgradeError::UnknownUpgrade(name.clone()))?;
            mask.set(bit);
        }
        Ok(mask)
    }

    /// Names of the upgrades in `mask`, in registration order.
    pub fn names_in(&self, mask: UpgradeMask) -> Vec<&str> {
        mask.indices()
            .filter_map(|i| self.names.get(i).map(String::as_str))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

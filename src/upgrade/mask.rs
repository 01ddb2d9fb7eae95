//! Upgrade bitsets.
//!
//! An `UpgradeMask` records which upgrades an entity currently holds. Each
//! registered upgrade owns one bit; a player's or object's completed set is
//! the union of those bits.

use std::fmt;
use std::ops::{BitAnd, BitOr, BitOrAssign};

use serde::{Deserialize, Serialize};

/// The maximum number of distinct upgrades that can be registered.
pub const UPGRADE_MAX_COUNT: usize = 128;

/// A set of upgrades, one bit per registered upgrade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UpgradeMask(u128);

impl UpgradeMask {
    /// The empty set.
    pub const EMPTY: UpgradeMask = UpgradeMask(0);

    /// Creates a mask from raw bits.
    pub const fn from_bits(bits: u128) -> Self {
        UpgradeMask(bits)
    }

    /// Returns the mask holding only the upgrade at `index`, or None if the
    /// index is past `UPGRADE_MAX_COUNT`.
    pub fn bit(index: usize) -> Option<Self> {
        if index >= UPGRADE_MAX_COUNT {
            return None;
        }
        Some(UpgradeMask(1u128 << index))
    }

    /// Returns the raw bits.
    pub const fn bits(self) -> u128 {
        self.0
    }

    /// True if at least one upgrade is present.
    pub const fn any(self) -> bool {
        self.0 != 0
    }

    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// True if this mask shares at least one bit with `other`.
    pub const fn test_for_any(self, other: UpgradeMask) -> bool {
        self.0 & other.0 != 0
    }

    /// True if every bit of `other` is present in this mask.
    ///
    /// An empty `other` is trivially contained.
    pub const fn test_for_all(self, other: UpgradeMask) -> bool {
        self.0 & other.0 == other.0
    }

    /// Adds every upgrade in `other`.
    pub fn set(&mut self, other: UpgradeMask) {
        self.0 |= other.0;
    }

    /// Removes every upgrade in `other`.
    pub fn clear(&mut self, other: UpgradeMask) {
        self.0 &= !other.0;
    }

    /// Number of upgrades held.
    pub const fn count(self) -> u32 {
        self.0.count_ones()
    }

    /// Iterates the bit indices present in the mask, lowest first.
    pub fn indices(self) -> impl Iterator<Item = usize> {
        (0..UPGRADE_MAX_COUNT).filter(move |&i| self.0 & (1u128 << i) != 0)
    }
}

impl BitOr for UpgradeMask {
    type Output = UpgradeMask;

    fn bitor(self, rhs: UpgradeMask) -> UpgradeMask {
        UpgradeMask(self.0 | rhs.0)
    }
}

impl BitOrAssign for UpgradeMask {
    fn bitor_assign(&mut self, rhs: UpgradeMask) {
        self.0 |= rhs.0;
    }
}

impl BitAnd for UpgradeMask {
    type Output = UpgradeMask;

    fn bitand(self, rhs: UpgradeMask) -> UpgradeMask {
        UpgradeMask(self.0 & rhs.0)
    }
}

impl fmt::Display for UpgradeMask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#x}", self.0)
    }
}

//! Upgrade activation.
//!
//! Upgrade masks, the activation mux and its `Upgradable` capability,
//! template-driven modules, and the hosts that re-evaluate them.

pub mod center;
pub mod host;
pub mod mask;
pub mod module;
pub mod mux;

pub use center::UpgradeCenter;
pub use host::UpgradeHost;
pub use mask::{UpgradeMask, UPGRADE_MAX_COUNT};
pub use module::{load_templates_from_str, UpgradeModule, UpgradeModuleTemplate};
pub use mux::{
    Upgradable, UpgradeContext, UpgradeMux, UpgradeMuxSnapshot, UPGRADE_MUX_SNAPSHOT_VERSION,
};

/// Errors raised by the upgrade subsystem.
#[derive(Debug, thiserror::Error)]
pub enum UpgradeError {
    #[error("too many upgrades registered (max {max})")]
    TooManyUpgrades { max: usize },

    #[error("unknown upgrade '{0}'")]
    UnknownUpgrade(String),

    #[error("unsupported upgrade mux snapshot version {found} (current is {current})")]
    UnsupportedVersion { found: u8, current: u8 },

    #[error("snapshot carries {found} module records, host has {expected}")]
    ModuleCountMismatch { found: usize, expected: usize },

    #[error("failed to parse upgrade templates: {0}")]
    Json(#[from] serde_json::Error),
}

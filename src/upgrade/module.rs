//! Template-driven upgrade modules.
//!
//! An `UpgradeModule` is the stock `Upgradable` component: its triggers,
//! conflicts, and removals come from an `UpgradeModuleTemplate`, and when it
//! fires it grants a named status to its host.

use serde::Deserialize;

use super::center::UpgradeCenter;
use super::mux::{UpgradeContext, UpgradeMux, Upgradable};
use super::UpgradeError;

/// Static data describing one upgrade module.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct UpgradeModuleTemplate {
    pub name: String,
    pub triggered_by: Vec<String>,
    pub conflicts_with: Vec<String>,
    pub removes_upgrades: Vec<String>,
    pub requires_all_triggers: bool,
    pub fx: Option<String>,
    pub grants_status: Option<String>,
}

/// Parses a JSON array of module templates.
pub fn load_templates_from_str(json: &str) -> Result<Vec<UpgradeModuleTemplate>, UpgradeError> {
    Ok(serde_json::from_str(json)?)
}

#[derive(Debug, Clone)]
pub struct UpgradeModule {
    name: String,
    mux: UpgradeMux,
    fx: Option<String>,
    grants_status: Option<String>,
}

impl UpgradeModule {
    /// Builds a module, registering every upgrade name the template mentions.
    pub fn from_template(
        template: &UpgradeModuleTemplate,
        center: &mut UpgradeCenter,
    ) -> Result<Self, UpgradeError> {
        let activation = center.intern_all(&template.triggered_by)?;
        let conflicting = center.intern_all(&template.conflicts_with)?;
        let removes = center.intern_all(&template.removes_upgrades)?;
        Ok(UpgradeModule {
            name: template.name.clone(),
            mux: UpgradeMux::new(activation, conflicting, template.requires_all_triggers)
                .with_removals(removes),
            fx: template.fx.clone(),
            grants_status: template.grants_status.clone(),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl Upgradable for UpgradeModule {
    fn upgrade_mux(&self) -> &UpgradeMux {
        &self.mux
    }

    fn upgrade_mux_mut(&mut self) -> &mut UpgradeMux {
        &mut self.mux
    }

    fn perform_upgrade_fx(&mut self, ctx: &mut UpgradeContext) {
        if let Some(fx) = &self.fx {
            ctx.play_fx(fx);
        }
    }

    fn upgrade_implementation(&mut self, ctx: &mut UpgradeContext) {
        if let Some(status) = &self.grants_status {
            ctx.grant(status);
        }
    }
}

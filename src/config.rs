//! Engine configuration.
//!
//! Settings come from an optional JSON file given with `--config` and can be
//! overridden at runtime with `setoption`. The roster receives them by
//! reference at rebuild time rather than reading process-wide state.

use std::fs;
use std::path::Path;

use serde::Deserialize;

/// Errors raised while loading or updating configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("unknown option '{0}'")]
    UnknownOption(String),

    #[error("invalid value '{value}' for option '{name}'")]
    InvalidValue { name: String, value: String },
}

/// Session-level settings that influence roster construction.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// A network session is running; local-player selection is then left to
    /// the explicit `multiplayerIsLocal` flag.
    pub network_active: bool,
    /// Campaign maps are being played as skirmish; human slots are resolved
    /// by naming convention instead of the `playerIsHuman` flag.
    pub campaign_force: bool,
    /// The map was loaded through a skirmish/network lobby (as opposed to a
    /// shell map). Only consulted when `campaign_force` is set.
    pub skirmish_session: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            network_active: false,
            campaign_force: false,
            skirmish_session: true,
        }
    }
}

impl EngineConfig {
    /// Applies a `setoption` pair. A missing value means "true".
    pub fn set_option(&mut self, name: &str, value: Option<&str>) -> Result<(), ConfigError> {
        let field = match name {
            "NetworkActive" => &mut self.network_active,
            "CampaignForce" => &mut self.campaign_force,
            "SkirmishSession" => &mut self.skirmish_session,
            other => return Err(ConfigError::UnknownOption(other.to_string())),
        };
        *field = match value {
            None => true,
            Some(v) => parse_flag(v).ok_or_else(|| ConfigError::InvalidValue {
                name: name.to_string(),
                value: v.to_string(),
            })?,
        };
        Ok(())
    }
}

fn parse_flag(s: &str) -> Option<bool> {
    match s {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Parses configuration from a JSON string. Missing fields take defaults.
pub fn load_config_from_str(json: &str) -> Result<EngineConfig, ConfigError> {
    Ok(serde_json::from_str(json)?)
}

/// Loads configuration from a JSON file.
pub fn load_config(path: &Path) -> Result<EngineConfig, ConfigError> {
    let data = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.display().to_string(),
        source,
    })?;
    load_config_from_str(&data)
}

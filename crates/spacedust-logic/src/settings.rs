//! Session-wide settings.
//!
//! Every field has a default, so a settings document only needs the keys it
//! wants to change and an empty document `{}` is valid.

use serde::{Deserialize, Serialize};

use crate::CatalogError;

/// Tunables shared by every subsystem of a session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Settings {
    /// Multiplier applied to every declared altitude bound and jitter range.
    pub game_scale: f64,
    /// Discovery reward used by bands that do not declare their own.
    pub base_discover_science_reward: f64,
    /// Identification reward used by bands that do not declare their own.
    pub base_identify_science_reward: f64,
    /// Global multiplier on telescope survey rates.
    pub base_telescope_discover_rate: f64,
    /// Debug override: every band reports as discovered.
    pub reveal_all_discovered: bool,
    /// Debug override: every band reports as identified.
    pub reveal_all_identified: bool,
    /// Whether the game mode awards science (false in sandbox).
    pub rewards_science: bool,
    /// Game seconds between background ticks for unloaded vessels.
    pub background_interval: f64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            game_scale: 1.0,
            base_discover_science_reward: 1.0,
            base_identify_science_reward: 1.0,
            base_telescope_discover_rate: 1.0,
            reveal_all_discovered: false,
            reveal_all_identified: false,
            rewards_science: true,
            background_interval: 1.0,
        }
    }
}

impl Settings {
    /// Parse settings from JSON; missing keys keep their defaults.
    pub fn from_json(json: &str) -> Result<Self, CatalogError> {
        let settings: Settings = serde_json::from_str(json)?;
        log::debug!("Loaded settings: {:?}", settings);
        Ok(settings)
    }
}

// Sempred - Semantic Predicate Evaluator
// Copyright (C) 2024 Zhuo Zhang and Wuqi Zhang
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program. If not, see <https://www.gnu.org/licenses/>.

//! Predicate evaluation settings.

use std::{
    env, fs,
    path::{Path, PathBuf},
};

use eyre::{Result, WrapErr};
use sempred_common::env::{SEMPRED_CONFIG, SEMPRED_PREDICATES};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// File looked up in the working directory when [`SEMPRED_CONFIG`] is unset.
pub const DEFAULT_CONFIG_FILE: &str = "sempred.toml";

/// How a session answers decision points.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PredicateConfig {
    /// Evaluate predicates at all
    pub enabled: bool,
    /// Decision reported for every predicate while evaluation is disabled
    pub disabled_value: bool,
    /// Decision reported when a predicate fails to evaluate
    pub fallback_value: bool,
}

impl Default for PredicateConfig {
    fn default() -> Self {
        Self { enabled: true, disabled_value: true, fallback_value: true }
    }
}

impl PredicateConfig {
    /// Path of the configuration file to use, if any.
    ///
    /// [`SEMPRED_CONFIG`] wins; otherwise `sempred.toml` in the working directory
    /// if it exists.
    pub fn config_path() -> Option<PathBuf> {
        if let Ok(path) = env::var(SEMPRED_CONFIG) {
            return Some(PathBuf::from(path));
        }
        let local = PathBuf::from(DEFAULT_CONFIG_FILE);
        local.exists().then_some(local)
    }

    /// Load the configuration from the default location, then apply environment
    /// overrides. Missing files yield the defaults.
    pub fn load() -> Result<Self> {
        let mut config = match Self::config_path() {
            Some(path) => Self::load_from(&path)?,
            None => {
                debug!("No predicate configuration file, using defaults");
                Self::default()
            }
        };
        config.apply_env_overrides();
        Ok(config)
    }

    /// Load the configuration from a TOML file.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Self = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file as TOML: {}", path.display()))?;

        debug!("Loaded predicate configuration from {}", path.display());
        Ok(config)
    }

    /// Save the configuration as pretty TOML.
    pub fn save(&self, path: &Path) -> Result<()> {
        let content =
            toml::to_string_pretty(self).wrap_err("Failed to serialize config to TOML")?;

        fs::write(path, content)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        debug!("Saved predicate configuration to {}", path.display());
        Ok(())
    }

    /// Apply [`SEMPRED_PREDICATES`] on top of the loaded settings.
    pub fn apply_env_overrides(&mut self) {
        let Ok(value) = env::var(SEMPRED_PREDICATES) else {
            return;
        };
        match parse_switch(&value) {
            Some(enabled) => {
                debug!("{SEMPRED_PREDICATES}={value} sets predicate evaluation enabled={enabled}");
                self.enabled = enabled;
            }
            None => warn!("Ignoring {SEMPRED_PREDICATES}={value}: expected on/off/true/false/1/0"),
        }
    }
}

fn parse_switch(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "on" | "true" | "1" => Some(true),
        "off" | "false" | "0" => Some(false),
        _ => None,
    }
}

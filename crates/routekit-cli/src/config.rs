//! Configuration file support for the RouteKit CLI

use routekit_core::{Error, Result, ValidationError};
use routekit_routing::UriConstraintSet;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CliConfig {
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Named constraint presets usable with `apply --preset`
    #[serde(default)]
    pub constraints: HashMap<String, UriConstraintSet>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl CliConfig {
    /// Load configuration from a TOML or YAML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)?;

        let config = if path.extension().and_then(|s| s.to_str()) == Some("toml") {
            toml::from_str(&contents)
                .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))?
        } else {
            // Default to YAML
            serde_yaml::from_str(&contents)
                .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))?
        };
        Ok(config)
    }

    /// Apply environment variable overrides
    pub fn merge_env(&mut self) {
        if let Ok(val) = std::env::var("ROUTEKIT_LOG_LEVEL") {
            self.logging.level = val;
        }
    }

    pub fn constraint_preset(&self, name: &str) -> std::result::Result<&UriConstraintSet, ValidationError> {
        self.constraints
            .get(name)
            .ok_or_else(|| ValidationError::UnknownConfigurationPath(format!("constraints.{}", name)))
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

//! Engine configuration loaded from TOML.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Warden configuration.
///
/// ```toml
/// name = "billing"
/// log_denials = false
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Label recorded on every evaluation span, to tell engines apart.
    #[serde(default = "default_name")]
    pub name: String,

    /// Log enforcement denials at `warn` instead of `debug`.
    #[serde(default = "default_log_denials")]
    pub log_denials: bool,
}

fn default_name() -> String {
    "warden".to_string()
}

fn default_log_denials() -> bool {
    true
}

impl Default for Config {
    fn default() -> Self {
        Self {
            name: default_name(),
            log_denials: default_log_denials(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::parse(&content)
    }

    /// Parse configuration from TOML string.
    pub fn parse(toml: &str) -> Result<Self> {
        toml::from_str(toml).map_err(|e| Error::Config(e.to_string()))
    }
}

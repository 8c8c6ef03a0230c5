//! Registry configuration via `importer.toml`
//!
//! Every field has a default, so an empty file (or no file) is valid.

use serde::{Deserialize, Serialize};
use std::path::Path;
use txinflow_core::{Error, Result};

/// Config file name looked up by [`ImporterConfig::load`] callers.
pub const CONFIG_FILE_NAME: &str = "importer.toml";

/// Import registry configuration loaded from `importer.toml`.
///
/// # Example
///
/// ```toml
/// # Timeout used by import_transaction_default (0 = no timeout)
/// default_timeout_secs = 0
///
/// # Pre-sized slot map
/// initial_capacity = 1024
///
/// # Slot map shard count, power of two greater than 1
/// # shard_amount = 64
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct ImporterConfig {
    /// Timeout applied when an import does not carry one.
    #[serde(default)]
    pub default_timeout_secs: u32,
    /// Initial capacity of the slot map.
    #[serde(default)]
    pub initial_capacity: usize,
    /// Shard count of the slot map; dashmap's default when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shard_amount: Option<usize>,
}

impl ImporterConfig {
    /// Parse a config from TOML text and validate it.
    pub fn from_toml_str(s: &str) -> Result<Self> {
        let config: ImporterConfig = toml::from_str(s)
            .map_err(|e| Error::Config(format!("Failed to parse {}: {}", CONFIG_FILE_NAME, e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Read and parse a config file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Check field constraints.
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` if `shard_amount` is set and is not a power
    /// of two greater than 1.
    pub fn validate(&self) -> Result<()> {
        if let Some(shards) = self.shard_amount {
            if shards <= 1 || !shards.is_power_of_two() {
                return Err(Error::Config(format!(
                    "shard_amount must be a power of two greater than 1, got {}",
                    shards
                )));
            }
        }
        Ok(())
    }

    /// Serialize to TOML text.
    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string(self).map_err(|e| Error::Config(e.to_string()))
    }
}

//! # Store Configuration
//!
//! Sizing knobs for tables and pools, loaded once at startup from TOML.
//!
//! ```toml
//! [table]
//! reserve_pages = 4
//! id_limit = 65536
//!
//! [pool]
//! reserve_nodes = 256
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{StoreError, StoreResult};
use crate::handle::INVALID_ID;

/// Object table settings.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TableConfig {
    /// Page headers reserved up front.
    pub reserve_pages: u32,
    /// Exclusive upper bound on slot ids. `None` uses the whole 26-bit space.
    pub id_limit: Option<u32>,
}

impl TableConfig {
    /// Returns the effective id limit.
    #[inline]
    #[must_use]
    pub fn effective_id_limit(&self) -> u32 {
        self.id_limit.unwrap_or(INVALID_ID)
    }
}

/// Pooled list settings.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PoolConfig {
    /// Nodes reserved when a pool is created.
    pub reserve_nodes: u32,
}

/// Top-level store configuration.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Object table settings.
    pub table: TableConfig,
    /// Pooled list settings.
    pub pool: PoolConfig,
}

impl StoreConfig {
    /// Parses and validates a configuration from TOML text.
    ///
    /// # Errors
    ///
    /// Returns an error if the text is not valid TOML or values are out of range.
    pub fn from_toml_str(text: &str) -> StoreResult<Self> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Loads and validates a configuration file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: impl AsRef<Path>) -> StoreResult<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        let config = Self::from_toml_str(&text)?;
        tracing::debug!(path = %path.as_ref().display(), ?config, "store configuration loaded");
        Ok(config)
    }

    /// Checks that every value is in range.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::InvalidConfig`] describing the first bad value.
    pub fn validate(&self) -> StoreResult<()> {
        if let Some(limit) = self.table.id_limit {
            if limit == 0 {
                return Err(StoreError::InvalidConfig(
                    "table.id_limit must be greater than zero".into(),
                ));
            }
            if limit > INVALID_ID {
                return Err(StoreError::InvalidConfig(format!(
                    "table.id_limit {limit} exceeds the id space ({INVALID_ID})"
                )));
            }
        }
        Ok(())
    }
}

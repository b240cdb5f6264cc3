//! # Pool Configuration
//!
//! Pool sizing is loaded once at startup, either from a preset or from a
//! TOML file:
//!
//! ```toml
//! capacity = 4096
//! ```

use crate::error::{PoolError, PoolResult};
use crate::list::NODE_SIZE;
use serde::Deserialize;
use std::path::Path;

/// Configuration for a pool allocator (and for a list that owns one).
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PoolConfig {
    /// Arena size in bytes.
    pub capacity: usize,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            // 256 list nodes
            capacity: 4096,
        }
    }
}

impl PoolConfig {
    /// Small arena for constrained targets.
    #[must_use]
    pub const fn embedded() -> Self {
        Self { capacity: 1024 }
    }

    /// Arena sized to hold exactly `nodes` list nodes.
    #[must_use]
    pub const fn for_nodes(nodes: usize) -> Self {
        Self {
            capacity: nodes.saturating_mul(NODE_SIZE),
        }
    }

    /// Parses and validates a configuration from TOML text.
    ///
    /// # Errors
    ///
    /// Returns [`PoolError::InvalidConfig`] on malformed TOML, unknown keys,
    /// or a zero capacity.
    pub fn from_toml_str(text: &str) -> PoolResult<Self> {
        let config: Self =
            toml::from_str(text).map_err(|e| PoolError::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Reads a TOML configuration file.
    ///
    /// # Errors
    ///
    /// Returns [`PoolError::InvalidConfig`] if the file cannot be read or
    /// does not parse.
    pub fn load(path: impl AsRef<Path>) -> PoolResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| PoolError::InvalidConfig(format!("{}: {e}", path.display())))?;
        Self::from_toml_str(&text)
    }

    /// Checks the configuration for values the pool cannot use.
    ///
    /// # Errors
    ///
    /// Returns [`PoolError::InvalidConfig`] if `capacity` is zero.
    pub fn validate(&self) -> PoolResult<()> {
        if self.capacity == 0 {
            return Err(PoolError::InvalidConfig("capacity must be greater than zero".into()));
        }
        Ok(())
    }
}

//! Config - Quantization Configuration
//!
//! Partitioning knobs for the quantization stages. The parallelism degree of
//! the min/max reduction is an explicit value here rather than a global
//! constant. Configs can be loaded from and saved to TOML.
//!
//! @version 0.1.0
//! @author AutomataNexus Development Team

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{QuantError, QuantResult};

// =============================================================================
// Defaults
// =============================================================================

/// Default upper bound on the number of min/max accumulator blocks.
pub const DEFAULT_MAX_MINMAX_BLOCKS: usize = 32;

/// Default min/max granularity; one vector-kernel pass handles this many floats.
pub const DEFAULT_MINMAX_GRANULARITY: usize = 128;

/// Default number of elements per quantization block.
pub const DEFAULT_BLOCK_SIZE: usize = 128;

fn default_max_minmax_blocks() -> usize {
    DEFAULT_MAX_MINMAX_BLOCKS
}

fn default_minmax_granularity() -> usize {
    DEFAULT_MINMAX_GRANULARITY
}

fn default_block_size() -> usize {
    DEFAULT_BLOCK_SIZE
}

// =============================================================================
// QuantConfig
// =============================================================================

/// Partitioning configuration for quantization (qlinear.toml).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuantConfig {
    /// Maximum number of blocks (and accumulator slots) in a min/max reduction.
    #[serde(default = "default_max_minmax_blocks")]
    pub max_minmax_blocks: usize,

    /// Min/max block sizes are rounded up to a multiple of this.
    #[serde(default = "default_minmax_granularity")]
    pub minmax_granularity: usize,

    /// Elements per parallel quantization unit. Must be even.
    #[serde(default = "default_block_size")]
    pub block_size: usize,
}

impl Default for QuantConfig {
    fn default() -> Self {
        Self {
            max_minmax_blocks: DEFAULT_MAX_MINMAX_BLOCKS,
            minmax_granularity: DEFAULT_MINMAX_GRANULARITY,
            block_size: DEFAULT_BLOCK_SIZE,
        }
    }
}

impl QuantConfig {
    /// Checks that every value is usable.
    pub fn validate(&self) -> QuantResult<()> {
        if self.max_minmax_blocks == 0 {
            return Err(QuantError::InvalidConfig(
                "max_minmax_blocks must be at least 1".to_string(),
            ));
        }
        if self.minmax_granularity == 0 {
            return Err(QuantError::InvalidConfig(
                "minmax_granularity must be at least 1".to_string(),
            ));
        }
        // packed 4-bit blocks must own whole bytes
        if self.block_size == 0 || self.block_size % 2 != 0 {
            return Err(QuantError::InvalidBlockSize(self.block_size));
        }
        Ok(())
    }

    /// Parses and validates a config from TOML text.
    pub fn from_toml_str(content: &str) -> QuantResult<Self> {
        let config: QuantConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Loads config from file.
    pub fn load<P: AsRef<Path>>(path: P) -> QuantResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Saves config to file.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> QuantResult<()> {
        let content =
            toml::to_string_pretty(self).map_err(|e| QuantError::Serialization(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config_is_valid() {
        let config = QuantConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.max_minmax_blocks, 32);
        assert_eq!(config.block_size, 128);
    }

    #[test]
    fn test_odd_block_size_rejected() {
        let config = QuantConfig {
            block_size: 127,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(QuantError::InvalidBlockSize(127))));
    }

    #[test]
    fn test_zero_values_rejected() {
        let config = QuantConfig {
            max_minmax_blocks: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = QuantConfig {
            minmax_granularity: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config = QuantConfig::from_toml_str("max_minmax_blocks = 8\n").unwrap();
        assert_eq!(config.max_minmax_blocks, 8);
        assert_eq!(config.minmax_granularity, DEFAULT_MINMAX_GRANULARITY);
        assert_eq!(config.block_size, DEFAULT_BLOCK_SIZE);
    }

    #[test]
    fn test_save_and_load() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("qlinear.toml");

        let config = QuantConfig {
            max_minmax_blocks: 16,
            minmax_granularity: 64,
            block_size: 256,
        };
        config.save(&path).unwrap();
        let loaded = QuantConfig::load(&path).unwrap();
        assert_eq!(config, loaded);
    }

    #[test]
    fn test_invalid_toml() {
        assert!(matches!(
            QuantConfig::from_toml_str("block_size = \"big\""),
            Err(QuantError::ConfigParse(_))
        ));
    }
}

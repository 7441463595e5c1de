//! Codec configuration
//!
//! Describes the grid every chunk is built at. Loaded from TOML or built in
//! code, and validated before any chunk is created from it.

use crate::constants::defaults;
use crate::constants::morton_limits::MAX_BIT_DEPTH_U32;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub type ConfigResult<T> = Result<T, ConfigError>;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid config: {field} = {value} ({reason})")]
    InvalidConfig {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Config parse error: {0}")]
    Parse(#[from] toml::de::Error),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CodecConfig {
    /// Cells per axis in a full-resolution chunk; a power of two
    pub resolution: u32,
    /// World size of one voxel
    pub voxel_scale: f32,
    /// World size of one chunk
    pub chunk_scale: f32,
    /// Directory persisted chunks are written to
    pub storage_root: PathBuf,
}

impl Default for CodecConfig {
    fn default() -> Self {
        Self {
            resolution: defaults::RESOLUTION,
            voxel_scale: defaults::VOXEL_SCALE,
            chunk_scale: defaults::CHUNK_SCALE,
            storage_root: PathBuf::from(defaults::STORAGE_ROOT),
        }
    }
}

fn invalid(field: &str, value: impl ToString, reason: &str) -> ConfigError {
    ConfigError::InvalidConfig {
        field: field.to_string(),
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

impl CodecConfig {
    pub fn from_toml_str(source: &str) -> ConfigResult<Self> {
        let config: Self = toml::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> ConfigResult<()> {
        if self.resolution < 2 || !self.resolution.is_power_of_two() {
            return Err(invalid(
                "resolution",
                self.resolution,
                "must be a power of two of at least 2",
            ));
        }
        // Type data stores indices as u32
        if self.bit_depth() > MAX_BIT_DEPTH_U32 {
            return Err(invalid(
                "resolution",
                self.resolution,
                "exceeds 10 bits per axis",
            ));
        }
        if !self.voxel_scale.is_finite() || self.voxel_scale <= 0.0 {
            return Err(invalid("voxel_scale", self.voxel_scale, "must be positive"));
        }
        if !self.chunk_scale.is_finite() || self.chunk_scale <= 0.0 {
            return Err(invalid("chunk_scale", self.chunk_scale, "must be positive"));
        }

        log::debug!(
            "[CodecConfig] Validated: resolution={} (depth {}), voxel_scale={}, chunk_scale={}",
            self.resolution,
            self.bit_depth(),
            self.voxel_scale,
            self.chunk_scale
        );
        Ok(())
    }

    /// Bits per axis, log2(resolution)
    pub fn bit_depth(&self) -> u32 {
        self.resolution.trailing_zeros()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        let config = CodecConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.bit_depth(), 7);
    }

    #[test]
    fn test_from_toml() {
        let config = CodecConfig::from_toml_str(
            r#"
            resolution = 512
            voxel_scale = 0.25
            storage_root = "/tmp/svo"
            "#,
        )
        .expect("valid config");

        assert_eq!(config.resolution, 512);
        assert_eq!(config.bit_depth(), 9);
        assert_eq!(config.voxel_scale, 0.25);
        assert_eq!(config.chunk_scale, defaults::CHUNK_SCALE);
        assert_eq!(config.storage_root, PathBuf::from("/tmp/svo"));
    }

    #[test]
    fn test_rejects_non_power_of_two() {
        let config = CodecConfig {
            resolution: 100,
            ..Default::default()
        };
        let err = config.validate().expect_err("100 is not a power of two");
        assert!(err.to_string().contains("resolution"));
    }

    #[test]
    fn test_rejects_resolution_past_type_data_width() {
        let config = CodecConfig {
            resolution: 2048,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidConfig { .. })
        ));

        let config = CodecConfig {
            resolution: 1024,
            ..Default::default()
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_rejects_bad_scale() {
        let result = CodecConfig::from_toml_str("voxel_scale = -1.0");
        assert!(matches!(result, Err(ConfigError::InvalidConfig { .. })));
    }

    #[test]
    fn test_parse_error() {
        let result = CodecConfig::from_toml_str("resolution = \"big\"");
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }
}

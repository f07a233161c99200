use std::path::Path;
use serde::{Deserialize, Serialize};

use crate::{
    degradation::{DegradationToggles, WORKING_RESOLUTION},
    error::{ConfigError, Result},
};

/// Main configuration for a degradation run
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Degradation categories the first pipeline may apply
    pub toggles: DegradationToggles,

    /// Random source settings
    pub sampling: SamplingConfig,

    /// Pipeline selection
    pub pipeline: PipelineConfig,
}

impl Config {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|_| ConfigError::FileNotFound { path: path.display().to_string() })?;

        let config: Config = toml::from_str(&content)
            .map_err(|_| ConfigError::ParseFailed { path: path.display().to_string() })?;
        Ok(config)
    }

    /// Save configuration to a TOML file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| ConfigError::InvalidValue {
                key: "config".to_string(),
                value: e.to_string()
            })?;

        std::fs::write(path, content)?;
        Ok(())
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        self.pipeline.validate()?;
        Ok(())
    }
}

/// How parameters are drawn
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SamplingConfig {
    /// Use the fixed built-in seeds so every run draws the same parameters
    pub repeatable: bool,

    /// Explicit base seed; takes precedence over `repeatable`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PipelineVersion {
    /// Per-frame blur/resize/noise/JPEG, then optional codec pass
    #[default]
    V1,
    /// Codec pass at the working resolution, then blur/noise
    V2,
}

/// Pipeline selection and sizing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub version: PipelineVersion,

    /// Largest frame side callers resize to before degrading
    pub working_resolution: u32,

    /// Honour the sampled second-pass flag of the second pipeline
    pub second_pass: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            version: PipelineVersion::V1,
            working_resolution: WORKING_RESOLUTION,
            second_pass: true,
        }
    }
}

impl PipelineConfig {
    fn validate(&self) -> Result<()> {
        if self.working_resolution == 0 {
            return Err(ConfigError::InvalidValue {
                key: "pipeline.working_resolution".to_string(),
                value: self.working_resolution.to_string()
            }.into());
        }

        if self.version == PipelineVersion::V2 && self.working_resolution != WORKING_RESOLUTION {
            return Err(ConfigError::InvalidValue {
                key: "pipeline.working_resolution".to_string(),
                value: format!("{} (v2 requires {})", self.working_resolution, WORKING_RESOLUTION)
            }.into());
        }

        Ok(())
    }
}

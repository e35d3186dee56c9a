//! Engine configuration with TOML file support.

use std::path::Path;

use halcyon_types::NetworkId;
use halcyon_utils::LogFormat;
use serde::{Deserialize, Serialize};

use crate::ConsensusError;

/// Configuration for a [`ConsensusEngine`](crate::ConsensusEngine).
///
/// The network is read once here and turned into immutable chain parameters
/// when the engine is constructed.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Which network's consensus constants to use.
    #[serde(default)]
    pub network: NetworkId,

    /// Number of most recent datasets of each kind kept alive while unused.
    #[serde(default = "default_retained_epochs")]
    pub retained_epochs: usize,

    /// Upper bound in bytes for a single dataset allocation.
    #[serde(default)]
    pub dataset_memory_limit: Option<u64>,

    /// Log format: "human" or "json".
    #[serde(default)]
    pub log_format: LogFormat,

    /// Log level filter: "trace", "debug", "info", "warn", "error".
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_retained_epochs() -> usize {
    2
}

fn default_log_level() -> String {
    "info".to_string()
}

impl EngineConfig {
    /// Load configuration from a TOML file.
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, ConsensusError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| ConsensusError::Config(format!("{}: {e}", path.display())))?;
        Self::from_toml_str(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn from_toml_str(s: &str) -> Result<Self, ConsensusError> {
        let config: Self = toml::from_str(s).map_err(|e| ConsensusError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize the configuration to a TOML string.
    pub fn to_toml_string(&self) -> Result<String, ConsensusError> {
        toml::to_string_pretty(self).map_err(|e| ConsensusError::Config(e.to_string()))
    }

    pub fn validate(&self) -> Result<(), ConsensusError> {
        if self.dataset_memory_limit == Some(0) {
            return Err(ConsensusError::Config(
                "dataset_memory_limit must be positive when set".into(),
            ));
        }
        Ok(())
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            network: NetworkId::default(),
            retained_epochs: default_retained_epochs(),
            dataset_memory_limit: None,
            log_format: LogFormat::default(),
            log_level: default_log_level(),
        }
    }
}

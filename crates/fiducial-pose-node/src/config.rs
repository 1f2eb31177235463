//! Node configuration.
//!
//! Every option is required; a missing one is a fatal configuration error at
//! startup, before any subscription is made.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Which call paths drive the detection pipeline.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineMode {
    /// Run detection on every synchronized frame.
    EventDriven,
    /// Run detection only when a caller requests it.
    OnRequest,
    /// Both of the above.
    Both,
}

impl PipelineMode {
    #[inline]
    pub fn event_driven(self) -> bool {
        matches!(self, Self::EventDriven | Self::Both)
    }

    #[inline]
    pub fn on_request(self) -> bool {
        matches!(self, Self::OnRequest | Self::Both)
    }
}

/// Errors raised while loading or validating the configuration.
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("invalid configuration: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("model_directory must not be empty")]
    EmptyModelDirectory,
    #[error("model_filename must not be empty")]
    EmptyModelFilename,
}

/// Startup configuration of the detection node.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NodeConfig {
    pub mode: PipelineMode,
    /// Directory the estimator's persisted model is loaded from.
    pub model_directory: PathBuf,
    pub model_filename: String,
    /// Publish the axis-annotated copy of each processed frame.
    pub publish_image: bool,
    /// Broadcast one named transform per detected marker.
    pub publish_transforms: bool,
    /// Publish the visualization marker array.
    pub publish_markers: bool,
}

impl NodeConfig {
    /// Parse and validate a JSON configuration document.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.model_directory.as_os_str().is_empty() {
            return Err(ConfigError::EmptyModelDirectory);
        }
        if self.model_filename.is_empty() {
            return Err(ConfigError::EmptyModelFilename);
        }
        Ok(())
    }

    /// Full path of the estimator's persisted model.
    pub fn model_path(&self) -> PathBuf {
        self.model_directory.join(&self.model_filename)
    }
}

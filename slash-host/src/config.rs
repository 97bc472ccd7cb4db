//! Client configuration.
//!
//! Every field has a default, so a configuration file only needs the keys
//! it changes:
//!
//! ```json
//! {
//!   "publish_commands_on_ready": true,
//!   "guild_id": 123456789012345678,
//!   "formatting": { "colour": 16711680 },
//!   "logging": { "level": "slash=debug,info", "format": "json" }
//! }
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use slash::{Formatting, LogConfig, Messages, Snowflake};
use thiserror::Error;

/// Failure to load a configuration file
#[derive(Debug, Error)]
pub enum ConfigLoadError {
    #[error("Failed to read config file {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Settings for a [`Client`](crate::Client)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Publish the command schema when the gateway reports ready
    pub publish_commands_on_ready: bool,

    /// Bind the built-in interaction dispatcher on init
    pub register_command_handler: bool,

    /// Publish to this guild only; globally when unset
    pub guild_id: Option<Snowflake>,

    /// Templates for framework-generated responses
    pub messages: Messages,

    /// Formatting applied to every outgoing embed
    pub formatting: Formatting,

    pub logging: LogConfig,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            publish_commands_on_ready: false,
            register_command_handler: true,
            guild_id: None,
            messages: Messages::default(),
            formatting: Formatting::default(),
            logging: LogConfig::default(),
        }
    }
}

impl ClientConfig {
    pub fn from_json_str(text: &str) -> Result<Self, ConfigLoadError> {
        Ok(serde_json::from_str(text)?)
    }

    /// Load a JSON configuration file
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigLoadError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigLoadError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        let config = Self::from_json_str(&text)?;
        tracing::debug!(path = %path.display(), "Loaded client config");
        Ok(config)
    }
}

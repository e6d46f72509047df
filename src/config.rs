// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Flowdeck-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Flowdeck and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Per-flow configuration.
//!
//! Read from `flowdeck.toml` in the flow directory. Every key is optional; CLI flags override
//! whatever the file says.

use std::io;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::store::WriteDurability;

pub const CONFIG_FILE: &str = "flowdeck.toml";
pub const DEFAULT_MCP_HTTP_PORT: u16 = 27436;
pub const DEFAULT_MESSAGE: &str = "Hello! How can I help you today?";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("cannot read {path:?}: {source}")]
    Io { path: PathBuf, source: io::Error },
    #[error("invalid config in {path:?}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[error("invalid config: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FlowdeckConfig {
    pub store: StoreConfig,
    pub nodes: NodeConfig,
    pub mcp: McpConfig,
    pub log: LogConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum WriteMode {
    /// Commits are handed to the background writer.
    #[default]
    Queued,
    /// Commits are written before the intent returns.
    Direct,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StoreConfig {
    pub durability: WriteDurability,
    pub write_mode: WriteMode,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct NodeConfig {
    /// Message of the single node in a fresh or reset flow.
    pub default_message: String,
    /// New nodes land at `x` in `[0, spread_x)` and `y` in `[0, spread_y)`.
    pub spread_x: f64,
    pub spread_y: f64,
    /// Fixes placement of new nodes, mostly for reproducible demos.
    pub seed: Option<u64>,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            default_message: DEFAULT_MESSAGE.to_owned(),
            spread_x: 800.0,
            spread_y: 600.0,
            seed: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct McpConfig {
    pub http_port: u16,
}

impl Default for McpConfig {
    fn default() -> Self {
        Self {
            http_port: DEFAULT_MCP_HTTP_PORT,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LogConfig {
    /// `EnvFilter` directives; `FLOWDECK_LOG` wins when set.
    pub filter: Option<String>,
}

impl FlowdeckConfig {
    /// Loads `<dir>/flowdeck.toml`, or the defaults when the file does not exist.
    pub fn load_from_dir(dir: &Path) -> Result<Self, ConfigError> {
        let path = dir.join(CONFIG_FILE);
        let contents = match std::fs::read_to_string(&path) {
            Ok(contents) => contents,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(source) => return Err(ConfigError::Io { path, source }),
        };
        let config = Self::parse(&contents).map_err(|source| ConfigError::Parse {
            path: path.clone(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn parse(contents: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(contents)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.nodes.default_message.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "nodes.default_message must not be empty".to_owned(),
            ));
        }
        for (name, spread) in [
            ("nodes.spread_x", self.nodes.spread_x),
            ("nodes.spread_y", self.nodes.spread_y),
        ] {
            if !spread.is_finite() || spread < 0.0 {
                return Err(ConfigError::Invalid(format!(
                    "{name} must be a finite, non-negative number"
                )));
            }
        }
        Ok(())
    }
}

use crate::{OverlayError, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::warn;

/// Default configuration file name
pub const DEFAULT_CONFIG_FILE: &str = ".dev-overlay.toml";

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct OverlayConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub transport: TransportConfig,
    #[serde(default)]
    pub resolver: ResolverConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Base URL of the dev server hosting the source and event endpoints
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Path serving raw file text for non-absolute URIs
    #[serde(default = "default_source_endpoint")]
    pub source_endpoint: String,
    /// Path of the hot-update Server-Sent-Events stream
    #[serde(default = "default_events_endpoint")]
    pub events_endpoint: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransportConfig {
    /// Fixed delay before a reconnection attempt, in milliseconds
    #[serde(default = "default_reconnect_delay_ms")]
    pub reconnect_delay_ms: u64,
    /// Quiet period after reopening before a reconnect is declared successful
    #[serde(default = "default_reconnect_confirm_ms")]
    pub reconnect_confirm_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolverConfig {
    /// Lines of context above and below a highlighted fragment line
    #[serde(default = "default_context_lines")]
    pub context_lines: usize,
}

fn default_base_url() -> String {
    "http://localhost:8080".to_string()
}

fn default_source_endpoint() -> String {
    "/__get-internal-source".to_string()
}

fn default_events_endpoint() -> String {
    "/__webpack_hmr".to_string()
}

fn default_reconnect_delay_ms() -> u64 {
    2000
}

fn default_reconnect_confirm_ms() -> u64 {
    100
}

fn default_context_lines() -> usize {
    4
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            source_endpoint: default_source_endpoint(),
            events_endpoint: default_events_endpoint(),
        }
    }
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            reconnect_delay_ms: default_reconnect_delay_ms(),
            reconnect_confirm_ms: default_reconnect_confirm_ms(),
        }
    }
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            context_lines: default_context_lines(),
        }
    }
}

impl OverlayConfig {
    /// Load configuration from a file in the project root
    pub fn load() -> Result<Self> {
        Self::load_from(Path::new(DEFAULT_CONFIG_FILE))
    }

    /// Load configuration from an explicit path (for tests)
    pub fn load_from(config_path: &Path) -> Result<Self> {
        if !config_path.exists() {
            return Ok(OverlayConfig::default());
        }

        let content = fs::read_to_string(config_path).map_err(|e| {
            OverlayError::FileError(format!(
                "Failed to read config file {:?}: {}",
                config_path, e
            ))
        })?;

        let config: OverlayConfig = toml::from_str(&content).map_err(|e| {
            OverlayError::FileError(format!(
                "Failed to parse TOML config from {:?}: {}",
                config_path, e
            ))
        })?;

        Ok(config)
    }

    /// Load default config if file is missing, otherwise return error on parse failure
    pub fn load_or_default() -> Self {
        match Self::load() {
            Ok(config) => config,
            Err(e) => {
                warn!("Warning: Failed to load config: {}. Using defaults.", e);
                OverlayConfig::default()
            }
        }
    }

    /// Full URL of the source retrieval endpoint
    pub fn source_url(&self) -> String {
        format!(
            "{}{}",
            self.server.base_url.trim_end_matches('/'),
            self.server.source_endpoint
        )
    }

    /// Full URL of the hot-update event stream
    pub fn events_url(&self) -> String {
        format!(
            "{}{}",
            self.server.base_url.trim_end_matches('/'),
            self.server.events_endpoint
        )
    }
}
